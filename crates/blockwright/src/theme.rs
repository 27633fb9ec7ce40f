//! Themes: named block styles plus font and component settings.
//!
//! A [`Theme`] holds colours exactly as written (CSS strings or hues). The
//! renderer's constants validate them into [`BlockStyle`]s when the theme is
//! applied, so an invalid colour is reported once, at init.
//!
//! # Example
//!
//! ```
//! # use blockwright::theme::Theme;
//! let theme = Theme::classic();
//! assert_eq!(theme.name(), "classic");
//! assert!(theme.block_styles().contains_key("logic_blocks"));
//! ```

use indexmap::IndexMap;
use serde::Deserialize;

use blockwright_core::color::Color;

/// A block style as declared by a theme.
///
/// Only the primary colour is required; the secondary and tertiary colours
/// are derived from it when missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct BlockStyleDef {
    colour_primary: Option<String>,
    colour_secondary: Option<String>,
    colour_tertiary: Option<String>,
    hat: Option<String>,
}

impl BlockStyleDef {
    pub fn new(colour_primary: impl Into<String>) -> Self {
        Self {
            colour_primary: Some(colour_primary.into()),
            ..Self::default()
        }
    }

    pub fn with_secondary(mut self, colour: impl Into<String>) -> Self {
        self.colour_secondary = Some(colour.into());
        self
    }

    pub fn with_tertiary(mut self, colour: impl Into<String>) -> Self {
        self.colour_tertiary = Some(colour.into());
        self
    }

    pub fn with_hat(mut self, hat: impl Into<String>) -> Self {
        self.hat = Some(hat.into());
        self
    }

    pub fn colour_primary(&self) -> Option<&str> {
        self.colour_primary.as_deref()
    }

    pub fn colour_secondary(&self) -> Option<&str> {
        self.colour_secondary.as_deref()
    }

    pub fn colour_tertiary(&self) -> Option<&str> {
        self.colour_tertiary.as_deref()
    }

    pub fn hat(&self) -> Option<&str> {
        self.hat.as_deref()
    }
}

/// A validated block style with every colour resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStyle {
    colour_primary: Color,
    colour_secondary: Color,
    colour_tertiary: Color,
    hat: String,
}

impl BlockStyle {
    pub fn new(primary: Color, secondary: Color, tertiary: Color, hat: impl Into<String>) -> Self {
        Self {
            colour_primary: primary,
            colour_secondary: secondary,
            colour_tertiary: tertiary,
            hat: hat.into(),
        }
    }

    /// Fill colour of the block body.
    pub fn colour_primary(&self) -> Color {
        self.colour_primary
    }

    /// Fill colour used for shadow blocks.
    pub fn colour_secondary(&self) -> Color {
        self.colour_secondary
    }

    /// Stroke and highlight colour.
    pub fn colour_tertiary(&self) -> Color {
        self.colour_tertiary
    }

    /// Hat name (`"cap"`) or an empty string.
    pub fn hat(&self) -> &str {
        &self.hat
    }
}

/// Font settings a theme may override. Unset values keep the renderer
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThemeFontStyle {
    family: Option<String>,
    weight: Option<String>,
    size: Option<f64>,
}

impl ThemeFontStyle {
    pub fn new(family: Option<String>, weight: Option<String>, size: Option<f64>) -> Self {
        Self {
            family,
            weight,
            size,
        }
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn weight(&self) -> Option<&str> {
        self.weight.as_deref()
    }

    pub fn size(&self) -> Option<f64> {
        self.size
    }
}

/// Colours for workspace components other than blocks.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ComponentStyles {
    insertion_marker_colour: Option<String>,
    insertion_marker_opacity: Option<f64>,
}

impl ComponentStyles {
    pub fn new(colour: Option<String>, opacity: Option<f64>) -> Self {
        Self {
            insertion_marker_colour: colour,
            insertion_marker_opacity: opacity,
        }
    }

    pub fn insertion_marker_colour(&self) -> Option<&str> {
        self.insertion_marker_colour.as_deref()
    }

    pub fn insertion_marker_opacity(&self) -> Option<f64> {
        self.insertion_marker_opacity
    }
}

/// A named set of block styles plus font and component settings.
///
/// Deserializing fills every missing field from [`Theme::classic`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Theme {
    name: String,
    block_styles: IndexMap<String, BlockStyleDef>,
    font_style: ThemeFontStyle,
    start_hats: Option<bool>,
    component_styles: ComponentStyles,
}

impl Theme {
    /// Creates an empty theme.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            block_styles: IndexMap::new(),
            font_style: ThemeFontStyle::default(),
            start_hats: None,
            component_styles: ComponentStyles::default(),
        }
    }

    /// The legacy palette, one hue per block category.
    pub fn classic() -> Self {
        let hues = [
            ("colour_blocks", "20"),
            ("list_blocks", "260"),
            ("logic_blocks", "210"),
            ("loop_blocks", "120"),
            ("math_blocks", "230"),
            ("procedure_blocks", "290"),
            ("text_blocks", "160"),
            ("variable_blocks", "330"),
            ("variable_dynamic_blocks", "310"),
        ];
        let mut theme = Self::new("classic");
        for (name, hue) in hues {
            theme = theme.with_block_style(name, BlockStyleDef::new(hue));
        }
        theme.with_block_style("hat_blocks", BlockStyleDef::new("330").with_hat("cap"))
    }

    pub fn with_block_style(mut self, name: impl Into<String>, style: BlockStyleDef) -> Self {
        self.block_styles.insert(name.into(), style);
        self
    }

    pub fn with_font_style(mut self, font_style: ThemeFontStyle) -> Self {
        self.font_style = font_style;
        self
    }

    pub fn with_start_hats(mut self, start_hats: bool) -> Self {
        self.start_hats = Some(start_hats);
        self
    }

    pub fn with_component_styles(mut self, component_styles: ComponentStyles) -> Self {
        self.component_styles = component_styles;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn block_styles(&self) -> &IndexMap<String, BlockStyleDef> {
        &self.block_styles
    }

    pub fn font_style(&self) -> &ThemeFontStyle {
        &self.font_style
    }

    /// Whether top blocks without a previous or output connection get a
    /// hat. `None` keeps the renderer default.
    pub fn start_hats(&self) -> Option<bool> {
        self.start_hats
    }

    pub fn component_styles(&self) -> &ComponentStyles {
        &self.component_styles
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_palette() {
        let theme = Theme::classic();
        assert_eq!(theme.block_styles().len(), 10);
        assert_eq!(
            theme.block_styles()["math_blocks"].colour_primary(),
            Some("230")
        );
        assert_eq!(theme.block_styles()["hat_blocks"].hat(), Some("cap"));
        assert_eq!(theme.start_hats(), None);
    }

    #[test]
    fn test_deserialize_partial_theme_keeps_classic_defaults() {
        let theme: Theme = toml::from_str(
            r##"
            start_hats = true

            [font_style]
            size = 12.0
            "##,
        )
        .expect("valid theme");

        assert_eq!(theme.name(), "classic");
        assert_eq!(theme.start_hats(), Some(true));
        assert_eq!(theme.font_style().size(), Some(12.0));
        assert_eq!(theme.font_style().family(), None);
        assert!(theme.block_styles().contains_key("loop_blocks"));
    }

    #[test]
    fn test_deserialize_block_styles() {
        let theme: Theme = toml::from_str(
            r##"
            name = "custom"

            [block_styles.io]
            colour_primary = "#336699"
            colour_tertiary = "#112233"
            "##,
        )
        .expect("valid theme");

        assert_eq!(theme.name(), "custom");
        assert_eq!(theme.block_styles().len(), 1);
        let style = &theme.block_styles()["io"];
        assert_eq!(style.colour_primary(), Some("#336699"));
        assert_eq!(style.colour_secondary(), None);
        assert_eq!(style.colour_tertiary(), Some("#112233"));
    }
}
