//! Configuration types for Blockwright rendering.
//!
//! All types implement [`serde::Deserialize`] so the CLI can load them from a
//! TOML file.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration: renderer overrides, theme and style.
//! - [`ConstantOverrides`] - Replacement values for base renderer constants.
//! - [`StyleConfig`] - Output styling such as the background color.
//!
//! # Example
//!
//! ```
//! # use blockwright::config::AppConfig;
//! let config: AppConfig = toml::from_str(
//!     r#"
//!     [renderer]
//!     corner_radius = 4.0
//!
//!     [style]
//!     background_color = "white"
//!     "#,
//! )
//! .unwrap();
//! assert!(!config.renderer().is_empty());
//! assert!(config.style().background_color().unwrap().is_some());
//! ```

use serde::Deserialize;

use blockwright_core::color::Color;

pub use crate::render::ConstantOverrides;
use crate::theme::Theme;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Renderer constant overrides.
    #[serde(default)]
    renderer: ConstantOverrides,

    /// Theme section; missing entries fall back to the classic theme.
    #[serde(default)]
    theme: Theme,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(renderer: ConstantOverrides, theme: Theme, style: StyleConfig) -> Self {
        Self {
            renderer,
            theme,
            style,
        }
    }

    /// Returns the renderer constant overrides.
    pub fn renderer(&self) -> &ConstantOverrides {
        &self.renderer
    }

    /// Returns the theme.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }
}

/// Visual styling configuration for exported documents.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StyleConfig {
    /// Background [`Color`] behind the blocks, as a color string.
    #[serde(default)]
    background_color: Option<String>,
}

impl StyleConfig {
    /// Creates a style configuration with an optional background color.
    pub fn new(background_color: Option<String>) -> Self {
        Self { background_color }
    }

    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed
    /// into a valid [`Color`].
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_ref()
            .map(|color| Color::new(color))
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.renderer().is_empty());
        assert_eq!(config.theme().name(), "classic");
        assert_eq!(config.style().background_color(), Ok(None));
    }

    #[test]
    fn test_theme_section() {
        let config: AppConfig = toml::from_str(
            r##"
            [theme]
            name = "custom"
            start_hats = true

            [theme.block_styles.loop_blocks]
            colour_primary = "#00aa00"
            "##,
        )
        .expect("valid config");
        assert_eq!(config.theme().name(), "custom");
        assert_eq!(config.theme().start_hats(), Some(true));
        assert!(config.theme().block_styles().contains_key("loop_blocks"));
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        let result = toml::from_str::<AppConfig>("[layout]\ncomponent = \"basic\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_background_color() {
        let style = StyleConfig::new(Some("not-a-colour".to_string()));
        let err = style.background_color().expect_err("invalid color");
        assert!(err.starts_with("Invalid background color in config"));
    }
}
