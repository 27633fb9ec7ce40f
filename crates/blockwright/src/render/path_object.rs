//! The SVG path state of one rendered block.
//!
//! A Geras block is three stacked paths inside one group: a dark path
//! offset down and right that shows through as a shadow edge, the main
//! outline, and the light highlight stroke on top. [`PathObject`] keeps the
//! attributes of all three and the classes of the group, and turns colour
//! and state changes (shadow, disabled, highlighted, selected) into
//! attribute changes.

use indexmap::{IndexMap, IndexSet};
use svg::node::element as svg_element;

use blockwright_core::color::Color;

use super::constants::ConstantProvider;
use crate::theme::BlockStyle;

pub const CLASS_PATH: &str = "blocklyPath";
pub const CLASS_PATH_DARK: &str = "blocklyPathDark";
pub const CLASS_PATH_LIGHT: &str = "blocklyPathLight";
pub const CLASS_SELECTED: &str = "blocklySelected";
pub const CLASS_DISABLED: &str = "blocklyDisabled";
pub const CLASS_INSERTION_MARKER: &str = "blocklyInsertionMarker";

const FLIP: &str = "scale(-1 1)";

/// Attributes of one `<path>` element, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathAttributes {
    attributes: IndexMap<&'static str, String>,
}

impl PathAttributes {
    fn with_class(class: &str) -> Self {
        let mut attributes = Self::default();
        attributes.set("class", class);
        attributes
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &'static str, value: impl Into<String>) {
        self.attributes.insert(name, value.into());
    }

    /// Path data, empty until a path is set.
    pub fn d(&self) -> &str {
        self.get("d").unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
    }

    fn to_svg(&self) -> svg_element::Path {
        self.iter()
            .fold(svg_element::Path::new(), |path, (name, value)| {
                path.set(name, value)
            })
    }
}

/// The three paths and the group classes of one Geras block.
#[derive(Debug, Clone, PartialEq)]
pub struct PathObject {
    main: PathAttributes,
    dark: PathAttributes,
    light: PathAttributes,
    classes: IndexSet<String>,
    style: Option<BlockStyle>,
    colour_dark: Option<Color>,
    dark_offset: f64,
    emboss_filter_id: String,
    disabled_pattern_id: String,
}

impl PathObject {
    pub fn new(constants: &ConstantProvider) -> Self {
        let dark_offset = constants.dark_path_offset;
        let mut dark = PathAttributes::with_class(CLASS_PATH_DARK);
        dark.set("transform", format!("translate({dark_offset},{dark_offset})"));
        Self {
            main: PathAttributes::with_class(CLASS_PATH),
            dark,
            light: PathAttributes::with_class(CLASS_PATH_LIGHT),
            classes: IndexSet::new(),
            style: None,
            colour_dark: None,
            dark_offset,
            emboss_filter_id: constants.emboss_filter_id(),
            disabled_pattern_id: constants.disabled_pattern_id(),
        }
    }

    pub fn main(&self) -> &PathAttributes {
        &self.main
    }

    pub fn dark(&self) -> &PathAttributes {
        &self.dark
    }

    pub fn light(&self) -> &PathAttributes {
        &self.light
    }

    pub fn style(&self) -> Option<&BlockStyle> {
        self.style.as_ref()
    }

    /// The dark path fill: the primary colour blended 20% toward black.
    pub fn colour_dark(&self) -> Option<Color> {
        self.colour_dark
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    /// Sets the outline. The dark path shares it.
    pub fn set_path(&mut self, path: &str) {
        self.main.set("d", path);
        self.dark.set("d", path);
    }

    pub fn set_highlight_path(&mut self, path: &str) {
        self.light.set("d", path);
    }

    /// Mirrors all three paths around the block origin.
    pub fn flip_rtl(&mut self) {
        let offset = self.dark_offset;
        self.main.set("transform", FLIP);
        self.light.set("transform", FLIP);
        self.dark
            .set("transform", format!("translate({offset},{offset}) {FLIP}"));
    }

    pub fn set_style(&mut self, style: BlockStyle) {
        let black = Color::from_rgb8(0, 0, 0);
        self.colour_dark = Some(black.blend(style.colour_primary(), 0.2));
        self.style = Some(style);
    }

    /// Paints all three paths from the current style, then reapplies the
    /// shadow and disabled state. Does nothing before a style is set.
    pub fn apply_colour(&mut self, shadow: bool, disabled: bool) {
        let (Some(style), Some(colour_dark)) = (&self.style, self.colour_dark) else {
            return;
        };
        let primary = style.colour_primary().to_hex();
        let tertiary = style.colour_tertiary().to_hex();

        self.light.set("stroke", tertiary.as_str());
        self.dark.set("fill", colour_dark.to_hex());
        self.main.set("stroke", tertiary);
        self.main.set("fill", primary);

        self.update_shadow(shadow);
        self.update_disabled(disabled);
        // Geras blocks are outlined by the light and dark paths only.
        self.main.set("stroke", "none");
    }

    pub fn update_shadow(&mut self, shadow: bool) {
        if !shadow {
            return;
        }
        let Some(style) = &self.style else {
            return;
        };
        let secondary = style.colour_secondary().to_hex();
        self.light.set("display", "none");
        self.dark.set("fill", secondary.as_str());
        self.main.set("stroke", "none");
        self.main.set("fill", secondary);
    }

    pub fn update_disabled(&mut self, disabled: bool) {
        self.set_class(CLASS_DISABLED, disabled);
        if disabled {
            self.main
                .set("fill", format!("url(#{})", self.disabled_pattern_id));
        }
    }

    pub fn update_highlighted(&mut self, highlighted: bool) {
        if highlighted {
            self.main
                .set("filter", format!("url(#{})", self.emboss_filter_id));
            self.light.set("display", "none");
        } else {
            self.main.set("filter", "none");
            self.light.set("display", "inline");
        }
    }

    pub fn update_selected(&mut self, selected: bool) {
        self.set_class(CLASS_SELECTED, selected);
    }

    pub fn update_insertion_marker(&mut self, insertion_marker: bool) {
        self.set_class(CLASS_INSERTION_MARKER, insertion_marker);
    }

    fn set_class(&mut self, class: &str, enabled: bool) {
        if enabled {
            self.classes.insert(class.to_string());
        } else {
            self.classes.shift_remove(class);
        }
    }

    /// The block group: dark path, main path, light path, in paint order.
    pub fn to_svg(&self) -> svg_element::Group {
        let mut group = svg_element::Group::new();
        if !self.classes.is_empty() {
            let classes: Vec<&str> = self.classes().collect();
            group = group.set("class", classes.join(" "));
        }
        group
            .add(self.dark.to_svg())
            .add(self.main.to_svg())
            .add(self.light.to_svg())
    }
}
