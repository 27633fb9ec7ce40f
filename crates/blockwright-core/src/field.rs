//! Fields: the editable and non-editable atoms inside an input's field row.
//!
//! The renderer only needs two things from a field: its size and whether it
//! is editable (editable fields get different spacing). Everything a field
//! needs for measuring comes from [`FieldMetrics`], which the renderer's
//! constants provide, so a field never looks up global state.
//!
//! # Overview
//!
//! - [`Field`] - the trait every field implements
//! - [`LabelField`] - static text
//! - [`TextInputField`] - editable text drawn inside a rounded border
//! - [`ImageField`] - fixed-size image

use std::fmt;

use svg::node::{Node, Text as SvgText, element as svg_element};

use crate::{
    geometry::Size,
    text::{FontStyle, measure_text},
};

/// Measurement inputs shared by all fields of one renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMetrics {
    font: FontStyle,
    border_rect_x_padding: f64,
    border_rect_y_padding: f64,
    border_rect_height: f64,
    border_rect_radius: f64,
}

impl FieldMetrics {
    pub fn new(font: FontStyle) -> Self {
        Self {
            font,
            ..Self::default()
        }
    }

    /// Sets the border padding and height used by bordered fields.
    pub fn with_border_rect(mut self, x_padding: f64, y_padding: f64, height: f64, radius: f64) -> Self {
        self.border_rect_x_padding = x_padding;
        self.border_rect_y_padding = y_padding;
        self.border_rect_height = height;
        self.border_rect_radius = radius;
        self
    }

    pub fn font(&self) -> &FontStyle {
        &self.font
    }

    pub fn border_rect_x_padding(&self) -> f64 {
        self.border_rect_x_padding
    }

    pub fn border_rect_y_padding(&self) -> f64 {
        self.border_rect_y_padding
    }

    pub fn border_rect_height(&self) -> f64 {
        self.border_rect_height
    }

    pub fn border_rect_radius(&self) -> f64 {
        self.border_rect_radius
    }

    /// Height of a line of field text.
    pub fn text_height(&self) -> f64 {
        self.font.line_height()
    }
}

impl Default for FieldMetrics {
    fn default() -> Self {
        Self {
            font: FontStyle::default(),
            border_rect_x_padding: 5.0,
            border_rect_y_padding: 3.0,
            border_rect_height: 16.0,
            border_rect_radius: 4.0,
        }
    }
}

/// A field in an input's field row.
///
/// Implementors only have to report their size; every other method has a
/// default suited to a static, non-mirrored field.
pub trait Field: fmt::Debug {
    /// Size of the field as laid out with `metrics`.
    fn size(&self, metrics: &FieldMetrics) -> Size;

    /// Whether the user can edit the field. Editable fields get tighter
    /// spacing next to inputs and row edges.
    fn is_editable(&self) -> bool {
        false
    }

    /// Whether the field content is mirrored in RTL mode.
    fn flip_rtl(&self) -> bool {
        false
    }

    /// Plain-text value, used in collapsed block summaries.
    fn text(&self) -> String {
        String::new()
    }

    /// Renders the field content with its top-left corner at the origin.
    fn to_svg(&self, metrics: &FieldMetrics) -> Box<dyn Node> {
        let size = self.size(metrics);
        Box::new(
            svg_element::Rectangle::new()
                .set("width", size.width())
                .set("height", size.height())
                .set("fill", "none"),
        )
    }
}

fn text_node(content: &str, x: f64, height: f64, font: &FontStyle) -> svg_element::Text {
    svg_element::Text::new("")
        .set("class", "blocklyText")
        .set("x", x)
        .set("y", height / 2.0)
        .set("dominant-baseline", "central")
        .set("font-family", font.family())
        .set("font-weight", font.weight())
        .set("font-size", format!("{}pt", font.size()))
        .add(SvgText::new(content))
}

/// Static, non-editable text.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelField {
    text: String,
}

impl LabelField {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Field for LabelField {
    fn size(&self, metrics: &FieldMetrics) -> Size {
        let measured = measure_text(&self.text, metrics.font());
        Size::new(measured.width(), metrics.text_height())
    }

    fn text(&self) -> String {
        self.text.clone()
    }

    fn to_svg(&self, metrics: &FieldMetrics) -> Box<dyn Node> {
        let size = self.size(metrics);
        Box::new(
            svg_element::Group::new()
                .set("class", "blocklyNonEditableText")
                .add(text_node(&self.text, 0.0, size.height(), metrics.font())),
        )
    }
}

/// Editable text drawn inside a rounded border rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct TextInputField {
    value: String,
}

impl TextInputField {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl Field for TextInputField {
    fn size(&self, metrics: &FieldMetrics) -> Size {
        let text_width = measure_text(&self.value, metrics.font()).width();
        let width = text_width + metrics.border_rect_x_padding() * 2.0;
        let height = metrics.text_height().max(metrics.border_rect_height());
        Size::new(width, height)
    }

    fn is_editable(&self) -> bool {
        true
    }

    fn text(&self) -> String {
        self.value.clone()
    }

    fn to_svg(&self, metrics: &FieldMetrics) -> Box<dyn Node> {
        let size = self.size(metrics);
        let border = svg_element::Rectangle::new()
            .set("class", "blocklyFieldRect")
            .set("rx", metrics.border_rect_radius())
            .set("ry", metrics.border_rect_radius())
            .set("x", 0)
            .set("y", 0)
            .set("width", size.width())
            .set("height", size.height());
        Box::new(
            svg_element::Group::new()
                .set("class", "blocklyEditableText")
                .add(border)
                .add(text_node(
                    &self.value,
                    metrics.border_rect_x_padding(),
                    size.height(),
                    metrics.font(),
                )),
        )
    }
}

/// Fixed-size image. Reserves one extra pixel of height below the image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageField {
    src: String,
    width: f64,
    height: f64,
    alt: String,
    flip_rtl: bool,
}

impl ImageField {
    /// Vertical padding added below the image.
    pub const Y_PADDING: f64 = 1.0;

    pub fn new(src: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            src: src.into(),
            width,
            height,
            alt: String::new(),
            flip_rtl: false,
        }
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = alt.into();
        self
    }

    pub fn with_flip_rtl(mut self, flip_rtl: bool) -> Self {
        self.flip_rtl = flip_rtl;
        self
    }
}

impl Field for ImageField {
    fn size(&self, _metrics: &FieldMetrics) -> Size {
        Size::new(self.width, self.height + Self::Y_PADDING)
    }

    fn flip_rtl(&self) -> bool {
        self.flip_rtl
    }

    fn text(&self) -> String {
        self.alt.clone()
    }

    fn to_svg(&self, _metrics: &FieldMetrics) -> Box<dyn Node> {
        Box::new(
            svg_element::Image::new()
                .set("href", self.src.as_str())
                .set("width", self.width)
                .set("height", self.height),
        )
    }
}
