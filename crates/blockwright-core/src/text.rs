//! Text measurement for field labels.
//!
//! Field sizes feed straight into block layout, so labels are measured with
//! real font metrics through cosmic-text. A single [`FontSystem`] is shared
//! by every measurement, created on first use.
//!
//! ```
//! # use blockwright_core::text::{FontStyle, measure_text};
//! let font = FontStyle::default();
//! let size = measure_text("repeat", &font);
//! assert!(size.width() > 0.0);
//! assert!(size.height() > 0.0);
//! ```

use std::sync::{Mutex, OnceLock, PoisonError};

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Weight};
use log::info;
use serde::Deserialize;

use crate::geometry::Size;

/// Font used for field text.
///
/// Sizes are in points, matching the `font-size: 11pt` the legacy blocks
/// use.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FontStyle {
    #[serde(default = "FontStyle::default_family")]
    family: String,
    #[serde(default = "FontStyle::default_weight")]
    weight: String,
    #[serde(default = "FontStyle::default_size")]
    size: f64,
}

impl FontStyle {
    pub fn new(family: impl Into<String>, weight: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            weight: weight.into(),
            size,
        }
    }

    fn default_family() -> String {
        String::from("sans-serif")
    }

    fn default_weight() -> String {
        String::from("normal")
    }

    fn default_size() -> f64 {
        11.0
    }

    /// Font family name
    pub fn family(&self) -> &str {
        &self.family
    }

    /// CSS font weight (`normal`, `bold` or a number)
    pub fn weight(&self) -> &str {
        &self.weight
    }

    /// Font size in points
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Font size converted to pixels.
    pub fn size_px(&self) -> f64 {
        self.size * PT_TO_PX
    }

    /// Height of one line of text in pixels.
    pub fn line_height(&self) -> f64 {
        self.size_px() * LINE_HEIGHT_FACTOR
    }

    fn cosmic_weight(&self) -> Weight {
        match self.weight.as_str() {
            "bold" => Weight::BOLD,
            "normal" => Weight::NORMAL,
            other => other.parse::<u16>().map(Weight).unwrap_or(Weight::NORMAL),
        }
    }
}

impl Default for FontStyle {
    fn default() -> Self {
        Self {
            family: Self::default_family(),
            weight: Self::default_weight(),
            size: Self::default_size(),
        }
    }
}

const PT_TO_PX: f64 = 1.33;
const LINE_HEIGHT_FACTOR: f64 = 1.15;
const FALLBACK_ADVANCE: f64 = 0.55;

/// Measures `text` laid out on a single line in `font`.
///
/// Empty text measures as zero. If shaping produces no glyphs (for example
/// when no system font is available) the width falls back to an average
/// advance per character.
pub fn measure_text(text: &str, font: &FontStyle) -> Size {
    TEXT_MEASURER
        .get_or_init(TextMeasurer::new)
        .measure(text, font)
}

/// Shared font system guarded for single-threaded use from any thread.
struct TextMeasurer {
    font_system: Mutex<FontSystem>,
}

impl TextMeasurer {
    fn new() -> Self {
        info!("Initializing FontSystem");
        Self {
            font_system: Mutex::new(FontSystem::new()),
        }
    }

    fn measure(&self, text: &str, font: &FontStyle) -> Size {
        if text.is_empty() {
            return Size::default();
        }

        let mut font_system = self
            .font_system
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let font_size_px = font.size_px() as f32;
        let line_height = font.line_height() as f32;
        let metrics = Metrics::new(font_size_px, line_height);

        let mut buffer = Buffer::new(&mut font_system, metrics);
        let mut buffer = buffer.borrow_with(&mut font_system);
        let attrs = Attrs::new()
            .family(Family::Name(font.family()))
            .weight(font.cosmic_weight());

        buffer.set_size(None, None);
        buffer.set_text(text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(true);

        let mut max_width: f32 = 0.0;
        let mut total_height: f32 = 0.0;
        for run in buffer.layout_runs() {
            if let Some(last) = run.glyphs.last() {
                max_width = max_width.max(last.x + last.w);
            }
            total_height += metrics.line_height;
        }

        if max_width == 0.0 {
            max_width = text.chars().count() as f32 * font_size_px * FALLBACK_ADVANCE as f32;
        }
        if total_height == 0.0 {
            total_height = metrics.line_height;
        }

        Size::new(f64::from(max_width), f64::from(total_height))
    }
}

static TEXT_MEASURER: OnceLock<TextMeasurer> = OnceLock::new();

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_font_style_default() {
        let font = FontStyle::default();
        assert_eq!(font.family(), "sans-serif");
        assert_eq!(font.weight(), "normal");
        assert_approx_eq!(f64, font.size(), 11.0);
    }

    #[test]
    fn test_font_style_line_height() {
        let font = FontStyle::new("serif", "bold", 10.0);
        assert_approx_eq!(f64, font.size_px(), 13.3);
        assert_approx_eq!(f64, font.line_height(), 13.3 * 1.15);
    }

    #[test]
    fn test_measure_empty_text() {
        let size = measure_text("", &FontStyle::default());
        assert!(size.is_zero());
    }

    #[test]
    fn test_measure_single_line() {
        let size = measure_text("do", &FontStyle::default());
        assert!(size.width() > 0.0, "Width should be positive");
        assert!(size.height() > 0.0, "Height should be positive");
    }

    #[test]
    fn test_longer_text_is_not_narrower() {
        let font = FontStyle::default();
        let short = measure_text("if", &font);
        let long = measure_text("if if if if", &font);
        assert!(long.width() >= short.width());
    }

    #[test]
    fn test_weight_parsing() {
        assert_eq!(FontStyle::new("a", "bold", 1.0).cosmic_weight(), Weight::BOLD);
        assert_eq!(FontStyle::new("a", "600", 1.0).cosmic_weight(), Weight(600));
        assert_eq!(FontStyle::new("a", "odd", 1.0).cosmic_weight(), Weight::NORMAL);
    }
}
