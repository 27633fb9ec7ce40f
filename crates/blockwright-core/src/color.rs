//! Colour handling for block styles.
//!
//! [`Color`] wraps the `DynamicColor` type from the color crate. On top of
//! CSS parsing it adds the two operations block styling relies on:
//! channel blending ([`Color::blend`]) and hue-based block colours
//! ([`parse_block_colour`]).

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use color::{AlphaColor, DynamicColor, Srgb};

/// Saturation used when a block colour is given as a hue.
pub const HSV_SATURATION: f64 = 0.45;

/// Value (brightness) used when a block colour is given as a hue.
pub const HSV_VALUE: f64 = 0.65;

/// Wrapper around the `DynamicColor` type from the color crate
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_hex().hash(state);
    }
}

impl Color {
    /// Create a new `Color` from a CSS colour string such as `"#ff0000"`,
    /// `"rgb(255, 0, 0)"` or `"red"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockwright_core::color::Color;
    ///
    /// let red = Color::new("#ff0000").unwrap();
    /// assert_eq!(red.to_hex(), "#ff0000");
    /// assert!(Color::new("not-a-colour").is_err());
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str.trim()) {
            Ok(color) => Ok(Self { color }),
            Err(err) => Err(format!("invalid color `{color_str}`: {err}")),
        }
    }

    /// Creates an opaque colour from 8-bit sRGB channels.
    pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Self {
        let color = AlphaColor::<Srgb>::from_rgba8(red, green, blue, 255);
        Self {
            color: DynamicColor::from_alpha_color(color),
        }
    }

    /// Returns the 8-bit sRGB channels of this colour.
    pub fn to_rgb8(self) -> [u8; 3] {
        let srgb = self.color.to_alpha_color::<Srgb>();
        let channel = |value: f32| (f64::from(value) * 255.0).round().clamp(0.0, 255.0) as u8;
        [
            channel(srgb.components[0]),
            channel(srgb.components[1]),
            channel(srgb.components[2]),
        ]
    }

    /// Formats the colour as a lowercase `#rrggbb` string.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Mixes two colours channel by channel.
    ///
    /// A `factor` of 1 yields `self`, a factor of 0 yields `other`.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockwright_core::color::Color;
    ///
    /// let white = Color::new("#ffffff").unwrap();
    /// let black = Color::new("#000000").unwrap();
    /// assert_eq!(white.blend(black, 0.5).to_hex(), "#808080");
    /// ```
    pub fn blend(self, other: Color, factor: f64) -> Self {
        let a = self.to_rgb8();
        let b = other.to_rgb8();
        let mix = |i: usize| {
            let value = f64::from(b[i]) + factor * (f64::from(a[i]) - f64::from(b[i]));
            value.round().clamp(0.0, 255.0) as u8
        };
        Self::from_rgb8(mix(0), mix(1), mix(2))
    }

    /// Creates a new color with the specified alpha (transparency) value.
    pub fn with_alpha(self, alpha: f32) -> Self {
        Color {
            color: self.color.with_alpha(alpha),
        }
    }

    /// Returns the alpha (transparency) component of this color.
    pub fn alpha(&self) -> f32 {
        self.color.components[3]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::from_rgb8(0, 0, 0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<&Color> for svg::node::Value {
    fn from(color: &Color) -> Self {
        Self::from(color.to_hex())
    }
}

/// Converts an HSV triple to an opaque colour.
///
/// `hue` is in degrees, `saturation` in `0..=1` and `value` in `0..=255`.
pub fn hsv_to_color(hue: f64, saturation: f64, value: f64) -> Color {
    let (red, green, blue) = if saturation == 0.0 {
        (value, value, value)
    } else {
        let sextant = (hue / 60.0).floor();
        let remainder = hue / 60.0 - sextant;
        let val1 = value * (1.0 - saturation);
        let val2 = value * (1.0 - saturation * remainder);
        let val3 = value * (1.0 - saturation * (1.0 - remainder));
        match sextant as i64 {
            1 => (val2, value, val1),
            2 => (val1, value, val3),
            3 => (val1, val2, value),
            4 => (val3, val1, value),
            5 => (value, val1, val2),
            _ => (value, val3, val1),
        }
    };
    let channel = |v: f64| v.floor().clamp(0.0, 255.0) as u8;
    Color::from_rgb8(channel(red), channel(green), channel(blue))
}

/// Parses a block colour.
///
/// Accepts either a hue in degrees (`"230"`), rendered with the fixed block
/// saturation and value, or any CSS colour string.
///
/// # Errors
///
/// Returns an error message if the string is neither a hue in `0..=360`
/// nor a valid CSS colour.
///
/// # Examples
///
/// ```
/// use blockwright_core::color::parse_block_colour;
///
/// assert_eq!(parse_block_colour("#5b80a5").unwrap().to_hex(), "#5b80a5");
/// assert!(parse_block_colour("120").is_ok());
/// assert!(parse_block_colour("400").is_err());
/// ```
pub fn parse_block_colour(value: &str) -> Result<Color, String> {
    let trimmed = value.trim();
    if let Ok(hue) = trimmed.parse::<f64>() {
        if (0.0..=360.0).contains(&hue) {
            return Ok(hsv_to_color(hue, HSV_SATURATION, HSV_VALUE * 255.0));
        }
        return Err(format!("invalid colour `{value}`: hue must be within 0..=360"));
    }
    Color::new(trimmed)
}
