//! Color handling for Layerscape diagrams
//!
//! This module provides the [`Color`] type which wraps the `DynamicColor` type
//! from the color crate, the normalized 8-bit [`Rgba`] value carried by scene
//! primitives, the [`ColorSpec`] accepted in configuration files and the
//! round-robin [`ColorWheel`] used when no explicit color is configured for a
//! layer kind.

use std::{collections::HashMap, fmt, str::FromStr};

use color::{DynamicColor, Srgb};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while turning user supplied values into colors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid color `{value}`: {reason}")]
    Invalid { value: String, reason: String },

    #[error("color tuples need 3 or 4 channels, got {0}")]
    TupleLength(usize),

    #[error("color palette must contain at least one color")]
    EmptyPalette,
}

/// Wrapper around the `DynamicColor` type from the color crate
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Color {
    /// Create a new `Color` from a CSS color string such as `"#ff0000"`,
    /// `"#ff000080"`, `"rgb(255, 0, 0)"` or `"red"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use layerscape_core::color::Color;
    ///
    /// let red = Color::new("#ff0000").unwrap();
    /// let blue = Color::new("blue").unwrap();
    /// assert!(Color::new("not-a-color").is_err());
    /// ```
    pub fn new(color_str: &str) -> Result<Self, ColorError> {
        DynamicColor::from_str(color_str)
            .map(|color| Self { color })
            .map_err(|err| ColorError::Invalid {
                value: color_str.to_string(),
                reason: err.to_string(),
            })
    }

    /// Converts this color to 8-bit sRGB channels.
    pub fn to_rgba(self) -> Rgba {
        let rgba8 = self.color.to_alpha_color::<Srgb>().to_rgba8();
        Rgba::new(rgba8.r, rgba8.g, rgba8.b, rgba8.a)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.color)
    }
}

/// An 8-bit RGBA color value.
///
/// Every color that reaches a scene primitive is normalized to this form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);
    pub const GRAY: Rgba = Rgba::new(128, 128, 128, 255);
    pub const ORANGE: Rgba = Rgba::new(255, 165, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color from three channels.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Decodes a packed `0xRRGGBB` integer as an opaque color.
    ///
    /// Bits above the low 24 are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use layerscape_core::color::Rgba;
    ///
    /// assert_eq!(Rgba::from_packed(0xff0000), Rgba::opaque(255, 0, 0));
    /// assert_eq!(Rgba::from_packed(0x010203), Rgba::opaque(1, 2, 3));
    /// ```
    pub const fn from_packed(value: u32) -> Self {
        let [_, r, g, b] = value.to_be_bytes();
        Self::opaque(r, g, b)
    }

    /// Builds a color from a 3 or 4 element channel slice.
    ///
    /// A missing alpha channel means fully opaque.
    ///
    /// # Errors
    ///
    /// Returns [`ColorError::TupleLength`] for any other slice length.
    pub fn from_channels(channels: &[u8]) -> Result<Self, ColorError> {
        match *channels {
            [r, g, b] => Ok(Self::opaque(r, g, b)),
            [r, g, b, a] => Ok(Self::new(r, g, b, a)),
            _ => Err(ColorError::TupleLength(channels.len())),
        }
    }

    pub fn r(self) -> u8 {
        self.r
    }

    pub fn g(self) -> u8 {
        self.g
    }

    pub fn b(self) -> u8 {
        self.b
    }

    pub fn a(self) -> u8 {
        self.a
    }

    /// Returns the alpha channel as an opacity between 0.0 and 1.0
    pub fn opacity(self) -> f32 {
        f32::from(self.a) / 255.0
    }

    /// Darkens the color by subtracting `amount` from each RGB channel.
    ///
    /// Channels saturate at zero and the alpha channel is kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use layerscape_core::color::Rgba;
    ///
    /// let faded = Rgba::new(0, 10, 30, 200).fade(20);
    /// assert_eq!(faded, Rgba::new(0, 0, 10, 200));
    /// ```
    pub fn fade(self, amount: u8) -> Self {
        Self {
            r: self.r.saturating_sub(amount),
            g: self.g.saturating_sub(amount),
            b: self.b.saturating_sub(amount),
            a: self.a,
        }
    }
}

impl fmt::Display for Rgba {
    /// Formats the RGB channels as an SVG `rgb(r,g,b)` value
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        color.to_rgba()
    }
}

impl FromStr for Rgba {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::new(s).map(Color::to_rgba)
    }
}

impl From<Rgba> for svg::node::Value {
    fn from(color: Rgba) -> Self {
        Self::from(color.to_string())
    }
}

/// A color as written in a configuration file.
///
/// Accepts a CSS color string, a packed `0xRRGGBB` integer or a list of 3
/// or 4 channel values.
///
/// ```toml
/// fill = "#ffd166"
/// outline = [0, 0, 0]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Css(String),
    Packed(u32),
    Channels(Vec<u8>),
}

impl ColorSpec {
    /// Normalizes this specification to 8-bit RGBA.
    ///
    /// # Errors
    ///
    /// Returns a [`ColorError`] if the string is not a valid CSS color or the
    /// channel list has the wrong length.
    pub fn to_rgba(&self) -> Result<Rgba, ColorError> {
        match self {
            Self::Css(value) => value.parse(),
            Self::Packed(value) => Ok(Rgba::from_packed(*value)),
            Self::Channels(channels) => Rgba::from_channels(channels),
        }
    }
}

/// Default palette of the [`ColorWheel`].
pub const DEFAULT_PALETTE: [Rgba; 5] = [
    Rgba::opaque(0xff, 0xd1, 0x66),
    Rgba::opaque(0xef, 0x47, 0x6f),
    Rgba::opaque(0x06, 0xd6, 0xa0),
    Rgba::opaque(0x11, 0x8a, 0xb2),
    Rgba::opaque(0x07, 0x3b, 0x4c),
];

/// Deterministic round-robin color assignment keyed by layer kind.
///
/// The first kind seen receives the first palette color, the second kind the
/// second one and so on, wrapping around when the palette is exhausted. A kind
/// keeps its color for the lifetime of the wheel.
///
/// # Examples
///
/// ```
/// use layerscape_core::color::{ColorWheel, DEFAULT_PALETTE};
///
/// let mut wheel = ColorWheel::default();
/// let dense = wheel.get_color("Dense");
/// let conv = wheel.get_color("Conv2D");
///
/// assert_eq!(dense, DEFAULT_PALETTE[0]);
/// assert_eq!(conv, DEFAULT_PALETTE[1]);
/// assert_eq!(wheel.get_color("Dense"), dense);
/// ```
#[derive(Debug, Clone)]
pub struct ColorWheel {
    colors: Vec<Rgba>,
    cache: HashMap<String, Rgba>,
}

impl ColorWheel {
    /// Creates a wheel cycling over the given palette.
    ///
    /// # Errors
    ///
    /// Returns [`ColorError::EmptyPalette`] if `colors` is empty.
    pub fn with_palette(colors: Vec<Rgba>) -> Result<Self, ColorError> {
        if colors.is_empty() {
            return Err(ColorError::EmptyPalette);
        }
        Ok(Self {
            colors,
            cache: HashMap::new(),
        })
    }

    /// Returns the color assigned to `kind`, assigning the next palette color
    /// on first sight.
    pub fn get_color(&mut self, kind: &str) -> Rgba {
        if let Some(color) = self.cache.get(kind) {
            return *color;
        }
        let color = self.colors[self.cache.len() % self.colors.len()];
        self.cache.insert(kind.to_string(), color);
        color
    }

    /// Returns the number of kinds that received a color so far
    pub fn assigned(&self) -> usize {
        self.cache.len()
    }
}

impl Default for ColorWheel {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE.to_vec(),
            cache: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_new() {
        assert!(Color::new("#ff0000").is_ok());
        assert!(Color::new("rgb(1, 2, 3)").is_ok());

        let err = Color::new("not-a-color").unwrap_err();
        assert!(matches!(err, ColorError::Invalid { ref value, .. } if value == "not-a-color"));
    }

    #[test]
    fn test_named_color_to_rgba() {
        assert_eq!("orange".parse::<Rgba>().unwrap(), Rgba::ORANGE);
        assert_eq!("black".parse::<Rgba>().unwrap(), Rgba::BLACK);
        assert_eq!("gray".parse::<Rgba>().unwrap(), Rgba::GRAY);
    }

    #[test]
    fn test_hex_with_alpha() {
        let rgba: Rgba = "#ff000080".parse().unwrap();
        assert_eq!((rgba.r(), rgba.g(), rgba.b()), (255, 0, 0));
        assert_eq!(rgba.a(), 128);
    }

    #[test]
    fn test_rgb_function_string() {
        let rgba: Rgba = "rgb(10, 20, 30)".parse().unwrap();
        assert_eq!(rgba, Rgba::opaque(10, 20, 30));
    }

    #[test]
    fn test_packed_integers() {
        assert_eq!(Rgba::from_packed(0x010203), Rgba::opaque(1, 2, 3));
        assert_eq!(Rgba::from_packed(0x00ff_ffff), Rgba::WHITE);
        // high byte carries no alpha
        assert_eq!(Rgba::from_packed(0x7f00_0000), Rgba::BLACK);
        assert_eq!(ColorSpec::Packed(16_711_680).to_rgba().unwrap(), Rgba::opaque(255, 0, 0));
    }

    #[test]
    fn test_channel_tuples() {
        assert_eq!(
            Rgba::from_channels(&[1, 2, 3]).unwrap(),
            Rgba::new(1, 2, 3, 255)
        );
        assert_eq!(
            Rgba::from_channels(&[1, 2, 3, 4]).unwrap(),
            Rgba::new(1, 2, 3, 4)
        );
        assert_eq!(
            Rgba::from_channels(&[1, 2]).unwrap_err(),
            ColorError::TupleLength(2)
        );
    }

    #[test]
    fn test_fade_saturates_and_keeps_alpha() {
        assert_eq!(Rgba::new(0, 10, 30, 200).fade(20), Rgba::new(0, 0, 10, 200));
        assert_eq!(Rgba::WHITE.fade(255), Rgba::new(0, 0, 0, 255));
    }

    #[test]
    fn test_rgba_display() {
        assert_eq!(Rgba::new(1, 2, 3, 4).to_string(), "rgb(1,2,3)");
        assert_eq!(Rgba::WHITE.opacity(), 1.0);
    }

    #[test]
    fn test_color_spec_deserialize() {
        let specs: Vec<ColorSpec> =
            serde_json::from_str(r##"["#ffd166", 16909060, [1, 2, 3]]"##).unwrap();
        assert_eq!(specs[0], ColorSpec::Css("#ffd166".to_string()));
        assert_eq!(specs[1].to_rgba().unwrap(), Rgba::new(2, 3, 4, 1));
        assert_eq!(specs[2].to_rgba().unwrap(), Rgba::opaque(1, 2, 3));
    }

    #[test]
    fn test_color_wheel_round_robin() {
        let mut wheel = ColorWheel::with_palette(vec![Rgba::BLACK, Rgba::WHITE]).unwrap();

        assert_eq!(wheel.get_color("a"), Rgba::BLACK);
        assert_eq!(wheel.get_color("b"), Rgba::WHITE);
        assert_eq!(wheel.get_color("c"), Rgba::BLACK);
        assert_eq!(wheel.get_color("b"), Rgba::WHITE);
        assert_eq!(wheel.assigned(), 3);
    }

    #[test]
    fn test_color_wheel_default_palette() {
        let mut wheel = ColorWheel::default();
        assert_eq!(wheel.get_color("Dense"), Rgba::opaque(0xff, 0xd1, 0x66));
        assert_eq!(wheel.get_color("Conv2D"), Rgba::opaque(0xef, 0x47, 0x6f));
    }

    #[test]
    fn test_color_wheel_empty_palette() {
        assert_eq!(
            ColorWheel::with_palette(Vec::new()).unwrap_err(),
            ColorError::EmptyPalette
        );
    }
}
