//! # Style Primitives
//!
//! Colors, font selection and per-run text styling. Block renderers build a
//! [`TextStyle`] for every piece of text they place; the same value is handed
//! to measurement and to drawing so both sides agree on the wrapped height.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque RGB color. Components are in `0.0..=1.0`.
///
/// Serialized as a `#rrggbb` hex string so configs stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb` (the leading `#` is optional).
    ///
    /// Returns `None` for anything else, including valid-looking strings with
    /// non-hex digits. Callers that must never fail use [`Color::hex_or`].
    pub fn parse_hex(input: &str) -> Option<Self> {
        let hex = input.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let (r, g, b) = match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
                (r, g, b)
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                (r, g, b)
            }
            _ => return None,
        };
        Some(Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        })
    }

    /// Parse a hex color, substituting `fallback` when the input is malformed.
    pub fn hex_or(input: &str, fallback: Color) -> Self {
        Self::parse_hex(input).unwrap_or(fallback)
    }

    pub fn to_hex(&self) -> String {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse_hex(&value).ok_or_else(|| format!("invalid hex color '{}'", value))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Default line height as a multiple of the font size.
pub const DEFAULT_LINE_HEIGHT: f64 = 1.2;

/// Everything the text layout needs to know about a run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
    /// 400 = regular, 700 = bold. Other values snap to the nearest of the two.
    pub font_weight: u32,
    pub font_style: FontStyle,
    pub color: Color,
    pub align: TextAlign,
    /// Line height as a multiple of `font_size`.
    pub line_height: f64,
    /// Extra space between consecutive lines (not before the first or after the last).
    pub line_gap: f64,
}

impl TextStyle {
    pub fn new(font_size: f64) -> Self {
        Self {
            font_size,
            font_weight: 400,
            font_style: FontStyle::Normal,
            color: Color::BLACK,
            align: TextAlign::Left,
            line_height: DEFAULT_LINE_HEIGHT,
            line_gap: 0.0,
        }
    }

    pub fn bold(mut self) -> Self {
        self.font_weight = 700;
        self
    }

    pub fn italic(mut self) -> Self {
        self.font_style = FontStyle::Italic;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn line_gap(mut self, gap: f64) -> Self {
        self.line_gap = gap;
        self
    }

    /// Force each line to occupy exactly `points` vertically.
    pub fn fixed_line_height(mut self, points: f64) -> Self {
        if self.font_size > 0.0 {
            self.line_height = points / self.font_size;
        }
        self
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight >= 600
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == FontStyle::Italic
    }

    /// Height of a single line in points.
    pub fn line_height_pt(&self) -> f64 {
        self.font_size * self.line_height
    }
}

/// Brand colors shared by the block renderers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,
    pub text: Color,
    pub muted: Color,
    pub light: Color,
    pub border: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: Color::hex_or("#4f46e5", Color::BLACK),
            secondary: Color::hex_or("#7c3aed", Color::BLACK),
            accent: Color::hex_or("#06b6d4", Color::BLACK),
            text: Color::hex_or("#1f2937", Color::BLACK),
            muted: Color::hex_or("#6b7280", Color::BLACK),
            light: Color::hex_or("#f3f4f6", Color::WHITE),
            border: Color::hex_or("#e5e7eb", Color::WHITE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_and_three_digit_hex() {
        let red = Color::parse_hex("#ff0000").unwrap();
        assert_eq!(red, Color::rgb(1.0, 0.0, 0.0));
        let short = Color::parse_hex("0f0").unwrap();
        assert_eq!(short, Color::rgb(0.0, 1.0, 0.0));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(Color::parse_hex("#ff00").is_none());
        assert!(Color::parse_hex("#gg0000").is_none());
        assert!(Color::parse_hex("red").is_none());
        assert!(Color::parse_hex("").is_none());
    }

    #[test]
    fn hex_or_falls_back() {
        assert_eq!(Color::hex_or("nope", Color::WHITE), Color::WHITE);
    }

    #[test]
    fn hex_string_round_trips_through_serde() {
        let json = serde_json::to_string(&Color::rgb(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(json, "\"#ff0000\"");
        let back: Color = serde_json::from_str("\"#131313\"").unwrap();
        assert_eq!(back.to_hex(), "#131313");
        assert!(serde_json::from_str::<Color>("\"#zz\"").is_err());
    }

    #[test]
    fn fixed_line_height_sets_multiplier() {
        let style = TextStyle::new(10.0).fixed_line_height(16.0);
        assert!((style.line_height_pt() - 16.0).abs() < 1e-9);
    }
}
