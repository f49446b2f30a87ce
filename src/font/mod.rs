//! # Font Management
//!
//! The engine draws with the standard PDF Helvetica family, which every
//! viewer ships, so nothing is embedded. This module maps a requested
//! weight/style onto one of the four faces and answers width queries for
//! the text layout.

pub mod metrics;

pub use metrics::StandardFontMetrics;

/// The standard faces the renderer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
        }
    }

    /// Oblique faces share the upright advance widths.
    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica | Self::HelveticaOblique => &metrics::HELVETICA,
            Self::HelveticaBold | Self::HelveticaBoldOblique => &metrics::HELVETICA_BOLD,
        }
    }
}

/// Resolves styles to faces and measures text with their metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontContext;

impl FontContext {
    pub fn new() -> Self {
        Self
    }

    /// Pick a face, snapping the weight to regular (400) or bold (700).
    pub fn resolve(&self, weight: u32, italic: bool) -> StandardFont {
        match (weight >= 600, italic) {
            (false, false) => StandardFont::Helvetica,
            (true, false) => StandardFont::HelveticaBold,
            (false, true) => StandardFont::HelveticaOblique,
            (true, true) => StandardFont::HelveticaBoldOblique,
        }
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, weight: u32, italic: bool, font_size: f64) -> f64 {
        self.resolve(weight, italic)
            .metrics()
            .char_width(ch, font_size)
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, weight: u32, italic: bool, font_size: f64) -> f64 {
        self.resolve(weight, italic)
            .metrics()
            .measure_string(text, font_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_context_helvetica() {
        let ctx = FontContext::new();
        let w = ctx.char_width(' ', 400, false, 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_font_context_bold_wider() {
        let ctx = FontContext::new();
        let regular = ctx.measure_string("Budget", 400, false, 12.0);
        let bold = ctx.measure_string("Budget", 700, false, 12.0);
        assert!(bold > regular, "Bold text should be wider than regular");
    }

    #[test]
    fn test_font_context_weight_snapping() {
        let ctx = FontContext::new();
        assert_eq!(ctx.resolve(800, false), StandardFont::HelveticaBold);
        assert_eq!(ctx.resolve(500, false), StandardFont::Helvetica);
        assert_eq!(ctx.resolve(700, true), StandardFont::HelveticaBoldOblique);
    }

    #[test]
    fn test_oblique_shares_upright_widths() {
        let ctx = FontContext::new();
        let upright = ctx.measure_string("Primary color?", 400, false, 11.0);
        let oblique = ctx.measure_string("Primary color?", 400, true, 11.0);
        assert!((upright - oblique).abs() < 1e-9);
    }
}
