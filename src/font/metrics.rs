//! Advance widths for the standard Helvetica faces, in 1/1000 em.
//!
//! Values come from the Adobe Core 14 AFM files. Only printable ASCII is
//! tabulated; a handful of WinAnsi extras used by the renderers (bullet,
//! ellipsis, no-break space) are special-cased and everything else falls back
//! to the face's default advance.

/// Metrics for one of the standard PDF fonts.
#[derive(Debug)]
pub struct StandardFontMetrics {
    /// Widths for code points 0x20..=0x7E.
    widths: &'static [u16; 95],
    default_width: u16,
    pub ascender: i16,
    pub descender: i16,
}

impl StandardFontMetrics {
    fn advance(&self, ch: char) -> u16 {
        let code = ch as u32;
        if (0x20..=0x7E).contains(&code) {
            return self.widths[(code - 0x20) as usize];
        }
        match ch {
            '\u{00A0}' => self.widths[0],
            '\u{2022}' => 350,
            '\u{2026}' => 1000,
            '\u{2013}' => 556,
            '\u{2014}' => 1000,
            _ => self.default_width,
        }
    }

    /// Advance width of `ch` in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.advance(ch) as f64 / 1000.0 * font_size
    }

    /// Width of a whole string in points.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }

    /// Distance from the top of a line box of height `line_height` to the
    /// baseline, with the glyph box centred vertically.
    pub fn baseline_offset(&self, font_size: f64, line_height: f64) -> f64 {
        let ascent = self.ascender as f64 / 1000.0 * font_size;
        let descent = -(self.descender as f64) / 1000.0 * font_size;
        (line_height - (ascent + descent)) / 2.0 + ascent
    }
}

#[rustfmt::skip]
static HELVETICA_WIDTHS: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    333, 333, 584, 584, 584, 611, 975,
    // A-Z
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    333, 278, 333, 584, 556, 333,
    // a-z
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    // { | } ~
    389, 280, 389, 584,
];

pub static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA_WIDTHS,
    default_width: 556,
    ascender: 718,
    descender: -207,
};

pub static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA_BOLD_WIDTHS,
    default_width: 611,
    ascender: 718,
    descender: -207,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_is_278_units() {
        assert!((HELVETICA.char_width(' ', 12.0) - 3.336).abs() < 1e-9);
        assert!((HELVETICA_BOLD.char_width(' ', 12.0) - 3.336).abs() < 1e-9);
    }

    #[test]
    fn table_lines_up_with_ascii() {
        assert_eq!(HELVETICA.advance('0'), 556);
        assert_eq!(HELVETICA.advance('A'), 667);
        assert_eq!(HELVETICA.advance('W'), 944);
        assert_eq!(HELVETICA.advance('a'), 556);
        assert_eq!(HELVETICA.advance('i'), 222);
        assert_eq!(HELVETICA.advance('~'), 584);
        assert_eq!(HELVETICA_BOLD.advance('m'), 889);
        assert_eq!(HELVETICA_BOLD.advance('z'), 500);
    }

    #[test]
    fn unknown_chars_use_default_advance() {
        assert_eq!(HELVETICA.advance('é'), 556);
        assert_eq!(HELVETICA.advance('\u{2022}'), 350);
    }

    #[test]
    fn baseline_sits_inside_line_box() {
        let offset = HELVETICA.baseline_offset(10.0, 12.0);
        assert!(offset > 0.0 && offset < 12.0);
    }
}
