//! # Text Layout
//!
//! Line breaking and height measurement.
//!
//! Every block decides its size before anything is drawn, so measurement and
//! drawing must wrap text identically. Both go through
//! [`TextLayout::break_into_lines`]; [`TextLayout::measure_height`] is just the
//! line count turned into points. Nothing else in the crate wraps text.

use crate::font::FontContext;
use crate::style::TextStyle;
use unicode_linebreak::{linebreaks, BreakOpportunity};

const ELLIPSIS: char = '\u{2026}';

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    pub text: String,
    /// Width of the line, excluding trailing spaces.
    pub width: f64,
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Each entry is the opportunity *before* that char. Index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() reports byte offsets of the start of the next segment.
    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = char_count;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Total height of `count` lines set in `style`.
///
/// Line gaps sit between lines only, never before the first or after the last.
pub fn height_for_lines(count: usize, style: &TextStyle) -> f64 {
    if count == 0 {
        return 0.0;
    }
    count as f64 * style.line_height_pt() + (count - 1) as f64 * style.line_gap
}

/// How many whole lines fit in `height` points.
pub fn lines_fitting(height: f64, style: &TextStyle) -> usize {
    let per_line = style.line_height_pt() + style.line_gap;
    if per_line <= 0.0 || height < style.line_height_pt() {
        return 0;
    }
    ((height + style.line_gap) / per_line + 1e-9).floor() as usize
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextLayout {
    fonts: FontContext,
}

impl TextLayout {
    pub fn new(fonts: FontContext) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &FontContext {
        &self.fonts
    }

    /// Width of `text` on a single line.
    pub fn measure_width(&self, text: &str, style: &TextStyle) -> f64 {
        self.fonts
            .measure_string(text, style.font_weight, style.is_italic(), style.font_size)
    }

    /// Break a string into lines that fit within `max_width`.
    ///
    /// Greedy: breaks at the last UAX#14 opportunity before the overflow,
    /// honours newlines as mandatory breaks, and splits a word mid-way when it
    /// is wider than the whole line. Empty input yields one empty line.
    pub fn break_into_lines(&self, text: &str, max_width: f64, style: &TextStyle) -> Vec<BrokenLine> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return vec![BrokenLine {
                text: String::new(),
                width: 0.0,
            }];
        }

        let italic = style.is_italic();
        let char_widths: Vec<f64> = chars
            .iter()
            .map(|&ch| {
                if is_newline(ch) {
                    0.0
                } else {
                    self.fonts
                        .char_width(ch, style.font_weight, italic, style.font_size)
                }
            })
            .collect();
        let break_opps = compute_break_opportunities(text);

        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut line_width = 0.0;
        let mut last_break_point: Option<usize> = None;

        for (i, &ch) in chars.iter().enumerate() {
            if i > 0 {
                match break_opps[i] {
                    Some(BreakOpportunity::Mandatory) => {
                        lines.push(make_line(&chars[line_start..i], &char_widths[line_start..i]));
                        line_start = i;
                        line_width = 0.0;
                        last_break_point = None;
                    }
                    Some(BreakOpportunity::Allowed) => {
                        last_break_point = Some(i - 1);
                    }
                    None => {}
                }
            }

            if is_newline(ch) {
                continue;
            }

            let char_width = char_widths[i];
            if line_width + char_width > max_width && line_start < i {
                if let Some(bp) = last_break_point.filter(|&bp| bp >= line_start) {
                    let break_at = bp + 1;
                    lines.push(make_line(
                        &chars[line_start..break_at],
                        &char_widths[line_start..break_at],
                    ));
                    line_start = break_at;
                    line_width = char_widths[line_start..=i].iter().sum();
                    last_break_point = None;
                    continue;
                }

                // No break opportunity on this line: split the word here.
                lines.push(make_line(&chars[line_start..i], &char_widths[line_start..i]));
                line_start = i;
                line_width = char_width;
                last_break_point = None;
                continue;
            }

            line_width += char_width;
        }

        if line_start < chars.len() {
            lines.push(make_line(&chars[line_start..], &char_widths[line_start..]));
        }

        lines
    }

    /// Rendered height of `text` wrapped to `max_width`.
    pub fn measure_height(&self, text: &str, max_width: f64, style: &TextStyle) -> f64 {
        height_for_lines(self.break_into_lines(text, max_width, style).len(), style)
    }

    /// Shorten `text` so it fits on one line of `max_width`, ending with an
    /// ellipsis when anything was cut.
    pub fn truncate_to_width(&self, text: &str, max_width: f64, style: &TextStyle) -> String {
        let single_line: String = text
            .chars()
            .map(|c| if is_newline(c) { ' ' } else { c })
            .collect();
        if self.measure_width(&single_line, style) <= max_width {
            return single_line;
        }

        let ellipsis_width = self.measure_width(&ELLIPSIS.to_string(), style);
        let mut kept = String::new();
        let mut width = 0.0;
        for ch in single_line.chars() {
            let w = self
                .fonts
                .char_width(ch, style.font_weight, style.is_italic(), style.font_size);
            if width + w + ellipsis_width > max_width {
                break;
            }
            width += w;
            kept.push(ch);
        }
        let mut truncated = kept.trim_end().to_string();
        truncated.push(ELLIPSIS);
        truncated
    }
}

/// Build a line from a slice, dropping newline chars and trailing spaces.
fn make_line(chars: &[char], widths: &[f64]) -> BrokenLine {
    let mut end = chars.len();
    while end > 0 && (chars[end - 1] == ' ' || is_newline(chars[end - 1])) {
        end -= 1;
    }
    let text: String = chars[..end].iter().filter(|c| !is_newline(**c)).collect();
    let width = chars[..end]
        .iter()
        .zip(widths[..end].iter())
        .filter(|(c, _)| !is_newline(**c))
        .map(|(_, w)| w)
        .sum();
    BrokenLine { text, width }
}
