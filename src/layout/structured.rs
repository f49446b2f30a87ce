//! Heuristic formatting for semi-structured text dumps such as template
//! definitions. Each line is classified on its own; anything unrecognised is
//! plain text, so no input can make rendering fail.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::canvas::Stroke;
use crate::style::{Color, TextStyle};

use super::blocks::{BlockPlan, BlockRenderer};

static BANNER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^TEMPLATE \d+ \((?i:page) \d+: [^)]+\)$").expect("banner pattern is valid")
});
static SUB_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_]+:$").expect("sub-header pattern is valid"));

/// Indent per leading whitespace character of a bullet line.
const INDENT_PER_CHAR: f64 = 6.0;
const LINE_SPACING: f64 = 2.0;
const BASE_SIZE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `TEMPLATE 2 (PAGE 1: HOME)`
    Banner(&'a str),
    Blank,
    /// `header:`
    SubHeader(&'a str),
    /// `  - item`, with the count of leading whitespace characters.
    Bullet { depth: usize, text: &'a str },
    KeyValue { key: &'a str, value: &'a str },
    Plain(&'a str),
}

pub fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if BANNER.is_match(trimmed) {
        return LineKind::Banner(trimmed);
    }
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if SUB_HEADER.is_match(trimmed) {
        return LineKind::SubHeader(trimmed);
    }
    if let Some(rest) = trimmed.strip_prefix('-') {
        let depth = line.chars().take_while(|c| c.is_whitespace()).count();
        return LineKind::Bullet {
            depth,
            text: rest.trim(),
        };
    }
    if !trimmed.ends_with(':') {
        if let Some((key, value)) = trimmed.split_once(": ") {
            return LineKind::KeyValue {
                key: key.trim(),
                value: value.trim(),
            };
        }
    }
    LineKind::Plain(trimmed)
}

pub(crate) fn plan_structured_text(renderer: &BlockRenderer<'_>, lines: &[String]) -> BlockPlan {
    let palette = &renderer.config().palette;
    let layout = renderer.text_layout();
    let width = renderer.width();
    let body = TextStyle::new(BASE_SIZE).color(palette.text);

    let mut plan = BlockPlan::new();
    let mut y = 0.0;
    let mut previous_blank = true;

    for line in lines {
        let kind = classify(line);
        if kind != LineKind::Blank && !previous_blank {
            y += LINE_SPACING;
        }
        previous_blank = kind == LineKind::Blank;

        match kind {
            LineKind::Banner(text) => {
                let style = TextStyle::new(11.0).bold().color(Color::WHITE);
                let lines = layout.break_into_lines(text, width - 12.0, &style);
                let text_height = crate::text::height_for_lines(lines.len(), &style);
                let bar_height = text_height + 8.0;
                plan.rect(0.0, y, width, bar_height, Some(palette.primary), None);
                plan.lines(lines, 6.0, y + 4.0, width - 12.0, style);
                y += bar_height;
            }
            LineKind::Blank => {
                y += body.line_height_pt() / 2.0;
            }
            LineKind::SubHeader(text) => {
                let style = TextStyle::new(10.5).bold().color(palette.primary);
                let h = plan.text(layout, text, 0.0, y, width, style);
                plan.line(
                    0.0,
                    y + h,
                    width.min(180.0),
                    y + h,
                    Stroke::new(palette.border, 0.5),
                );
                y += h;
            }
            LineKind::Bullet { depth, text } => {
                let indent = (depth as f64 * INDENT_PER_CHAR).min(width / 2.0);
                let bullet = body.color(palette.accent);
                plan.text(layout, "\u{2022}", indent + 4.0, y, 8.0, bullet);
                let text_x = indent + 14.0;
                y += plan.text(layout, text, text_x, y, width - text_x, body);
            }
            LineKind::KeyValue { key, value } => {
                let key_style = body.bold();
                let key_max = width * 0.4;
                let key_text = layout.truncate_to_width(&format!("{}:", key), key_max - 4.0, &key_style);
                let key_width = layout.measure_width(&key_text, &key_style);
                let key_height = plan.text(layout, &key_text, 0.0, y, key_max, key_style);
                let value_x = key_width + 4.0;
                let value_height = plan.text(layout, value, value_x, y, width - value_x, body);
                y += key_height.max(value_height);
            }
            LineKind::Plain(text) => {
                y += plan.text(layout, text, 0.0, y, width, body);
            }
        }
    }

    plan.height = y;
    plan
}
