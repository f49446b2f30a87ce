//! Q&A cards and the color swatch grid they share with `ColorSwatch` blocks.

use crate::canvas::Stroke;
use crate::model::Answer;
use crate::style::{Color, TextAlign, TextStyle};

use super::blocks::{BlockPlan, BlockRenderer};

const CARD_PADDING: f64 = 10.0;
const BADGE_SIZE: f64 = 22.0;
/// Left edge of question and answer text inside a card.
const CARD_TEXT_X: f64 = 50.0;
/// Space a card adds around its question and answer: top padding, the gap
/// between question and answer, and bottom padding.
const BADGE_ROW_PADDING: f64 = 28.0;
const QUESTION_ANSWER_GAP: f64 = 8.0;

const SWATCH_LABEL_GAP: f64 = 3.0;
const SWATCH_LABEL_SIZE: f64 = 8.0;
const NO_COLORS: &str = "No colors specified";

/// Row lengths for `count` swatches, `per_row` to a row.
pub fn swatch_rows(count: usize, per_row: usize) -> Vec<usize> {
    let per_row = per_row.max(1);
    let mut rows = vec![per_row; count / per_row];
    if count % per_row != 0 {
        rows.push(count % per_row);
    }
    rows
}

fn label_style(color: Color) -> TextStyle {
    TextStyle::new(SWATCH_LABEL_SIZE).color(color)
}

/// Height of a swatch label row below each square.
fn label_height() -> f64 {
    SWATCH_LABEL_GAP + label_style(Color::BLACK).line_height_pt()
}

/// How many swatches fit on a row of `width`, capped by the configured count.
fn effective_per_row(renderer: &BlockRenderer<'_>, width: f64) -> usize {
    let blocks = &renderer.config().blocks;
    let fitting = ((width + blocks.swatch_spacing) / (blocks.swatch_size + blocks.swatch_spacing))
        .floor()
        .max(1.0) as usize;
    blocks.swatches_per_row.min(fitting).max(1)
}

/// Lay out a swatch grid at (`x`, `y`) within `width`. Returns its height:
/// `rows * (size + labelHeight) + (rows - 1) * spacing`, or one text line for
/// an empty list.
pub(crate) fn plan_swatches(
    renderer: &BlockRenderer<'_>,
    plan: &mut BlockPlan,
    colors: &[String],
    x: f64,
    y: f64,
    width: f64,
) -> f64 {
    let config = renderer.config();
    let palette = &config.palette;
    let layout = renderer.text_layout();

    if colors.is_empty() {
        let style = TextStyle::new(10.0).italic().color(palette.muted);
        return plan.text(layout, NO_COLORS, x, y, width, style);
    }

    let size = config.blocks.swatch_size;
    let spacing = config.blocks.swatch_spacing;
    let per_row = effective_per_row(renderer, width);
    let row_height = size + label_height();
    let fallback = Color::hex_or("#cccccc", Color::WHITE);
    let style = label_style(palette.text).align(TextAlign::Center);

    let mut offset = 0;
    for (row, len) in swatch_rows(colors.len(), per_row).into_iter().enumerate() {
        let row_y = y + row as f64 * (row_height + spacing);
        for (col, raw) in colors[offset..offset + len].iter().enumerate() {
            let swatch_x = x + col as f64 * (size + spacing);
            let fill = Color::parse_hex(raw).unwrap_or(fallback);
            plan.rect(
                swatch_x,
                row_y,
                size,
                size,
                Some(fill),
                Some(Stroke::new(palette.border, 0.5)),
            );
            let label_width = size + spacing;
            let label = layout.truncate_to_width(raw.trim(), label_width, &style);
            plan.text(
                layout,
                &label,
                swatch_x - spacing / 2.0,
                row_y + size + SWATCH_LABEL_GAP,
                label_width,
                style,
            );
        }
        offset += len;
    }

    let rows = swatch_rows(colors.len(), per_row).len() as f64;
    rows * row_height + (rows - 1.0) * spacing
}

/// A numbered card: badge, bold question, then either the answer text or a
/// swatch grid. `height = question + answer + badgeRowPadding`.
pub(crate) fn plan_card(
    renderer: &BlockRenderer<'_>,
    index: usize,
    question: &str,
    answer: &Answer,
) -> BlockPlan {
    let palette = &renderer.config().palette;
    let layout = renderer.text_layout();
    let width = renderer.width();
    let text_width = width - CARD_TEXT_X - CARD_PADDING;
    let question_style = TextStyle::new(11.0).bold().color(palette.text);

    let mut body = BlockPlan::new();
    let question_height = body.text(
        layout,
        question,
        CARD_TEXT_X,
        CARD_PADDING,
        text_width,
        question_style,
    );
    let answer_y = CARD_PADDING + question_height + QUESTION_ANSWER_GAP;
    let answer_height = match answer {
        Answer::Text(text) => body.text(
            layout,
            text,
            CARD_TEXT_X,
            answer_y,
            text_width,
            TextStyle::new(10.0).color(palette.muted).line_gap(1.0),
        ),
        Answer::ColorSwatchList(colors) => {
            plan_swatches(renderer, &mut body, colors, CARD_TEXT_X, answer_y, text_width)
        }
    };
    let height = (question_height + answer_height + BADGE_ROW_PADDING)
        .max(2.0 * CARD_PADDING + BADGE_SIZE);

    // Background and badge go under the text, so they are planned first.
    let mut plan = BlockPlan::new();
    plan.rect(
        0.0,
        0.0,
        width,
        height,
        Some(Color::hex_or("#f9fafb", Color::WHITE)),
        Some(Stroke::new(palette.border, 0.75)),
    );
    plan.rect(
        CARD_PADDING + 5.0,
        CARD_PADDING,
        BADGE_SIZE,
        BADGE_SIZE,
        Some(palette.primary),
        None,
    );
    let badge_style = TextStyle::new(10.0)
        .bold()
        .color(Color::WHITE)
        .align(TextAlign::Center);
    plan.text(
        layout,
        &index.to_string(),
        CARD_PADDING + 5.0,
        CARD_PADDING + (BADGE_SIZE - badge_style.line_height_pt()) / 2.0,
        BADGE_SIZE,
        badge_style,
    );
    plan.append(body);
    plan.height = height;
    plan
}
