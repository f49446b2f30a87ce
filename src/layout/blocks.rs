//! Block renderers.
//!
//! Each block is turned into a [`BlockPlan`]: the draw operations relative to
//! the block's top-left corner, plus its total height. Measuring a block is
//! building its plan and reading the height; drawing it is replaying the same
//! plan at the cursor. The text inside a plan is already broken into lines, so
//! the height the page-break policy sees is exactly the height drawn.

use crate::canvas::{Canvas, Stroke};
use crate::config::{GeneratorConfig, ParagraphOverflow};
use crate::model::{Block, Field};
use crate::style::{Color, TextAlign, TextStyle};
use crate::text::{height_for_lines, lines_fitting, BrokenLine, TextLayout};

use super::{qa, structured};

/// Height of the bar drawn above each section's blocks.
pub const SECTION_HEADER_HEIGHT: f64 = 22.0;

const BULLET: &str = "\u{2022}";
const HEADLINE_BODY_INDENT: f64 = 20.0;
const HEADLINE_BODY_GAP: f64 = 2.0;

/// High is red, Medium amber, anything else green.
pub fn severity_color(severity: &str) -> Color {
    let hex = match severity.trim().to_ascii_lowercase().as_str() {
        "high" => "#ef4444",
        "medium" => "#f59e0b",
        _ => "#10b981",
    };
    Color::hex_or(hex, Color::BLACK)
}

#[derive(Debug, Clone)]
enum PlanOp {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: Stroke,
    },
    Text {
        x: f64,
        y: f64,
        width: f64,
        lines: Vec<BrokenLine>,
        style: TextStyle,
    },
}

/// A block laid out relative to its own origin.
#[derive(Debug, Clone, Default)]
pub struct BlockPlan {
    pub height: f64,
    /// Lines of a clamped paragraph that were left out.
    pub clipped_lines: usize,
    ops: Vec<PlanOp>,
}

impl BlockPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    ) {
        self.ops.push(PlanOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        });
    }

    pub(crate) fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: Stroke) {
        self.ops.push(PlanOp::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
        });
    }

    /// Place pre-broken lines. Returns their height.
    pub(crate) fn lines(
        &mut self,
        lines: Vec<BrokenLine>,
        x: f64,
        y: f64,
        width: f64,
        style: TextStyle,
    ) -> f64 {
        let height = height_for_lines(lines.len(), &style);
        self.ops.push(PlanOp::Text {
            x,
            y,
            width,
            lines,
            style,
        });
        height
    }

    /// Wrap and place text. Returns its height.
    pub(crate) fn text(
        &mut self,
        layout: &TextLayout,
        text: &str,
        x: f64,
        y: f64,
        width: f64,
        style: TextStyle,
    ) -> f64 {
        let lines = layout.break_into_lines(text, width, &style);
        self.lines(lines, x, y, width, style)
    }

    /// Paint `other`'s operations after this plan's. Heights are left alone.
    pub(crate) fn append(&mut self, other: BlockPlan) {
        self.ops.extend(other.ops);
        self.clipped_lines += other.clipped_lines;
    }

    /// Number of draw operations.
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// Replay the plan with its origin at (`x`, `y`). Returns the height consumed.
    pub fn draw(&self, canvas: &mut Canvas, x: f64, y: f64) -> f64 {
        for op in &self.ops {
            match op {
                PlanOp::Rect {
                    x: rx,
                    y: ry,
                    width,
                    height,
                    fill,
                    stroke,
                } => canvas.draw_rect(x + rx, y + ry, *width, *height, *fill, *stroke),
                PlanOp::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    stroke,
                } => canvas.draw_line(x + x1, y + y1, x + x2, y + y2, *stroke),
                PlanOp::Text {
                    x: tx,
                    y: ty,
                    width,
                    lines,
                    style,
                } => {
                    canvas.draw_lines(lines, x + tx, y + ty, *width, style);
                }
            }
        }
        self.height
    }
}

/// Plans blocks for one content width.
pub struct BlockRenderer<'a> {
    config: &'a GeneratorConfig,
    text: TextLayout,
    width: f64,
}

impl<'a> BlockRenderer<'a> {
    pub fn new(config: &'a GeneratorConfig, width: f64) -> Self {
        Self {
            config,
            text: TextLayout::default(),
            width,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub(crate) fn config(&self) -> &GeneratorConfig {
        self.config
    }

    pub(crate) fn text_layout(&self) -> &TextLayout {
        &self.text
    }

    pub fn plan(&self, block: &Block) -> BlockPlan {
        match block {
            Block::Title { text } => self.plan_title(text),
            Block::FieldList { items } => self.plan_field_list(items),
            Block::Paragraph { text } => self.plan_paragraph(text),
            Block::Text { text } => self.plan_text(text),
            Block::QaCard {
                index,
                question,
                answer,
            } => qa::plan_card(self, *index, question, answer),
            Block::ColorSwatch { hex_colors } => {
                let mut plan = BlockPlan::new();
                plan.height = qa::plan_swatches(self, &mut plan, hex_colors, 0.0, 0.0, self.width);
                plan
            }
            Block::RawStructuredText { lines } => structured::plan_structured_text(self, lines),
            Block::Risk {
                severity,
                description,
                mitigation,
            } => self.plan_risk(severity, description, mitigation.as_deref()),
            Block::NumberedItem {
                index,
                title,
                description,
            } => self.plan_numbered_item(*index, title, description.as_deref()),
            Block::Caption { text } => self.plan_caption(text),
        }
    }

    /// The tinted bar with the section title.
    pub fn plan_section_header(&self, title: &str) -> BlockPlan {
        let palette = &self.config.palette;
        let padding = self.config.blocks.content_padding;
        let style = TextStyle::new(13.0).bold().color(palette.text);
        let mut plan = BlockPlan::new();
        plan.rect(0.0, 0.0, self.width, SECTION_HEADER_HEIGHT, Some(palette.light), None);
        let title = self
            .text
            .truncate_to_width(title, self.width - 2.0 * padding, &style);
        plan.text(
            &self.text,
            &title,
            padding,
            (SECTION_HEADER_HEIGHT - style.line_height_pt()) / 2.0,
            self.width - 2.0 * padding,
            style,
        );
        plan.height = SECTION_HEADER_HEIGHT;
        plan
    }

    fn plan_title(&self, text: &str) -> BlockPlan {
        let style = TextStyle::new(24.0)
            .bold()
            .color(self.config.palette.text)
            .align(TextAlign::Center);
        let mut plan = BlockPlan::new();
        plan.height = plan.text(&self.text, text, 0.0, 0.0, self.width, style);
        plan
    }

    /// One line per item: `height = n * (lineHeight + itemSpacing)`.
    fn plan_field_list(&self, items: &[Field]) -> BlockPlan {
        let blocks = &self.config.blocks;
        let palette = &self.config.palette;
        let line_height = blocks.field_line_height;
        let step = line_height + blocks.field_item_spacing;
        let label_style = TextStyle::new(11.0)
            .bold()
            .color(palette.text)
            .fixed_line_height(line_height);
        let value_style = TextStyle::new(11.0)
            .color(palette.muted)
            .fixed_line_height(line_height);
        let bullet_style = label_style.color(palette.primary);

        let bullet_x = 5.0;
        let label_x = 18.0;
        let mut plan = BlockPlan::new();

        for (i, field) in items.iter().enumerate() {
            let y = i as f64 * step;
            let single = |text: String, style: &TextStyle| {
                let width = self.text.measure_width(&text, style);
                vec![BrokenLine { text, width }]
            };

            plan.lines(single(BULLET.to_string(), &bullet_style), bullet_x, y, 10.0, bullet_style);

            let label_max = (self.width - label_x) * 0.5;
            let label = self.text.truncate_to_width(
                &format!("{}: ", field.label),
                label_max,
                &label_style,
            );
            let label_width = self.text.measure_width(&label, &label_style);
            plan.lines(single(label, &label_style), label_x, y, label_max, label_style);

            let value_x = label_x + label_width;
            let value_width = (self.width - value_x).max(0.0);
            let value = self
                .text
                .truncate_to_width(&field.value, value_width, &value_style);
            plan.lines(single(value, &value_style), value_x, y, value_width, value_style);
        }

        plan.height = items.len() as f64 * step;
        plan
    }

    /// Bordered, tinted box. The box is capped at `paragraphMaxHeight` unless
    /// the overflow policy is `expand`; capped boxes show only the lines that fit.
    fn plan_paragraph(&self, text: &str) -> BlockPlan {
        let blocks = &self.config.blocks;
        let palette = &self.config.palette;
        let padding = blocks.content_padding;
        let inner_width = self.width - 2.0 * padding;
        let style = TextStyle::new(11.0).color(palette.text).line_gap(2.0);

        let mut lines = self.text.break_into_lines(text, inner_width, &style);
        let natural = height_for_lines(lines.len(), &style) + 2.0 * padding;

        let mut plan = BlockPlan::new();
        let box_height = match blocks.paragraph_overflow {
            ParagraphOverflow::Clip if natural > blocks.paragraph_max_height => {
                let fit = lines_fitting(blocks.paragraph_max_height - 2.0 * padding, &style);
                plan.clipped_lines = lines.len() - fit.min(lines.len());
                lines.truncate(fit);
                blocks.paragraph_max_height
            }
            _ => natural,
        };

        plan.rect(
            0.0,
            0.0,
            self.width,
            box_height,
            Some(palette.light),
            Some(Stroke::new(palette.border, 1.0)),
        );
        plan.lines(lines, padding, padding, inner_width, style);
        plan.height = box_height;
        plan
    }

    fn plan_text(&self, text: &str) -> BlockPlan {
        let style = TextStyle::new(11.0).color(self.config.palette.text).line_gap(2.0);
        let mut plan = BlockPlan::new();
        plan.height = plan.text(&self.text, text, 0.0, 0.0, self.width, style);
        plan
    }

    /// `• description [Severity Risk]` in the severity color, wrapped, then
    /// the mitigation indented below it.
    fn plan_risk(&self, severity: &str, description: &str, mitigation: Option<&str>) -> BlockPlan {
        self.plan_headline(
            &format!("{} {} [{} Risk]", BULLET, description, severity),
            TextStyle::new(11.0).bold().color(severity_color(severity)),
            mitigation
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(|m| format!("Mitigation: {}", m)),
        )
    }

    fn plan_numbered_item(&self, index: usize, title: &str, description: Option<&str>) -> BlockPlan {
        self.plan_headline(
            &format!("{}. {}", index, title),
            TextStyle::new(11.0).bold().color(self.config.palette.primary),
            description.map(str::to_string),
        )
    }

    /// A wrapped headline with an optional body indented below it.
    fn plan_headline(&self, headline: &str, style: TextStyle, body: Option<String>) -> BlockPlan {
        let mut plan = BlockPlan::new();
        let mut height = plan.text(&self.text, headline, 0.0, 0.0, self.width, style);
        if let Some(body) = body {
            let body_style = TextStyle::new(10.0).color(self.config.palette.text);
            height += HEADLINE_BODY_GAP;
            height += plan.text(
                &self.text,
                &body,
                HEADLINE_BODY_INDENT,
                height,
                self.width - HEADLINE_BODY_INDENT,
                body_style,
            );
        }
        plan.height = height;
        plan
    }

    fn plan_caption(&self, text: &str) -> BlockPlan {
        let palette = &self.config.palette;
        let style = TextStyle::new(9.0)
            .italic()
            .color(palette.muted)
            .align(TextAlign::Center);
        let gap = 10.0;
        let mut plan = BlockPlan::new();
        plan.line(0.0, 0.0, self.width, 0.0, Stroke::new(palette.border, 0.5));
        let text_height = plan.text(&self.text, text, 0.0, gap, self.width, style);
        plan.height = gap + text_height;
        plan
    }
}

impl Block {
    /// Height this block will occupy at the renderer's width.
    pub fn measure(&self, renderer: &BlockRenderer<'_>) -> f64 {
        renderer.plan(self).height
    }

    /// Draw the block with its top-left corner at (`x`, `y`). Returns the
    /// height consumed, always equal to [`Block::measure`].
    pub fn draw(&self, renderer: &BlockRenderer<'_>, canvas: &mut Canvas, x: f64, y: f64) -> f64 {
        renderer.plan(self).draw(canvas, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DrawOp;
    use crate::model::Answer;

    fn renderer(config: &GeneratorConfig) -> BlockRenderer<'_> {
        BlockRenderer::new(config, config.content_width())
    }

    /// Vertical extent actually painted on the page, from `top`.
    fn painted_extent(canvas: &Canvas, top: f64) -> f64 {
        canvas.pages()[0]
            .ops
            .iter()
            .map(|op| match op {
                DrawOp::Rect { y, height, .. } => y + height,
                DrawOp::Line { y1, y2, .. } => y1.max(*y2),
                DrawOp::Text { lines, .. } => lines
                    .iter()
                    .map(|l| l.y + l.font_size * crate::style::DEFAULT_LINE_HEIGHT)
                    .fold(0.0, f64::max),
                DrawOp::Image { y, height, .. } => y + height,
            })
            .fold(top, f64::max)
            - top
    }

    fn sample_blocks() -> Vec<Block> {
        vec![
            Block::title("Acme Site"),
            Block::FieldList {
                items: vec![
                    Field::new("Client", "Acme Inc"),
                    Field::new("Budget", "12000 MAD"),
                ],
            },
            Block::paragraph("A fairly long description. ".repeat(30)),
            Block::QaCard {
                index: 1,
                question: "Who is the audience?".into(),
                answer: Answer::Text("Parents of toddlers in Casablanca. ".repeat(5)),
            },
            Block::QaCard {
                index: 2,
                question: "Primary color?".into(),
                answer: Answer::colors_from_csv("#ff0000, #00ff00"),
            },
            Block::ColorSwatch {
                hex_colors: vec!["#131313".into(), "not-a-color".into()],
            },
            Block::structured_text("TEMPLATE 1 (PAGE 1: HOME)\nheader:\n  - logo left\ncolor: #fff\n\nplain words"),
            Block::text("Phase one covers discovery and content. ".repeat(12)),
            Block::Risk {
                severity: "High".into(),
                description: "Third-party payment gateway may not support the local cards most customers use".into(),
                mitigation: Some("Integrate CMI as a fallback provider".into()),
            },
            Block::NumberedItem {
                index: 2,
                title: "Payments".into(),
                description: Some("Card payments through a local acquirer. ".repeat(6)),
            },
            Block::caption("Generated on: 2024-03-04"),
        ]
    }

    #[test]
    fn measure_equals_draw_for_every_kind() {
        let config = GeneratorConfig::default();
        let r = renderer(&config);
        for block in sample_blocks() {
            let mut canvas = Canvas::new(595.28, 841.89);
            let measured = block.measure(&r);
            let drawn = block.draw(&r, &mut canvas, 50.0, 100.0);
            assert_eq!(measured, drawn, "{} block", block.kind_name());
            assert!(measured > 0.0, "{} block has no height", block.kind_name());
        }
    }

    #[test]
    fn nothing_is_painted_below_the_measured_height() {
        let config = GeneratorConfig::default();
        let r = renderer(&config);
        for block in sample_blocks() {
            let mut canvas = Canvas::new(595.28, 841.89);
            let height = block.draw(&r, &mut canvas, 50.0, 100.0);
            assert!(
                painted_extent(&canvas, 100.0) <= height + 1e-6,
                "{} block paints past its height",
                block.kind_name()
            );
        }
    }

    #[test]
    fn field_list_height_formula() {
        let config = GeneratorConfig::default();
        let r = renderer(&config);
        let items = (0..5)
            .map(|i| Field::new(format!("Label {}", i), "x".repeat(400)))
            .collect();
        let height = Block::FieldList { items }.measure(&r);
        assert_eq!(height, 5.0 * (16.0 + 6.0));
    }

    #[test]
    fn long_field_values_are_truncated() {
        let config = GeneratorConfig::default();
        let r = renderer(&config);
        let block = Block::FieldList {
            items: vec![Field::new("Description", "word ".repeat(200))],
        };
        let mut canvas = Canvas::new(595.28, 841.89);
        block.draw(&r, &mut canvas, 50.0, 0.0);
        let value = canvas.pages()[0].text_lines().last().unwrap().clone();
        assert!(value.text.ends_with('\u{2026}'));
        assert!(value.x + value.width <= 50.0 + r.width() + 1e-6);
    }

    #[test]
    fn paragraph_box_is_clamped_by_default() {
        let config = GeneratorConfig::default();
        let r = renderer(&config);
        let plan = r.plan(&Block::paragraph("Lorem ipsum dolor sit amet. ".repeat(200)));
        assert_eq!(plan.height, 250.0);
        assert!(plan.clipped_lines > 0);
    }

    #[test]
    fn short_paragraph_uses_natural_height() {
        let config = GeneratorConfig::default();
        let r = renderer(&config);
        let plan = r.plan(&Block::paragraph("Short."));
        assert!((plan.height - (11.0 * 1.2 + 30.0)).abs() < 1e-9);
        assert_eq!(plan.clipped_lines, 0);
    }

    #[test]
    fn paragraph_expands_when_configured() {
        let mut config = GeneratorConfig::default();
        config.blocks.paragraph_overflow = ParagraphOverflow::Expand;
        let r = renderer(&config);
        let plan = r.plan(&Block::paragraph("Lorem ipsum dolor sit amet. ".repeat(200)));
        assert!(plan.height > 250.0);
        assert_eq!(plan.clipped_lines, 0);
    }

    #[test]
    fn empty_field_list_has_no_height() {
        let config = GeneratorConfig::default();
        assert_eq!(Block::FieldList { items: vec![] }.measure(&renderer(&config)), 0.0);
    }

    #[test]
    fn risk_keeps_description_and_mitigation() {
        let config = GeneratorConfig::default();
        let r = renderer(&config);
        let block = Block::Risk {
            severity: "High".into(),
            description: "Third-party payment gateway may not support the local cards used by most customers in the region".into(),
            mitigation: Some("Integrate CMI as a fallback provider".into()),
        };
        let mut canvas = Canvas::new(595.28, 841.89);
        block.draw(&r, &mut canvas, 50.0, 0.0);
        let page = &canvas.pages()[0];
        assert!(page.contains_text("[High Risk]"));
        assert!(page.contains_text("Integrate CMI as a fallback provider"));
        assert!(!page.text_lines().any(|l| l.text.ends_with('\u{2026}')));

        let red = Color::hex_or("#ef4444", Color::BLACK);
        assert!(page.ops.iter().any(|op| matches!(
            op,
            DrawOp::Text { color, lines } if *color == red && lines[0].text.starts_with(BULLET)
        )));
        let mitigation = page
            .text_lines()
            .find(|l| l.text.starts_with("Mitigation:"))
            .unwrap();
        assert_eq!(mitigation.x, 50.0 + HEADLINE_BODY_INDENT);
    }

    #[test]
    fn numbered_item_without_description_is_one_line() {
        let config = GeneratorConfig::default();
        let r = renderer(&config);
        let plan = r.plan(&Block::NumberedItem {
            index: 3,
            title: "Hosting".into(),
            description: None,
        });
        assert_eq!(plan.height, TextStyle::new(11.0).line_height_pt());
        let mut canvas = Canvas::new(595.28, 841.89);
        plan.draw(&mut canvas, 50.0, 0.0);
        assert!(canvas.pages()[0].contains_text("3. Hosting"));
    }

    #[test]
    fn severity_colors() {
        assert_eq!(severity_color("high"), Color::hex_or("#ef4444", Color::BLACK));
        assert_eq!(severity_color("Medium"), Color::hex_or("#f59e0b", Color::BLACK));
        assert_eq!(severity_color("Unrated"), Color::hex_or("#10b981", Color::BLACK));
    }

    #[test]
    fn text_block_is_never_clipped() {
        let config = GeneratorConfig::default();
        let r = renderer(&config);
        let text = "Lorem ipsum dolor sit amet. ".repeat(200);
        let plan = r.plan(&Block::text(text.clone()));
        let style = TextStyle::new(11.0).line_gap(2.0);
        assert_eq!(plan.height, r.text_layout().measure_height(&text, r.width(), &style));
        assert!(plan.height > 250.0);
        assert_eq!(plan.clipped_lines, 0);
    }

    #[test]
    fn section_header_has_fixed_height() {
        let config = GeneratorConfig::default();
        let plan = renderer(&config).plan_section_header(&"Very long section name ".repeat(20));
        assert_eq!(plan.height, SECTION_HEADER_HEIGHT);
    }
}
