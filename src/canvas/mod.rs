//! # Canvas Primitives
//!
//! A fixed-size, multi-page drawing surface. Coordinates are in points with
//! the origin at the top-left of the page and y growing downwards; the PDF
//! writer flips them on output.
//!
//! Pages are buffered until [`Canvas::finalize`], so the caller can go back to
//! any earlier page with [`Canvas::switch_to_page`] and draw more (the footer
//! pass relies on this). `finalize` consumes the canvas, so drawing after
//! finalization does not compile.
//!
//! The canvas never moves a cursor of its own. Text calls return the height
//! they consumed and the caller decides where the next thing goes.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use thiserror::Error;

use crate::font::StandardFont;
use crate::image_loader::{decode_image_bytes, ImageLoadError, LoadedImage};
use crate::model::Metadata;
use crate::pdf::PdfWriter;
use crate::style::{Color, TextAlign, TextStyle};
use crate::text::{height_for_lines, BrokenLine, TextLayout};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    #[error("page {index} does not exist (document has {page_count} pages)")]
    NoSuchPage { index: usize, page_count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

impl Stroke {
    pub fn new(color: Color, width: f64) -> Self {
        Self { color, width }
    }
}

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x: f64,
    /// Top of the line box.
    pub y: f64,
    /// Absolute y of the baseline.
    pub baseline: f64,
    pub text: String,
    pub font: StandardFont,
    pub font_size: f64,
    pub width: f64,
}

#[derive(Debug, Clone)]
pub enum DrawOp {
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
        lines: Vec<TextLine>,
        color: Color,
    },
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        image: Arc<LoadedImage>,
    },
}

/// A buffered page and everything drawn on it, in paint order.
#[derive(Debug, Clone)]
pub struct CanvasPage {
    pub width: f64,
    pub height: f64,
    pub ops: Vec<DrawOp>,
}

impl CanvasPage {
    fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// All text on the page, one entry per line, in paint order.
    pub fn text_lines(&self) -> impl Iterator<Item = &TextLine> {
        self.ops.iter().flat_map(|op| {
            let lines: &[TextLine] = match op {
                DrawOp::Text { lines, .. } => lines,
                _ => &[],
            };
            lines.iter()
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.text_lines().any(|l| l.text.contains(needle))
    }

    pub fn image_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count()
    }
}

pub struct Canvas {
    width: f64,
    height: f64,
    pages: Vec<CanvasPage>,
    current: usize,
    text: TextLayout,
    images: HashMap<u64, Arc<LoadedImage>>,
}

impl Canvas {
    /// A canvas with one empty page.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            pages: vec![CanvasPage::new(width, height)],
            current: 0,
            text: TextLayout::default(),
            images: HashMap::new(),
        }
    }

    pub fn page_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn text_layout(&self) -> &TextLayout {
        &self.text
    }

    fn page_mut(&mut self) -> &mut CanvasPage {
        let index = self.current;
        &mut self.pages[index]
    }

    pub fn draw_rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    ) {
        if fill.is_none() && stroke.is_none() {
            return;
        }
        self.page_mut().ops.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        });
    }

    pub fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: Stroke) {
        self.page_mut().ops.push(DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
        });
    }

    /// Wrap `text` to `width` and draw it with its top at `y`. Returns the
    /// height consumed, which always equals `TextLayout::measure_height`.
    pub fn draw_text(&mut self, text: &str, x: f64, y: f64, width: f64, style: &TextStyle) -> f64 {
        let lines = self.text.break_into_lines(text, width, style);
        self.draw_lines(&lines, x, y, width, style)
    }

    /// Draw lines that were already broken (by a block plan) without
    /// re-wrapping them.
    pub fn draw_lines(
        &mut self,
        lines: &[BrokenLine],
        x: f64,
        y: f64,
        width: f64,
        style: &TextStyle,
    ) -> f64 {
        if lines.is_empty() {
            return 0.0;
        }
        let font = self.text.fonts().resolve(style.font_weight, style.is_italic());
        let line_height = style.line_height_pt();
        let baseline_offset = font.metrics().baseline_offset(style.font_size, line_height);

        let positioned: Vec<TextLine> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.text.is_empty())
            .map(|(i, line)| {
                let top = y + i as f64 * (line_height + style.line_gap);
                let line_x = match style.align {
                    TextAlign::Left => x,
                    TextAlign::Center => x + (width - line.width) / 2.0,
                    TextAlign::Right => x + width - line.width,
                };
                TextLine {
                    x: line_x,
                    y: top,
                    baseline: top + baseline_offset,
                    text: line.text.clone(),
                    font,
                    font_size: style.font_size,
                    width: line.width,
                }
            })
            .collect();

        if !positioned.is_empty() {
            self.page_mut().ops.push(DrawOp::Text {
                lines: positioned,
                color: style.color,
            });
        }
        height_for_lines(lines.len(), style)
    }

    /// Decode `bytes` and draw the image scaled into the given box.
    ///
    /// Malformed bytes are an error; nothing is drawn and the caller chooses a
    /// fallback. Identical byte buffers are decoded once and shared.
    pub fn draw_image(
        &mut self,
        bytes: &[u8],
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), ImageLoadError> {
        let image = self.decoded(bytes)?;
        self.place_image(image, x, y, width, height);
        Ok(())
    }

    /// Like [`Canvas::draw_image`], but keeps the image's aspect ratio: it is
    /// scaled to the largest size that fits the box and centered in it.
    pub fn draw_image_fitted(
        &mut self,
        bytes: &[u8],
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), ImageLoadError> {
        let image = self.decoded(bytes)?;
        let ratio = image.aspect_ratio();
        let (w, h) = if width * ratio <= height {
            (width, width * ratio)
        } else {
            (height / ratio, height)
        };
        self.place_image(image, x + (width - w) / 2.0, y + (height - h) / 2.0, w, h);
        Ok(())
    }

    fn decoded(&mut self, bytes: &[u8]) -> Result<Arc<LoadedImage>, ImageLoadError> {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        let key = hasher.finish();

        if let Some(image) = self.images.get(&key) {
            return Ok(Arc::clone(image));
        }
        let image = Arc::new(decode_image_bytes(bytes)?);
        self.images.insert(key, Arc::clone(&image));
        Ok(image)
    }

    /// Draw an already decoded image.
    pub fn place_image(&mut self, image: Arc<LoadedImage>, x: f64, y: f64, width: f64, height: f64) {
        self.page_mut().ops.push(DrawOp::Image {
            x,
            y,
            width,
            height,
            image,
        });
    }

    /// Append a blank page and make it current. Returns its index.
    ///
    /// Headers and footers are the caller's job.
    pub fn new_page(&mut self) -> usize {
        self.pages.push(CanvasPage::new(self.width, self.height));
        self.current = self.pages.len() - 1;
        self.current
    }

    /// Make an existing page current so more can be drawn on it.
    pub fn switch_to_page(&mut self, index: usize) -> Result<(), CanvasError> {
        if index >= self.pages.len() {
            return Err(CanvasError::NoSuchPage {
                index,
                page_count: self.pages.len(),
            });
        }
        self.current = index;
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn pages(&self) -> &[CanvasPage] {
        &self.pages
    }

    /// Serialize every page to PDF bytes. Terminal.
    pub fn finalize(self, metadata: &Metadata) -> Vec<u8> {
        PdfWriter::new().write(&self.pages, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a4() -> Canvas {
        Canvas::new(595.28, 841.89)
    }

    #[test]
    fn starts_with_one_page() {
        let canvas = a4();
        assert_eq!(canvas.page_count(), 1);
        assert_eq!(canvas.current_page(), 0);
    }

    #[test]
    fn draw_text_height_matches_measurement() {
        let mut canvas = a4();
        let style = TextStyle::new(11.0).line_gap(3.0);
        let text = "Measurement and drawing share one wrapping routine. ".repeat(6);
        let measured = canvas.text_layout().measure_height(&text, 300.0, &style);
        let drawn = canvas.draw_text(&text, 50.0, 100.0, 300.0, &style);
        assert_eq!(measured, drawn);
    }

    #[test]
    fn right_aligned_text_ends_at_box_edge() {
        let mut canvas = a4();
        let style = TextStyle::new(12.0).align(TextAlign::Right);
        canvas.draw_text("Title", 50.0, 50.0, 200.0, &style);
        let line = canvas.pages()[0].text_lines().next().unwrap();
        assert!((line.x + line.width - 250.0).abs() < 1e-9);
        assert!(line.baseline > line.y);
    }

    #[test]
    fn switch_to_missing_page_fails() {
        let mut canvas = a4();
        canvas.new_page();
        assert!(canvas.switch_to_page(1).is_ok());
        assert_eq!(
            canvas.switch_to_page(2),
            Err(CanvasError::NoSuchPage {
                index: 2,
                page_count: 2
            })
        );
    }

    #[test]
    fn drawing_goes_to_current_page() {
        let mut canvas = a4();
        canvas.new_page();
        canvas.switch_to_page(0).unwrap();
        canvas.draw_text("first", 0.0, 0.0, 100.0, &TextStyle::new(10.0));
        assert!(canvas.pages()[0].contains_text("first"));
        assert!(!canvas.pages()[1].contains_text("first"));
    }

    #[test]
    fn malformed_image_is_an_error() {
        let mut canvas = a4();
        assert!(canvas.draw_image(b"not an image", 0.0, 0.0, 10.0, 10.0).is_err());
        assert_eq!(canvas.pages()[0].image_count(), 0);
    }

    #[test]
    fn identical_images_share_one_decode() {
        let mut canvas = a4();
        let png = crate::image_loader::tests::png_bytes(2, 2, 255);
        canvas.draw_image(&png, 0.0, 0.0, 10.0, 10.0).unwrap();
        canvas.new_page();
        canvas.draw_image(&png, 0.0, 0.0, 10.0, 10.0).unwrap();
        assert_eq!(canvas.images.len(), 1);
    }

    #[test]
    fn fitted_image_keeps_its_aspect_ratio() {
        let mut canvas = a4();
        let wide = crate::image_loader::tests::png_bytes(30, 4, 255);
        canvas.draw_image_fitted(&wide, 50.0, 40.0, 120.0, 40.0).unwrap();
        let tall = crate::image_loader::tests::png_bytes(2, 4, 255);
        canvas.draw_image_fitted(&tall, 50.0, 40.0, 120.0, 40.0).unwrap();
        let boxes: Vec<(f64, f64, f64, f64)> = canvas.pages()[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { x, y, width, height, .. } => Some((*x, *y, *width, *height)),
                _ => None,
            })
            .collect();
        let close = |a: (f64, f64, f64, f64), b: (f64, f64, f64, f64)| {
            [a.0 - b.0, a.1 - b.1, a.2 - b.2, a.3 - b.3]
                .iter()
                .all(|d| d.abs() < 1e-6)
        };
        assert!(close(boxes[0], (50.0, 52.0, 120.0, 16.0)), "{:?}", boxes[0]);
        assert!(close(boxes[1], (100.0, 40.0, 20.0, 40.0)), "{:?}", boxes[1]);
    }

    #[test]
    fn finalize_produces_pdf() {
        let mut canvas = a4();
        canvas.draw_rect(0.0, 0.0, 10.0, 10.0, Some(Color::BLACK), None);
        let bytes = canvas.finalize(&Metadata::default());
        assert!(bytes.starts_with(b"%PDF-1.7"));
    }
}
