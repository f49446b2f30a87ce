//! # Document Assembly
//!
//! Content never lands on an infinitely tall canvas that is sliced into pages
//! afterwards. The assembler opens a page with a known usable height and, for
//! every block, asks whether it fits before drawing it:
//!
//! 1. Each section that starts a new page gets the full banner header.
//! 2. The section sub-header is kept with the first block of the section.
//! 3. A block that does not fit moves, whole, to a continuation page which
//!    gets the compact running header.
//! 4. Once every page exists, a second pass stamps `Page N of M` footers.
//!
//! A document is assembled by a single call from start to finish. Nothing is
//! shared between calls except the configuration and the logo fetcher, so
//! independent documents can be generated on separate threads with separate
//! assemblers.

pub mod blocks;
pub mod chrome;
pub mod page_break;
pub mod qa;
pub mod structured;

use std::fmt;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::canvas::Canvas;
use crate::config::GeneratorConfig;
use crate::error::{PagewrightError, Result};
use crate::model::{DocumentSpec, Section};

use blocks::{BlockPlan, BlockRenderer};
use chrome::{HeaderKind, HeaderRenderer, HttpFetcher, ImageFetcher};
use page_break::{decide_break, BreakDecision};

/// The current drawing position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub x: f64,
    pub y: f64,
    pub page_index: usize,
}

/// Vertical bounds of the content area on one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// First y below the page header.
    pub content_top: f64,
    /// Last y above the bottom margin.
    pub content_bottom: f64,
}

impl PageGeometry {
    pub fn usable_height(&self) -> f64 {
        self.content_bottom - self.content_top
    }

    pub fn remaining(&self, y: f64) -> f64 {
        (self.content_bottom - y).max(0.0)
    }
}

/// Where one block ended up.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPlacement {
    pub section: usize,
    pub block: usize,
    pub page_index: usize,
    pub y: f64,
    pub height: f64,
}

/// Pages drawn but not yet serialized.
pub struct LaidOutDocument {
    pub canvas: Canvas,
    pub placements: Vec<BlockPlacement>,
}

impl LaidOutDocument {
    pub fn page_count(&self) -> usize {
        self.canvas.page_count()
    }
}

/// A finished PDF and what the caller needs to file it.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub document_id: Uuid,
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub placements: Vec<BlockPlacement>,
}

impl RenderedDocument {
    /// Write the bytes to `path`. The file handle is closed on every path.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.bytes).map_err(|e| PagewrightError::io(path, e))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NotStarted,
    HeaderDrawn { section: usize },
    ContentDrawn { section: usize },
    Finalizing,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::NotStarted => write!(f, "not started"),
            Phase::HeaderDrawn { section } => write!(f, "section {} header drawn", section),
            Phase::ContentDrawn { section } => write!(f, "section {} content drawn", section),
            Phase::Finalizing => write!(f, "finalizing"),
            Phase::Done => write!(f, "done"),
        }
    }
}

/// Lays out a [`DocumentSpec`] page by page and renders it to PDF.
pub struct DocumentAssembler {
    config: GeneratorConfig,
    fetcher: Box<dyn ImageFetcher>,
}

impl DocumentAssembler {
    pub fn new(config: GeneratorConfig) -> Self {
        let timeout = Duration::from_millis(config.brand.logo_timeout_ms);
        Self {
            config,
            fetcher: Box::new(HttpFetcher::new(timeout)),
        }
    }

    /// Replace the logo fetcher.
    pub fn with_fetcher(mut self, fetcher: Box<dyn ImageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Draw every section onto a canvas and stamp the footers.
    pub fn layout(&self, spec: &DocumentSpec) -> Result<LaidOutDocument> {
        self.config.validate()?;
        let mut run = Run::new(&self.config, &*self.fetcher, spec);
        for (index, section) in spec.sections.iter().enumerate() {
            run.section(index, section);
        }
        run.finish()
    }

    /// Lay out and serialize `spec`.
    pub fn generate(&self, spec: &DocumentSpec) -> Result<RenderedDocument> {
        let document_id = Uuid::new_v4();
        let generated_at = Utc::now();
        info!(
            "generating document {} ({} sections, {} blocks)",
            document_id,
            spec.sections.len(),
            spec.block_count()
        );

        let laid_out = self.layout(spec)?;
        let page_count = laid_out.page_count();

        let mut metadata = spec.metadata.clone();
        metadata.created_at.get_or_insert(generated_at);
        let bytes = laid_out.canvas.finalize(&metadata);
        debug!("assembler: {} -> {}", Phase::Finalizing, Phase::Done);

        info!(
            "generated document {}: {} pages, {} bytes",
            document_id,
            page_count,
            bytes.len()
        );
        Ok(RenderedDocument {
            bytes,
            page_count,
            document_id,
            title: spec.metadata.display_title().to_string(),
            generated_at,
            placements: laid_out.placements,
        })
    }
}

/// State of one generation call.
struct Run<'a> {
    config: &'a GeneratorConfig,
    headers: HeaderRenderer<'a>,
    blocks: BlockRenderer<'a>,
    document_title: &'a str,
    /// Title shown in the headers of the section being drawn.
    title: &'a str,
    canvas: Canvas,
    cursor: Cursor,
    geometry: PageGeometry,
    /// True until something is drawn below the page header.
    page_fresh: bool,
    phase: Phase,
    placements: Vec<BlockPlacement>,
}

impl<'a> Run<'a> {
    fn new(config: &'a GeneratorConfig, fetcher: &'a dyn ImageFetcher, spec: &'a DocumentSpec) -> Self {
        let (width, height) = config.page_dimensions();
        let margin = &config.page.margin;
        Self {
            config,
            headers: HeaderRenderer::new(config, fetcher),
            blocks: BlockRenderer::new(config, config.content_width()),
            document_title: spec.metadata.display_title(),
            title: spec.metadata.display_title(),
            canvas: Canvas::new(width, height),
            cursor: Cursor {
                x: margin.left,
                y: margin.top,
                page_index: 0,
            },
            geometry: PageGeometry {
                content_top: margin.top,
                content_bottom: height - margin.bottom,
            },
            page_fresh: true,
            phase: Phase::NotStarted,
            placements: Vec::new(),
        }
    }

    fn enter(&mut self, next: Phase) {
        debug!("assembler: {} -> {}", self.phase, next);
        self.phase = next;
    }

    /// Draw `kind` on the current page and reset the cursor below it.
    fn open_page(&mut self, kind: HeaderKind) {
        let header_height = self.headers.render_header(&mut self.canvas, kind, self.title);
        let top = self.config.page.margin.top + header_height;
        self.cursor = Cursor {
            x: self.config.page.margin.left,
            y: top,
            page_index: self.canvas.current_page(),
        };
        self.geometry.content_top = top;
        self.page_fresh = true;
    }

    fn continuation_header(&self) -> HeaderKind {
        if self.config.header.compact_continuation {
            HeaderKind::Compact
        } else {
            HeaderKind::Banner
        }
    }

    /// Usable height of a page opened by a break.
    fn continuation_usable_height(&self) -> f64 {
        PageGeometry {
            content_top: self.config.page.margin.top + self.headers.height(self.continuation_header()),
            content_bottom: self.geometry.content_bottom,
        }
        .usable_height()
    }

    fn break_page(&mut self, needed: f64) {
        debug!(
            "page break after page {}: needed {:.1}, remaining {:.1}",
            self.cursor.page_index,
            needed,
            self.geometry.remaining(self.cursor.y)
        );
        self.canvas.new_page();
        self.open_page(self.continuation_header());
    }

    /// Make room for `needed` points. Returns false when the block will
    /// overflow the page regardless.
    fn ensure_space(&mut self, needed: f64) -> bool {
        let remaining = self.geometry.remaining(self.cursor.y);
        match decide_break(remaining, needed, self.page_fresh) {
            BreakDecision::Place => true,
            BreakDecision::MoveToNextPage => {
                self.break_page(needed);
                needed <= self.geometry.remaining(self.cursor.y) + 1e-6
            }
            BreakDecision::Overflow => false,
        }
    }

    fn section(&mut self, index: usize, section: &'a Section) {
        self.title = section.banner_title.as_deref().unwrap_or(self.document_title);
        if index == 0 {
            self.open_page(HeaderKind::Banner);
        } else if section.start_on_new_page {
            self.canvas.new_page();
            self.open_page(HeaderKind::Banner);
        }

        let header = (!section.title.is_empty())
            .then(|| self.blocks.plan_section_header(&section.title));
        let first = section.blocks.first().map(|b| self.blocks.plan(b));

        if let Some(header) = header {
            // Keep the sub-header with the first block when both fit here or
            // on the page a break would open.
            let spacing = self.config.blocks.block_spacing;
            let with_next = header.height
                + spacing
                + first.as_ref().map(|p| p.height).unwrap_or(0.0);
            if with_next <= self.geometry.remaining(self.cursor.y)
                || with_next <= self.continuation_usable_height()
            {
                self.ensure_space(with_next);
            } else {
                self.ensure_space(header.height);
            }
            self.draw_plan(&header);
            self.advance(header.height);
        }
        self.enter(Phase::HeaderDrawn { section: index });

        let mut first = first;
        for (block_index, block) in section.blocks.iter().enumerate() {
            let plan = match first.take() {
                Some(plan) => plan,
                None => self.blocks.plan(block),
            };
            if plan.clipped_lines > 0 {
                warn!(
                    "section {} block {}: paragraph clipped, {} lines dropped",
                    index, block_index, plan.clipped_lines
                );
            }
            if !self.ensure_space(plan.height) {
                warn!(
                    "section {} block {} ({}) is {:.1}pt tall, more than a page holds; it overflows page {}",
                    index,
                    block_index,
                    block.kind_name(),
                    plan.height,
                    self.cursor.page_index
                );
            }
            let y = self.cursor.y;
            let height = self.draw_plan(&plan);
            self.placements.push(BlockPlacement {
                section: index,
                block: block_index,
                page_index: self.cursor.page_index,
                y,
                height,
            });
            self.advance(height);
        }
        self.enter(Phase::ContentDrawn { section: index });
    }

    fn draw_plan(&mut self, plan: &BlockPlan) -> f64 {
        self.page_fresh = false;
        plan.draw(&mut self.canvas, self.cursor.x, self.cursor.y)
    }

    fn advance(&mut self, height: f64) {
        self.cursor.y += height + self.config.blocks.block_spacing;
    }

    fn finish(mut self) -> Result<LaidOutDocument> {
        if self.phase == Phase::NotStarted {
            // No sections: still a one-page document with its banner.
            self.open_page(HeaderKind::Banner);
        }
        self.enter(Phase::Finalizing);
        if self.config.footer.enabled {
            self.headers.stamp_footers(&mut self.canvas)?;
        }
        Ok(LaidOutDocument {
            canvas: self.canvas,
            placements: self.placements,
        })
    }
}
