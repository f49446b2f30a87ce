//! # Pagewright
//!
//! A flowing PDF layout engine for project briefs, Q&A sheets and analysis
//! reports.
//!
//! Content is assembled page by page: every block is measured before it is
//! drawn, and a block that does not fit in the space left on the page moves
//! whole to the next one. Measuring and drawing share one layout plan, so the
//! height used for a page-break decision is exactly the height drawn.
//!
//! ## Architecture
//!
//! ```text
//! Records / JSON
//!       ↓
//!   [model]    sections and typed blocks
//!       ↓
//!   [layout]   page-break policy, headers, block renderers, footers
//!       ↓
//!   [canvas]   pages of draw operations
//!       ↓
//!   [pdf]      PDF 1.7 bytes
//!       ↓
//!   [store]    uploads directory
//! ```

pub mod canvas;
pub mod config;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod store;
pub mod style;
pub mod text;

use chrono::{DateTime, Utc};

pub use config::GeneratorConfig;
pub use error::{PagewrightError, Result};
pub use layout::{DocumentAssembler, RenderedDocument};
pub use model::records::{AnalysisBundle, DetailedReportBundle, ProjectBundle};
pub use model::{Block, DocumentSpec, Section};
pub use store::{PdfStore, StoredDocument};

/// What a JSON input describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A ready-made [`DocumentSpec`].
    Document,
    /// A [`ProjectBundle`]: project, questions and optional template.
    Project,
    /// An [`AnalysisBundle`]: project plus AI analysis.
    Analysis,
    /// A [`DetailedReportBundle`]: project plus optional long-form analysis.
    DetailedAnalysis,
}

impl InputKind {
    /// Parse `json` and build the document it describes.
    pub fn to_spec(self, json: &str, generated_at: DateTime<Utc>) -> Result<DocumentSpec> {
        Ok(match self {
            InputKind::Document => serde_json::from_str(json)?,
            InputKind::Project => {
                serde_json::from_str::<ProjectBundle>(json)?.to_document(generated_at)
            }
            InputKind::Analysis => {
                serde_json::from_str::<AnalysisBundle>(json)?.to_document(generated_at)
            }
            InputKind::DetailedAnalysis => {
                serde_json::from_str::<DetailedReportBundle>(json)?.to_document(generated_at)
            }
        })
    }

    /// Fill footer slots the configuration leaves empty with this kind's
    /// defaults.
    pub fn apply_footer_defaults(self, config: &mut GeneratorConfig) {
        let footer = &mut config.footer;
        match self {
            InputKind::Document | InputKind::Project => {}
            InputKind::Analysis => {
                footer
                    .left
                    .get_or_insert_with(|| model::records::REPORT_TAGLINE.to_string());
                footer
                    .right
                    .get_or_insert_with(|| model::records::REPORT_NOTICE.to_string());
            }
            InputKind::DetailedAnalysis => {
                footer
                    .left
                    .get_or_insert_with(|| model::records::REPORT_TAGLINE.to_string());
                footer
                    .page_label_prefix
                    .get_or_insert_with(|| model::records::DETAILED_PAGE_LABEL.to_string());
            }
        }
    }
}

/// Render a document to PDF.
///
/// The logo, if configured, is fetched over the network with the configured
/// timeout. Use [`DocumentAssembler::with_fetcher`] to supply it differently.
pub fn generate(spec: &DocumentSpec, config: &GeneratorConfig) -> Result<RenderedDocument> {
    DocumentAssembler::new(config.clone()).generate(spec)
}

/// Render a document described as JSON to PDF.
pub fn generate_json(json: &str, config: &GeneratorConfig) -> Result<RenderedDocument> {
    let spec = InputKind::Document.to_spec(json, Utc::now())?;
    generate(&spec, config)
}
