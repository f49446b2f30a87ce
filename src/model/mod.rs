//! # Document Model
//!
//! The input to the layout engine: an ordered list of [`Section`]s, each an
//! ordered list of typed [`Block`]s, plus metadata for the PDF Info
//! dictionary. The model is plain data. It is built once per generation call
//! (from JSON or by the builders in [`records`]) and never mutated while the
//! assembler walks it.
//!
//! Block kinds are decided when the document is built. In particular a Q&A answer
//! is either text or a list of swatch colors up front, so nothing downstream
//! has to guess by sniffing for `#` in the answer string.

pub mod records;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A complete document ready for layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSpec {
    #[serde(default)]
    pub metadata: Metadata,
    pub sections: Vec<Section>,
}

impl DocumentSpec {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            sections: Vec::new(),
        }
    }

    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Total number of blocks across all sections.
    pub fn block_count(&self) -> usize {
        self.sections.iter().map(|s| s.blocks.len()).sum()
    }
}

/// Document metadata embedded in the PDF Info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    /// Written as the Info `/CreationDate`. Omitted when `None`, which keeps
    /// repeated renders byte-identical.
    pub created_at: Option<DateTime<Utc>>,
}

impl Metadata {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// The title shown in page headers.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Document")
    }
}

/// A named group of blocks, introduced by a sub-header bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    /// Start this section on a fresh page with the full banner. When false the
    /// section flows on after the previous one.
    #[serde(default = "default_true")]
    pub start_on_new_page: bool,
    /// Title shown in the page banner (and the running header after it)
    /// instead of the document title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_title: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
            start_on_new_page: true,
            banner_title: None,
        }
    }

    pub fn block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Flow this section on from the previous one.
    pub fn continued(mut self) -> Self {
        self.start_on_new_page = false;
        self
    }

    pub fn with_banner(mut self, title: impl Into<String>) -> Self {
        self.banner_title = Some(title.into());
        self
    }
}

/// One labelled value in a [`Block::FieldList`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub label: String,
    pub value: String,
}

impl Field {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A content unit. Every variant can report its height for a given width
/// before it is drawn (see `layout::blocks`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Title {
        text: String,
    },
    /// Bulleted `label: value` lines, one line per item.
    FieldList {
        items: Vec<Field>,
    },
    /// Long text inside a bordered, tinted box.
    Paragraph {
        text: String,
    },
    /// Unboxed body text. Wraps to any height and is never clipped.
    Text {
        text: String,
    },
    /// A numbered question card.
    QaCard {
        index: usize,
        question: String,
        answer: Answer,
    },
    ColorSwatch {
        #[serde(rename = "hexColors")]
        hex_colors: Vec<String>,
    },
    /// Semi-structured text formatted line by line.
    RawStructuredText {
        lines: Vec<String>,
    },
    /// A risk line in its severity color with an indented mitigation.
    Risk {
        severity: String,
        description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mitigation: Option<String>,
    },
    /// `N. title` in bold with an indented description below.
    NumberedItem {
        index: usize,
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// A separator rule followed by small centred italic text.
    Caption {
        text: String,
    },
}

impl Block {
    pub fn title(text: impl Into<String>) -> Self {
        Block::Title { text: text.into() }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph { text: text.into() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Block::Text { text: text.into() }
    }

    pub fn caption(text: impl Into<String>) -> Self {
        Block::Caption { text: text.into() }
    }

    /// Split a raw text dump into lines for [`Block::RawStructuredText`].
    pub fn structured_text(raw: &str) -> Self {
        Block::RawStructuredText {
            lines: raw.lines().map(str::to_string).collect(),
        }
    }

    /// Short name used in logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Block::Title { .. } => "title",
            Block::FieldList { .. } => "fieldList",
            Block::Paragraph { .. } => "paragraph",
            Block::Text { .. } => "text",
            Block::QaCard { .. } => "qaCard",
            Block::ColorSwatch { .. } => "colorSwatch",
            Block::RawStructuredText { .. } => "rawStructuredText",
            Block::Risk { .. } => "risk",
            Block::NumberedItem { .. } => "numberedItem",
            Block::Caption { .. } => "caption",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnswerKind {
    Text,
    ColorSwatchList,
}

/// The body of a Q&A card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Answer {
    Text(String),
    ColorSwatchList(Vec<String>),
}

impl Answer {
    pub fn kind(&self) -> AnswerKind {
        match self {
            Answer::Text(_) => AnswerKind::Text,
            Answer::ColorSwatchList(_) => AnswerKind::ColorSwatchList,
        }
    }

    /// Split a comma-separated color answer into trimmed, non-empty entries.
    pub fn colors_from_csv(raw: &str) -> Self {
        Answer::ColorSwatchList(
            raw.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_deserialize_by_type_tag() {
        let json = r##"{
            "metadata": { "title": "Brief" },
            "sections": [{
                "title": "Branding",
                "startOnNewPage": false,
                "blocks": [
                    { "type": "title", "text": "Acme" },
                    { "type": "fieldList", "items": [{ "label": "Client", "value": "Acme Inc" }] },
                    { "type": "colorSwatch", "hexColors": ["#ff0000"] },
                    { "type": "qaCard", "index": 1, "question": "Primary color?",
                      "answer": { "kind": "colorSwatchList", "value": ["#ff0000", "#00ff00"] } },
                    { "type": "rawStructuredText", "lines": ["header:", "- item"] }
                ]
            }]
        }"##;
        let spec: DocumentSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.metadata.display_title(), "Brief");
        let section = &spec.sections[0];
        assert!(!section.start_on_new_page);
        assert_eq!(section.blocks.len(), 5);
        match &section.blocks[3] {
            Block::QaCard { answer, .. } => assert_eq!(answer.kind(), AnswerKind::ColorSwatchList),
            other => panic!("expected a Q&A card, got {:?}", other),
        }
    }

    #[test]
    fn sections_start_on_new_page_by_default() {
        let section: Section = serde_json::from_str(r#"{ "title": "Info" }"#).unwrap();
        assert!(section.start_on_new_page);
        assert!(section.blocks.is_empty());
        assert!(section.banner_title.is_none());
    }

    #[test]
    fn risk_blocks_deserialize_without_mitigation() {
        let json = r#"{ "type": "risk", "severity": "Low", "description": "Scope creep" }"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(
            block,
            Block::Risk {
                severity: "Low".into(),
                description: "Scope creep".into(),
                mitigation: None
            }
        );
    }

    #[test]
    fn color_answers_are_split_and_trimmed() {
        let answer = Answer::colors_from_csv(" #ff0000, #00ff00 ,,");
        assert_eq!(
            answer,
            Answer::ColorSwatchList(vec!["#ff0000".into(), "#00ff00".into()])
        );
    }

    #[test]
    fn structured_text_splits_lines() {
        match Block::structured_text("a:\n- b\r\nc") {
            Block::RawStructuredText { lines } => assert_eq!(lines, vec!["a:", "- b", "c"]),
            _ => unreachable!(),
        }
    }

    #[test]
    fn a4_dimensions() {
        assert_eq!(PageSize::A4.dimensions(), (595.28, 841.89));
        assert_eq!(Edges::uniform(50.0).horizontal(), 100.0);
    }
}
