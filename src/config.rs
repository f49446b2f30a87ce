//! Generator configuration.
//!
//! Every field has a default, so a JSON config file only needs the values it
//! changes. Defaults reproduce the Maya Business Club brief layout: A4, 50pt
//! margins, a 120pt dark banner and a 40pt light running header.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PagewrightError, Result};
use crate::model::{Edges, PageSize};
use crate::style::{Color, Palette};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    pub page: PageConfig,
    pub header: HeaderConfig,
    pub brand: BrandConfig,
    pub footer: FooterConfig,
    pub blocks: BlockConfig,
    pub palette: Palette,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageConfig {
    pub size: PageSize,
    pub margin: Edges,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margin: Edges::uniform(50.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderConfig {
    /// Height of the full banner drawn at the top of each section's first page.
    pub banner_height: f64,
    /// Height of the running header on continuation pages.
    pub compact_height: f64,
    /// Use the compact header on continuation pages instead of repeating the banner.
    pub compact_continuation: bool,
    pub banner_background: Color,
    pub banner_text: Color,
    pub compact_background: Color,
    pub compact_text: Color,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            banner_height: 120.0,
            compact_height: 40.0,
            compact_continuation: true,
            banner_background: Color::hex_or("#131313", Color::BLACK),
            banner_text: Color::WHITE,
            compact_background: Color::hex_or("#f5f5f5", Color::WHITE),
            compact_text: Color::hex_or("#333333", Color::BLACK),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrandConfig {
    pub name: String,
    pub tagline: Option<String>,
    /// `http(s)://` URL, data URI or file path. `None` skips the logo box.
    pub logo_url: Option<String>,
    pub logo_timeout_ms: u64,
    pub logo_width: f64,
    pub logo_height: f64,
    pub logo_fallback_text: String,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            name: "Maya Business Club".to_string(),
            tagline: None,
            logo_url: None,
            logo_timeout_ms: 5000,
            logo_width: 120.0,
            logo_height: 40.0,
            logo_fallback_text: "logo unavailable".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FooterConfig {
    pub enabled: bool,
    pub left: Option<String>,
    pub right: Option<String>,
    /// Text put before `Page N of M`, e.g. `Detailed Report - Page 1 of 4`.
    pub page_label_prefix: Option<String>,
    pub font_size: f64,
}

impl Default for FooterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            left: None,
            right: None,
            page_label_prefix: None,
            font_size: 9.0,
        }
    }
}

impl FooterConfig {
    pub fn page_label(&self, page_number: usize, total_pages: usize) -> String {
        match self.page_label_prefix.as_deref().filter(|p| !p.is_empty()) {
            Some(prefix) => format!("{} - Page {} of {}", prefix, page_number, total_pages),
            None => format!("Page {} of {}", page_number, total_pages),
        }
    }
}

/// What to do with a paragraph whose box would exceed `paragraphMaxHeight`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParagraphOverflow {
    /// Cap the box at the maximum height and drop the lines that do not fit.
    #[default]
    Clip,
    /// Grow the box to fit all text.
    Expand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlockConfig {
    pub block_spacing: f64,
    pub content_padding: f64,
    pub paragraph_max_height: f64,
    pub paragraph_overflow: ParagraphOverflow,
    pub swatch_size: f64,
    pub swatch_spacing: f64,
    pub swatches_per_row: usize,
    pub field_line_height: f64,
    pub field_item_spacing: f64,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            block_spacing: 12.0,
            content_padding: 15.0,
            paragraph_max_height: 250.0,
            paragraph_overflow: ParagraphOverflow::Clip,
            swatch_size: 32.0,
            swatch_spacing: 15.0,
            swatches_per_row: 8,
            field_line_height: 16.0,
            field_item_spacing: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Public URL prefix for saved files.
    pub url_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("uploads/pdfs"),
            url_prefix: "/uploads/pdfs".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: GeneratorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| PagewrightError::io(path, e))?;
        Self::from_json_str(&json)
    }

    /// Reject geometry that leaves no room for content.
    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.page.size.dimensions();
        if width <= 0.0 || height <= 0.0 {
            return Err(PagewrightError::Config(format!(
                "page size must be positive, got {}x{}",
                width, height
            )));
        }
        let m = &self.page.margin;
        if [m.top, m.right, m.bottom, m.left].iter().any(|v| *v < 0.0) {
            return Err(PagewrightError::Config("margins must not be negative".into()));
        }
        if m.horizontal() >= width {
            return Err(PagewrightError::Config(format!(
                "horizontal margins ({}) leave no content width on a {}pt page",
                m.horizontal(),
                width
            )));
        }
        let tallest_header = self.header.banner_height.max(self.header.compact_height);
        if self.header.banner_height < 0.0 || self.header.compact_height < 0.0 {
            return Err(PagewrightError::Config("header heights must not be negative".into()));
        }
        if m.vertical() + tallest_header >= height {
            return Err(PagewrightError::Config(format!(
                "margins and a {}pt header leave no content height on a {}pt page",
                tallest_header, height
            )));
        }
        if self.blocks.swatches_per_row == 0 {
            return Err(PagewrightError::Config("swatchesPerRow must be at least 1".into()));
        }
        if self.blocks.swatch_size <= 0.0 || self.blocks.field_line_height <= 0.0 {
            return Err(PagewrightError::Config(
                "swatchSize and fieldLineHeight must be positive".into(),
            ));
        }
        if self.blocks.paragraph_max_height <= self.blocks.content_padding * 2.0 {
            return Err(PagewrightError::Config(
                "paragraphMaxHeight must exceed twice the content padding".into(),
            ));
        }
        if self.footer.enabled && self.footer.font_size <= 0.0 {
            return Err(PagewrightError::Config("footer font size must be positive".into()));
        }
        Ok(())
    }

    pub fn page_dimensions(&self) -> (f64, f64) {
        self.page.size.dimensions()
    }

    pub fn content_width(&self) -> f64 {
        self.page_dimensions().0 - self.page.margin.horizontal()
    }
}
