//! Page chrome: the banner and running headers drawn when a page starts, and
//! the footers stamped once the page count is known.
//!
//! The brand logo is fetched at most once per document with a single,
//! time-bounded attempt. Any failure (network, non-image body, bad path) is
//! logged and replaced by placeholder text; it never fails the document.

use std::cell::Cell;
use std::io::Read;
use std::time::Duration;

use log::{debug, warn};
use once_cell::unsync::OnceCell;
use thiserror::Error;

use crate::canvas::{Canvas, Stroke};
use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::image_loader::{read_source_bytes, ImageLoadError};
use crate::style::{Color, TextAlign, TextStyle};

const BANNER_WORDMARK_WIDTH: f64 = 200.0;

/// Cap on a downloaded logo body.
const MAX_LOGO_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(Box<ureq::Error>),
    #[error("failed to read response: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Decode(#[from] ImageLoadError),
}

impl From<ureq::Error> for FetchError {
    fn from(e: ureq::Error) -> Self {
        FetchError::Http(Box::new(e))
    }
}

/// Source of logo bytes. Swapped out in tests so nothing touches the network.
pub trait ImageFetcher {
    fn fetch(&self, source: &str) -> std::result::Result<Vec<u8>, FetchError>;
}

/// Fetches `http(s)://` URLs with a blocking, time-bounded request and reads
/// data URIs, file paths and raw base64 locally.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, source: &str) -> std::result::Result<Vec<u8>, FetchError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            let response = self.agent.get(source).call()?;
            let mut bytes = Vec::new();
            response
                .into_reader()
                .take(MAX_LOGO_BYTES)
                .read_to_end(&mut bytes)?;
            return Ok(bytes);
        }
        Ok(read_source_bytes(source)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    /// Full-height dark banner with logo and page title.
    Banner,
    /// Light running bar for continuation pages.
    Compact,
}

pub struct HeaderRenderer<'a> {
    config: &'a GeneratorConfig,
    fetcher: &'a dyn ImageFetcher,
    logo: OnceCell<Option<Vec<u8>>>,
    logo_warned: Cell<bool>,
}

impl<'a> HeaderRenderer<'a> {
    pub fn new(config: &'a GeneratorConfig, fetcher: &'a dyn ImageFetcher) -> Self {
        Self {
            config,
            fetcher,
            logo: OnceCell::new(),
            logo_warned: Cell::new(false),
        }
    }

    pub fn height(&self, kind: HeaderKind) -> f64 {
        match kind {
            HeaderKind::Banner => self.config.header.banner_height,
            HeaderKind::Compact => self.config.header.compact_height,
        }
    }

    fn logo_bytes(&self) -> Option<&[u8]> {
        self.logo
            .get_or_init(|| {
                let url = self.config.brand.logo_url.as_deref()?;
                match self.fetcher.fetch(url) {
                    Ok(bytes) => {
                        debug!("fetched logo from {} ({} bytes)", url, bytes.len());
                        Some(bytes)
                    }
                    Err(e) => {
                        warn!("could not load logo from {}: {}; using placeholder", url, e);
                        self.logo_warned.set(true);
                        None
                    }
                }
            })
            .as_deref()
    }

    /// Draw the header of `kind` at the top of the current page. Returns its
    /// height; content starts at `margin.top + height`.
    pub fn render_header(&self, canvas: &mut Canvas, kind: HeaderKind, title: &str) -> f64 {
        match kind {
            HeaderKind::Banner => self.render_banner(canvas, title),
            HeaderKind::Compact => self.render_compact(canvas, title),
        }
        self.height(kind)
    }

    fn render_banner(&self, canvas: &mut Canvas, title: &str) {
        let (page_width, _) = canvas.page_size();
        let header = &self.config.header;
        let brand = &self.config.brand;
        let margin = &self.config.page.margin;
        let height = header.banner_height;

        canvas.draw_rect(0.0, 0.0, page_width, height, Some(header.banner_background), None);

        let logo_x = margin.left;
        let logo_y = (height - brand.logo_height) / 2.0;
        let wordmark = TextStyle::new(12.0).color(header.banner_text);
        match (brand.logo_url.is_some(), self.logo_bytes()) {
            (_, Some(bytes)) => {
                if let Err(e) = canvas.draw_image_fitted(
                    bytes,
                    logo_x,
                    logo_y,
                    brand.logo_width,
                    brand.logo_height,
                ) {
                    if !self.logo_warned.replace(true) {
                        warn!("logo could not be decoded: {}; using placeholder", e);
                    }
                    self.draw_placeholder(canvas, logo_x, height);
                }
            }
            (true, None) => self.draw_placeholder(canvas, logo_x, height),
            (false, None) => {
                canvas.draw_text(
                    &brand.name,
                    logo_x,
                    height / 2.0 - 10.0,
                    BANNER_WORDMARK_WIDTH,
                    &wordmark,
                );
            }
        }

        // Whatever the logo box leaves, shrinking the type before truncating.
        let logo_area = brand.logo_width.max(BANNER_WORDMARK_WIDTH) + 20.0;
        let title_width = (page_width - margin.horizontal() - logo_area).max(BANNER_WORDMARK_WIDTH);
        let mut title_style = TextStyle::new(18.0)
            .bold()
            .color(header.banner_text)
            .align(TextAlign::Right);
        while title_style.font_size > 12.0
            && canvas.text_layout().measure_width(title, &title_style) > title_width
        {
            title_style.font_size -= 1.0;
        }
        let title = canvas
            .text_layout()
            .truncate_to_width(title, title_width, &title_style);
        canvas.draw_text(
            &title,
            page_width - margin.right - title_width,
            height / 2.0 - 10.0,
            title_width,
            &title_style,
        );

        canvas.draw_line(
            0.0,
            height,
            page_width,
            height,
            Stroke::new(Color::hex_or("#444444", Color::BLACK), 1.0),
        );
    }

    fn draw_placeholder(&self, canvas: &mut Canvas, x: f64, header_height: f64) {
        let style = TextStyle::new(12.0)
            .italic()
            .color(self.config.header.banner_text);
        canvas.draw_text(
            &self.config.brand.logo_fallback_text,
            x,
            header_height / 2.0 - 10.0,
            self.config.brand.logo_width.max(120.0),
            &style,
        );
    }

    fn render_compact(&self, canvas: &mut Canvas, title: &str) {
        let (page_width, _) = canvas.page_size();
        let header = &self.config.header;
        let margin = &self.config.page.margin;
        let height = header.compact_height;

        canvas.draw_rect(0.0, 0.0, page_width, height, Some(header.compact_background), None);
        canvas.draw_text(
            &format!("{} - {}", self.config.brand.name, title),
            margin.left,
            height / 2.0 - 6.0,
            page_width - margin.horizontal(),
            &TextStyle::new(10.0).color(header.compact_text),
        );
        canvas.draw_line(
            0.0,
            height,
            page_width,
            height,
            Stroke::new(Color::hex_or("#cccccc", Color::BLACK), 0.5),
        );
    }

    /// Stamp the footer on the current page. Only valid once `total_pages`
    /// is final, i.e. in the pass after all content is drawn.
    pub fn render_footer(&self, canvas: &mut Canvas, page_number: usize, total_pages: usize) {
        let (page_width, page_height) = canvas.page_size();
        let footer = &self.config.footer;
        let palette = &self.config.palette;
        let margin = &self.config.page.margin;
        let content_width = page_width - margin.horizontal();
        let rule_y = page_height - margin.bottom + 10.0;
        let text_y = rule_y + 6.0;
        let style = TextStyle::new(footer.font_size).color(palette.muted);

        canvas.draw_line(
            margin.left,
            rule_y,
            page_width - margin.right,
            rule_y,
            Stroke::new(palette.border, 0.5),
        );

        let slot = content_width / 3.0;
        if let Some(left) = footer.left.as_deref() {
            canvas.draw_text(left, margin.left, text_y, slot, &style.bold().color(palette.primary));
        }
        canvas.draw_text(
            &footer.page_label(page_number, total_pages),
            margin.left + slot,
            text_y,
            slot,
            &style.align(TextAlign::Center),
        );
        if let Some(right) = footer.right.as_deref() {
            canvas.draw_text(
                right,
                margin.left + 2.0 * slot,
                text_y,
                slot,
                &style
                    .bold()
                    .color(Color::hex_or("#ef4444", Color::BLACK))
                    .align(TextAlign::Right),
            );
        }
    }

    /// Second pass: revisit every page and stamp its page label.
    pub fn stamp_footers(&self, canvas: &mut Canvas) -> Result<()> {
        let total = canvas.page_count();
        for index in 0..total {
            canvas.switch_to_page(index)?;
            self.render_footer(canvas, index + 1, total);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::canvas::DrawOp;
    use std::cell::RefCell;

    /// Serves fixed bytes (or a failure) and records every request.
    pub(crate) struct StubFetcher {
        pub response: Option<Vec<u8>>,
        pub requests: RefCell<Vec<String>>,
    }

    impl StubFetcher {
        pub(crate) fn serving(bytes: Vec<u8>) -> Self {
            Self {
                response: Some(bytes),
                requests: RefCell::new(Vec::new()),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                response: None,
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl ImageFetcher for StubFetcher {
        fn fetch(&self, source: &str) -> std::result::Result<Vec<u8>, FetchError> {
            self.requests.borrow_mut().push(source.to_string());
            self.response.clone().ok_or_else(|| {
                FetchError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "unreachable",
                ))
            })
        }
    }

    fn config_with_logo() -> GeneratorConfig {
        let mut config = GeneratorConfig::default();
        config.brand.logo_url = Some("https://logo.invalid/logo.png".into());
        config
    }

    fn a4() -> Canvas {
        Canvas::new(595.28, 841.89)
    }

    #[test]
    fn logo_is_drawn_when_fetch_succeeds() {
        let config = config_with_logo();
        let fetcher = StubFetcher::serving(crate::image_loader::tests::png_bytes(12, 4, 255));
        let renderer = HeaderRenderer::new(&config, &fetcher);
        let mut canvas = a4();
        let h = renderer.render_header(&mut canvas, HeaderKind::Banner, "Document Information");
        assert_eq!(h, 120.0);
        assert_eq!(canvas.pages()[0].image_count(), 1);
        assert!(canvas.pages()[0].contains_text("Document Information"));
        assert!(!canvas.pages()[0].contains_text("logo unavailable"));
    }

    #[test]
    fn wide_logo_is_fitted_not_stretched() {
        let config = config_with_logo();
        let fetcher = StubFetcher::serving(crate::image_loader::tests::png_bytes(60, 4, 255));
        let renderer = HeaderRenderer::new(&config, &fetcher);
        let mut canvas = a4();
        renderer.render_header(&mut canvas, HeaderKind::Banner, "Brief");
        let (x, y, width, height) = canvas.pages()[0]
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Image { x, y, width, height, .. } => Some((*x, *y, *width, *height)),
                _ => None,
            })
            .unwrap();
        assert!((width / height - 15.0).abs() < 1e-6);
        assert!((width - 120.0).abs() < 1e-6);
        assert!(x >= 50.0 && x + width <= 170.0 + 1e-6);
        assert!(y >= 40.0 && y + height <= 80.0 + 1e-6);
    }

    #[test]
    fn failed_fetch_falls_back_to_placeholder_once() {
        let config = config_with_logo();
        let fetcher = StubFetcher::failing();
        let renderer = HeaderRenderer::new(&config, &fetcher);
        let mut canvas = a4();
        renderer.render_header(&mut canvas, HeaderKind::Banner, "Brief");
        canvas.new_page();
        renderer.render_header(&mut canvas, HeaderKind::Banner, "Brief");
        for page in canvas.pages() {
            assert!(page.contains_text("logo unavailable"));
            assert_eq!(page.image_count(), 0);
        }
        assert_eq!(fetcher.requests.borrow().len(), 1, "logo must be fetched once per document");
    }

    #[test]
    fn undecodable_logo_falls_back_to_placeholder() {
        let config = config_with_logo();
        let fetcher = StubFetcher::serving(b"<html>404</html>".to_vec());
        let renderer = HeaderRenderer::new(&config, &fetcher);
        let mut canvas = a4();
        renderer.render_header(&mut canvas, HeaderKind::Banner, "Brief");
        assert!(canvas.pages()[0].contains_text("logo unavailable"));
    }

    #[test]
    fn unreachable_url_through_http_fetcher_falls_back() {
        let mut config = GeneratorConfig::default();
        // Port 9 on loopback refuses connections without any DNS lookup.
        config.brand.logo_url = Some("http://127.0.0.1:9/logo.png".into());
        let fetcher = HttpFetcher::new(Duration::from_millis(500));
        let renderer = HeaderRenderer::new(&config, &fetcher);
        let mut canvas = a4();
        renderer.render_header(&mut canvas, HeaderKind::Banner, "Brief");
        assert!(canvas.pages()[0].contains_text("logo unavailable"));
    }

    #[test]
    fn no_logo_url_draws_brand_name() {
        let config = GeneratorConfig::default();
        let fetcher = StubFetcher::failing();
        let renderer = HeaderRenderer::new(&config, &fetcher);
        let mut canvas = a4();
        renderer.render_header(&mut canvas, HeaderKind::Banner, "Brief");
        assert!(canvas.pages()[0].contains_text("Maya Business Club"));
        assert!(fetcher.requests.borrow().is_empty());
    }

    #[test]
    fn compact_header_names_brand_and_title() {
        let config = GeneratorConfig::default();
        let fetcher = StubFetcher::failing();
        let renderer = HeaderRenderer::new(&config, &fetcher);
        let mut canvas = a4();
        let h = renderer.render_header(&mut canvas, HeaderKind::Compact, "Document Information");
        assert_eq!(h, 40.0);
        assert!(canvas.pages()[0].contains_text("Maya Business Club - Document Information"));
    }

    #[test]
    fn footers_stamped_on_every_page() {
        let mut config = GeneratorConfig::default();
        config.footer.left = Some("AI-Powered Project Analysis".into());
        config.footer.right = Some("CONFIDENTIAL - AI GENERATED".into());
        let fetcher = StubFetcher::failing();
        let renderer = HeaderRenderer::new(&config, &fetcher);
        let mut canvas = a4();
        canvas.new_page();
        canvas.new_page();
        renderer.stamp_footers(&mut canvas).unwrap();
        for (i, page) in canvas.pages().iter().enumerate() {
            let label = format!("Page {} of 3", i + 1);
            assert_eq!(page.text_lines().filter(|l| l.text == label).count(), 1);
            assert!(page.contains_text("CONFIDENTIAL"));
        }
    }

    #[test]
    fn page_label_prefix_is_prepended() {
        let mut config = GeneratorConfig::default();
        config.footer.page_label_prefix = Some("Detailed Report".into());
        let fetcher = StubFetcher::failing();
        let renderer = HeaderRenderer::new(&config, &fetcher);
        let mut canvas = a4();
        canvas.new_page();
        renderer.stamp_footers(&mut canvas).unwrap();
        assert!(canvas.pages()[1].contains_text("Detailed Report - Page 2 of 2"));
    }

    #[test]
    fn local_sources_skip_the_network() {
        use base64::Engine;
        let png = crate::image_loader::tests::png_bytes(1, 1, 255);
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );
        let bytes = HttpFetcher::new(Duration::from_millis(10)).fetch(&uri).unwrap();
        assert_eq!(bytes, png);
    }
}
