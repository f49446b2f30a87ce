//! # PDF Serializer
//!
//! Writes buffered canvas pages as a PDF 1.7 file. The writer is
//! from-scratch: the subset needed here (standard Type1 fonts, filled and
//! stroked rectangles, lines, text, raster images) is small enough that a
//! PDF library would add more than it saves.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, images, pages, streams
//! ...
//! xref                <- byte offsets of each object
//! trailer             <- points to the catalog and the Info dictionary
//! %%EOF
//! ```
//!
//! Canvas coordinates have y pointing down from the top of the page; PDF user
//! space has y pointing up from the bottom, so every y is flipped here.

use std::collections::BTreeSet;
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;
use std::sync::Arc;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::canvas::{CanvasPage, DrawOp, Stroke};
use crate::font::StandardFont;
use crate::image_loader::{ImagePixelData, LoadedImage};
use crate::model::Metadata;
use crate::style::Color;

const PRODUCER: &str = concat!("pagewright ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Default)]
pub struct PdfWriter;

/// Tracks allocated PDF objects during writing. Index 0 is the unused
/// free-list head, so an object's index is its object number.
struct PdfBuilder {
    objects: Vec<Vec<u8>>,
    fonts: Vec<(StandardFont, usize)>,
    /// Image XObject ids keyed by the `Arc` pointer shared across pages.
    images: Vec<(*const LoadedImage, usize)>,
}

impl PdfBuilder {
    fn reserve(&mut self) -> usize {
        self.objects.push(Vec::new());
        self.objects.len() - 1
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }

    fn font_index(&self, font: StandardFont) -> usize {
        self.fonts
            .iter()
            .position(|(f, _)| *f == font)
            .unwrap_or(0)
    }

    fn image_index(&self, image: &Arc<LoadedImage>) -> Option<usize> {
        let ptr = Arc::as_ptr(image);
        self.images.iter().position(|(p, _)| *p == ptr)
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write(&self, pages: &[CanvasPage], metadata: &Metadata) -> Vec<u8> {
        let mut builder = PdfBuilder {
            objects: vec![Vec::new()],
            fonts: Vec::new(),
            images: Vec::new(),
        };

        let catalog_id = builder.reserve();
        let pages_id = builder.reserve();

        self.register_fonts(&mut builder, pages);
        self.register_images(&mut builder, pages);

        let font_resources = builder
            .fonts
            .iter()
            .enumerate()
            .map(|(i, (_, id))| format!("/F{} {} 0 R", i, id))
            .collect::<Vec<_>>()
            .join(" ");

        let mut page_ids = Vec::with_capacity(pages.len());
        for page in pages {
            let content = self.build_content_stream(page, &builder);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let mut stream = Vec::with_capacity(compressed.len() + 64);
            let _ = write!(
                stream,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            stream.extend_from_slice(&compressed);
            stream.extend_from_slice(b"\nendstream");
            let content_id = builder.push(stream);

            let xobjects = self.xobject_resources(page, &builder);
            let xobject_entry = if xobjects.is_empty() {
                String::new()
            } else {
                format!(" /XObject << {} >>", xobjects)
            };
            let page_dict = format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /Font << {} >>{} >> >>",
                pages_id, page.width, page.height, content_id, font_resources, xobject_entry
            );
            page_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[catalog_id] =
            format!("<< /Type /Catalog /Pages {} 0 R >>", pages_id).into_bytes();
        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[pages_id] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_ids.len()
        )
        .into_bytes();

        let info_id = builder.push(Self::info_dictionary(metadata).into_bytes());
        self.serialize(&builder, catalog_id, info_id)
    }

    fn info_dictionary(metadata: &Metadata) -> String {
        let mut info = String::from("<< ");
        let entries = [
            ("Title", metadata.title.as_deref()),
            ("Author", metadata.author.as_deref()),
            ("Subject", metadata.subject.as_deref()),
            ("Keywords", metadata.keywords.as_deref()),
            ("Creator", metadata.creator.as_deref()),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                let _ = write!(info, "/{} ({}) ", key, Self::encode_text(value));
            }
        }
        if let Some(created) = metadata.created_at {
            let _ = write!(
                info,
                "/CreationDate (D:{}Z) ",
                created.format("%Y%m%d%H%M%S")
            );
        }
        let _ = write!(info, "/Producer ({}) >>", PRODUCER);
        info
    }

    /// Each face used anywhere gets one Type1 font object, in a stable order.
    fn register_fonts(&self, builder: &mut PdfBuilder, pages: &[CanvasPage]) {
        let mut used: BTreeSet<StandardFont> = pages
            .iter()
            .flat_map(|p| p.text_lines().map(|l| l.font))
            .collect();
        if used.is_empty() {
            used.insert(StandardFont::Helvetica);
        }
        for font in used {
            let dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.pdf_name()
            );
            let id = builder.push(dict.into_bytes());
            builder.fonts.push((font, id));
        }
    }

    fn register_images(&self, builder: &mut PdfBuilder, pages: &[CanvasPage]) {
        for page in pages {
            for op in &page.ops {
                if let DrawOp::Image { image, .. } = op {
                    if builder.image_index(image).is_none() {
                        let id = Self::write_image_xobject(builder, image);
                        builder.images.push((Arc::as_ptr(image), id));
                    }
                }
            }
        }
    }

    /// Write an image as one XObject, plus an SMask when it has alpha.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let mut obj = Vec::with_capacity(data.len() + 160);
                let _ = write!(
                    obj,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /{} /BitsPerComponent 8 /Filter /DCTDecode \
                     /Length {} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    color_space.pdf_name(),
                    data.len()
                );
                obj.extend_from_slice(data);
                obj.extend_from_slice(b"\nendstream");
                builder.push(obj)
            }
            ImagePixelData::Decoded { rgb, alpha } => {
                let smask_id = alpha.as_ref().map(|alpha| {
                    let compressed = compress_to_vec_zlib(alpha, 6);
                    let mut obj = Vec::with_capacity(compressed.len() + 160);
                    let _ = write!(
                        obj,
                        "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceGray /BitsPerComponent 8 \
                         /Filter /FlateDecode /Length {} >>\nstream\n",
                        image.width_px,
                        image.height_px,
                        compressed.len()
                    );
                    obj.extend_from_slice(&compressed);
                    obj.extend_from_slice(b"\nendstream");
                    builder.push(obj)
                });

                let compressed = compress_to_vec_zlib(rgb, 6);
                let smask_ref = smask_id
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();
                let mut obj = Vec::with_capacity(compressed.len() + 160);
                let _ = write!(
                    obj,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 \
                     /Filter /FlateDecode /Length {}{} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    compressed.len(),
                    smask_ref
                );
                obj.extend_from_slice(&compressed);
                obj.extend_from_slice(b"\nendstream");
                builder.push(obj)
            }
        }
    }

    fn xobject_resources(&self, page: &CanvasPage, builder: &PdfBuilder) -> String {
        let mut used: BTreeSet<usize> = BTreeSet::new();
        for op in &page.ops {
            if let DrawOp::Image { image, .. } = op {
                if let Some(idx) = builder.image_index(image) {
                    used.insert(idx);
                }
            }
        }
        used.iter()
            .map(|idx| format!("/Im{} {} 0 R", idx, builder.images[*idx].1))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_content_stream(&self, page: &CanvasPage, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        let h = page.height;

        for op in &page.ops {
            match op {
                DrawOp::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    stroke,
                } => {
                    let _ = writeln!(stream, "q");
                    if let Some(c) = fill {
                        let _ = writeln!(stream, "{} rg", Self::rgb(c));
                    }
                    if let Some(s) = stroke {
                        Self::write_stroke_state(&mut stream, s);
                    }
                    let paint = match (fill.is_some(), stroke.is_some()) {
                        (true, true) => "B",
                        (true, false) => "f",
                        _ => "S",
                    };
                    let _ = writeln!(
                        stream,
                        "{:.2} {:.2} {:.2} {:.2} re\n{}\nQ",
                        x,
                        h - y - height,
                        width,
                        height,
                        paint
                    );
                }

                DrawOp::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    stroke,
                } => {
                    let _ = writeln!(stream, "q");
                    Self::write_stroke_state(&mut stream, stroke);
                    let _ = writeln!(
                        stream,
                        "{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ",
                        x1,
                        h - y1,
                        x2,
                        h - y2
                    );
                }

                DrawOp::Text { lines, color } => {
                    let _ = writeln!(stream, "BT\n{} rg", Self::rgb(color));
                    for line in lines {
                        let _ = writeln!(
                            stream,
                            "/F{} {:.1} Tf\n1 0 0 1 {:.2} {:.2} Tm\n({}) Tj",
                            builder.font_index(line.font),
                            line.font_size,
                            line.x,
                            h - line.baseline,
                            Self::encode_text(&line.text)
                        );
                    }
                    let _ = writeln!(stream, "ET");
                }

                DrawOp::Image {
                    x,
                    y,
                    width,
                    height,
                    image,
                } => {
                    if let Some(idx) = builder.image_index(image) {
                        let _ = writeln!(
                            stream,
                            "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/Im{} Do\nQ",
                            width,
                            height,
                            x,
                            h - y - height,
                            idx
                        );
                    }
                }
            }
        }

        stream
    }

    fn rgb(c: &Color) -> String {
        format!("{:.3} {:.3} {:.3}", c.r, c.g, c.b)
    }

    fn write_stroke_state(stream: &mut String, stroke: &Stroke) {
        let _ = writeln!(stream, "{} RG\n{:.2} w", Self::rgb(&stroke.color), stroke.width);
    }

    /// Encode text as the body of a PDF literal string in WinAnsiEncoding.
    ///
    /// Delimiters are escaped, bytes outside printable ASCII are written as
    /// octal escapes, and characters WinAnsi cannot represent become `?`.
    fn encode_text(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for ch in s.chars() {
            let byte = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match byte {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(byte as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", byte);
                }
            }
        }
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        static SPECIALS: &[(u32, u8)] = &[
            (0x20AC, 0x80),
            (0x201A, 0x82),
            (0x0192, 0x83),
            (0x201E, 0x84),
            (0x2026, 0x85),
            (0x2020, 0x86),
            (0x2021, 0x87),
            (0x02C6, 0x88),
            (0x2030, 0x89),
            (0x0160, 0x8A),
            (0x2039, 0x8B),
            (0x0152, 0x8C),
            (0x017D, 0x8E),
            (0x2018, 0x91),
            (0x2019, 0x92),
            (0x201C, 0x93),
            (0x201D, 0x94),
            (0x2022, 0x95),
            (0x2013, 0x96),
            (0x2014, 0x97),
            (0x02DC, 0x98),
            (0x2122, 0x99),
            (0x0161, 0x9A),
            (0x203A, 0x9B),
            (0x0153, 0x9C),
            (0x017E, 0x9E),
            (0x0178, 0x9F),
        ];
        if ch == '\t' {
            return Some(b' ');
        }
        SPECIALS
            .iter()
            .find(|(u, _)| *u == cp)
            .map(|(_, b)| *b)
    }

    fn serialize(&self, builder: &PdfBuilder, catalog_id: usize, info_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, data) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            catalog_id,
            info_id,
            xref_offset
        );

        output
    }
}

/// Number of times `needle` occurs in `haystack`.
#[cfg(test)]
pub(crate) fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

/// Decompress every FlateDecode page content stream in `pdf`.
#[cfg(test)]
pub(crate) fn page_streams(pdf: &[u8]) -> Vec<String> {
    use miniz_oxide::inflate::decompress_to_vec_zlib;

    let marker = b"/Filter /FlateDecode >>\nstream\n";
    let mut streams = Vec::new();
    let mut pos = 0;
    while let Some(start) = pdf[pos..]
        .windows(marker.len())
        .position(|w| w == marker)
        .map(|p| pos + p + marker.len())
    {
        let end = pdf[start..]
            .windows(b"\nendstream".len())
            .position(|w| w == b"\nendstream")
            .map(|p| start + p)
            .unwrap_or(pdf.len());
        if let Ok(raw) = decompress_to_vec_zlib(&pdf[start..end]) {
            streams.push(String::from_utf8_lossy(&raw).into_owned());
        }
        pos = end;
    }
    streams
}
