use crate::metrics::DocumentMetrics;
use crate::types::{Color, Length, Size};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

/// Absolute-positioned drawing instruction. `y` grows downwards from the
/// top edge of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: Length,
        baseline_y: Length,
        text: String,
        font_size: f32,
        bold: bool,
        color: Color,
    },
    FillRect {
        x: Length,
        y: Length,
        width: Length,
        height: Length,
        color: Color,
    },
    StrokeRect {
        x: Length,
        y: Length,
        width: Length,
        height: Length,
        color: Color,
        line_width: Length,
    },
    Line {
        x1: Length,
        y1: Length,
        x2: Length,
        y2: Length,
        color: Color,
        line_width: Length,
    },
    Image {
        x: Length,
        y: Length,
        width: Length,
        height: Length,
        resource_id: String,
    },
}

impl DrawOp {
    pub fn text(&self) -> Option<&str> {
        match self {
            DrawOp::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    fn write_canonical(&self, out: &mut String) {
        let _ = match self {
            DrawOp::Text {
                x,
                baseline_y,
                text,
                font_size,
                bold,
                color,
            } => writeln!(
                out,
                "T {} {} {} {} {} {:?}",
                x.to_milli_i64(),
                baseline_y.to_milli_i64(),
                font_size.to_bits(),
                bold,
                color_key(*color),
                text
            ),
            DrawOp::FillRect {
                x,
                y,
                width,
                height,
                color,
            } => writeln!(
                out,
                "F {} {} {} {} {}",
                x.to_milli_i64(),
                y.to_milli_i64(),
                width.to_milli_i64(),
                height.to_milli_i64(),
                color_key(*color)
            ),
            DrawOp::StrokeRect {
                x,
                y,
                width,
                height,
                color,
                line_width,
            } => writeln!(
                out,
                "S {} {} {} {} {} {}",
                x.to_milli_i64(),
                y.to_milli_i64(),
                width.to_milli_i64(),
                height.to_milli_i64(),
                color_key(*color),
                line_width.to_milli_i64()
            ),
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                color,
                line_width,
            } => writeln!(
                out,
                "L {} {} {} {} {} {}",
                x1.to_milli_i64(),
                y1.to_milli_i64(),
                x2.to_milli_i64(),
                y2.to_milli_i64(),
                color_key(*color),
                line_width.to_milli_i64()
            ),
            DrawOp::Image {
                x,
                y,
                width,
                height,
                resource_id,
            } => writeln!(
                out,
                "I {} {} {} {} {:?}",
                x.to_milli_i64(),
                y.to_milli_i64(),
                width.to_milli_i64(),
                height.to_milli_i64(),
                resource_id
            ),
        };
    }
}

fn color_key(color: Color) -> String {
    format!(
        "{:08x}{:08x}{:08x}",
        color.r.to_bits(),
        color.g.to_bits(),
        color.b.to_bits()
    )
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub commands: Vec<DrawOp>,
}

impl Page {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(DrawOp::text)
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|text| text.contains(needle))
    }
}

/// Decoded image referenced by [`DrawOp::Image`].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResource {
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Encoded bytes as supplied (PNG or JPEG).
    pub data: Arc<[u8]>,
}

/// Finished layout: ordered pages of draw instructions plus the download name.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub page_size: Size,
    pub pages: Vec<Page>,
    pub images: BTreeMap<String, ImageResource>,
    pub filename: String,
    pub metrics: DocumentMetrics,
}

impl RenderedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Hex SHA-256 over page geometry, draw instructions and the filename.
    /// Timing metrics are excluded, so equal layouts hash equally.
    pub fn fingerprint_sha256(&self) -> String {
        let mut canonical = String::new();
        let _ = writeln!(
            canonical,
            "page {} {}",
            self.page_size.width.to_milli_i64(),
            self.page_size.height.to_milli_i64()
        );
        let _ = writeln!(canonical, "file {:?}", self.filename);
        for (idx, page) in self.pages.iter().enumerate() {
            let _ = writeln!(canonical, "--- {idx}");
            for command in &page.commands {
                command.write_canonical(&mut canonical);
            }
        }
        for (id, image) in &self.images {
            let _ = writeln!(
                canonical,
                "img {:?} {} {} {}",
                id,
                image.pixel_width,
                image.pixel_height,
                image.data.len()
            );
        }
        hex_sha256(canonical.as_bytes())
    }
}

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Append-only page buffer that follows the layout cursor's page index.
#[derive(Debug)]
pub struct Canvas {
    page_size: Size,
    pages: Vec<Page>,
    images: BTreeMap<String, ImageResource>,
}

impl Canvas {
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            pages: vec![Page::new()],
            images: BTreeMap::new(),
        }
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Open pages until `page_index` exists.
    pub fn ensure_page(&mut self, page_index: usize) {
        while self.pages.len() <= page_index {
            self.pages.push(Page::new());
        }
    }

    pub fn push(&mut self, page_index: usize, command: DrawOp) {
        self.ensure_page(page_index);
        self.pages[page_index].commands.push(command);
    }

    pub fn commands(&self, page_index: usize) -> &[DrawOp] {
        self.pages
            .get(page_index)
            .map(|page| page.commands.as_slice())
            .unwrap_or_default()
    }

    pub fn register_image(&mut self, resource_id: impl Into<String>, image: ImageResource) {
        self.images.insert(resource_id.into(), image);
    }

    pub fn finish(self, filename: String, total_render_ms: f64) -> RenderedDocument {
        let metrics = DocumentMetrics::from_pages(&self.pages, total_render_ms);
        RenderedDocument {
            page_size: self.page_size,
            pages: self.pages,
            images: self.images,
            filename,
            metrics,
        }
    }
}
