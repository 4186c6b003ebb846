mod apportion;
mod assembler;
mod canvas;
mod cursor;
mod debug;
mod error;
mod font;
mod layout;
mod logo;
mod measure;
mod metrics;
mod notice;
mod pdf;
mod sections;
mod types;

pub use apportion::{
    BreakdownSource, Direction, DirectionalCounts, DirectionalInput, ElevationBreakdown,
    ProgressSnapshot, apportion, project_elevations,
};
use assembler::DocumentAssembler;
pub use assembler::{FILENAME_PREFIX, MAX_STEM_LEN, notice_filename, sanitize_stem};
pub use canvas::{Canvas, DrawOp, ImageResource, Page, RenderedDocument};
pub use cursor::{PageCursor, Placement};
use debug::RenderTrace;
pub use error::NoticeError;
pub use font::FontMeasurer;
pub use layout::{Geometry, LayoutCompat, LayoutConfig, Palette};
pub use logo::{DecodingLogoLoader, LoadedLogo, LogoLoader, decode_logo, load_with_timeout};
pub use measure::{FixedAdvanceMeasurer, MM_PER_POINT, TextMeasurer};
pub use metrics::{DocumentMetrics, PageMetrics};
pub use notice::{
    LogoSource, NoticeDocument, NoticeLabels, ResolvedDay, ResolvedNotice, ScheduleDay,
    ScheduleSlot,
};
pub use pdf::{PdfWriter, document_to_pdf};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
pub use types::{Color, Length, Size};

pub const DEFAULT_LOGO_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_STAMP_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
enum StampSource {
    Now { format: String },
    Fixed(String),
}

impl StampSource {
    fn current(&self) -> String {
        match self {
            StampSource::Now { format } => chrono::Local::now().format(format).to_string(),
            StampSource::Fixed(stamp) => stamp.clone(),
        }
    }
}

/// Renders work notices into paginated draw instructions, and optionally PDF.
pub struct NoticeRenderer {
    layout: LayoutConfig,
    geometry: Geometry,
    compat: LayoutCompat,
    palette: Palette,
    labels: NoticeLabels,
    measurer: Arc<dyn TextMeasurer>,
    logo_loader: Arc<dyn LogoLoader>,
    logo_timeout: Duration,
    stamp: StampSource,
    file_extension: String,
    trace: Option<RenderTrace>,
}

pub struct NoticeRendererBuilder {
    layout: LayoutConfig,
    compat: LayoutCompat,
    palette: Palette,
    labels: NoticeLabels,
    measurer: Option<Arc<dyn TextMeasurer>>,
    font_file: Option<PathBuf>,
    logo_loader: Arc<dyn LogoLoader>,
    logo_timeout: Duration,
    stamp: StampSource,
    file_extension: String,
    trace_path: Option<PathBuf>,
}

impl NoticeRenderer {
    pub fn builder() -> NoticeRendererBuilder {
        NoticeRendererBuilder::new()
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn assembler<'a>(&'a self, stamp: &'a str) -> DocumentAssembler<'a> {
        DocumentAssembler {
            geometry: &self.geometry,
            measurer: self.measurer.as_ref(),
            labels: &self.labels,
            palette: &self.palette,
            compat: self.compat,
            logo_loader: self.logo_loader.clone(),
            logo_timeout: self.logo_timeout,
            stamp,
            extension: &self.file_extension,
            trace: self.trace.as_ref(),
        }
    }

    /// Lay out one notice. Missing optional fields and logo failures degrade
    /// to placeholders; the document is always complete.
    pub fn render(&self, doc: &NoticeDocument) -> Result<RenderedDocument, NoticeError> {
        let stamp = self.stamp.current();
        Ok(self.assembler(&stamp).render(doc))
    }

    /// Render and serialize; returns the PDF bytes and the download filename.
    pub fn render_to_pdf(&self, doc: &NoticeDocument) -> Result<(Vec<u8>, String), NoticeError> {
        let rendered = self.render(doc)?;
        let bytes = PdfWriter::new(self.layout.units_per_point).write(&rendered)?;
        Ok((bytes, rendered.filename))
    }

    /// Render independent notices concurrently. Results keep input order.
    pub fn render_many_parallel(
        &self,
        docs: &[NoticeDocument],
    ) -> Vec<Result<RenderedDocument, NoticeError>> {
        use rayon::prelude::*;

        let stamp = self.stamp.current();
        let assembler = self.assembler(&stamp);
        docs.par_iter().map(|doc| Ok(assembler.render(doc))).collect()
    }
}

impl NoticeRendererBuilder {
    pub fn new() -> Self {
        Self {
            layout: LayoutConfig::default(),
            compat: LayoutCompat::default(),
            palette: Palette::default(),
            labels: NoticeLabels::default(),
            measurer: None,
            font_file: None,
            logo_loader: Arc::new(DecodingLogoLoader),
            logo_timeout: DEFAULT_LOGO_TIMEOUT,
            stamp: StampSource::Now {
                format: DEFAULT_STAMP_FORMAT.to_string(),
            },
            file_extension: "pdf".to_string(),
            trace_path: None,
        }
    }

    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn page_size(mut self, width: f32, height: f32) -> Self {
        self.layout.page_width = width;
        self.layout.page_height = height;
        self
    }

    pub fn compat(mut self, compat: LayoutCompat) -> Self {
        self.compat = compat;
        self
    }

    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn labels(mut self, labels: NoticeLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Measure text with a caller-supplied implementation. Takes precedence
    /// over [`font_file`](Self::font_file).
    pub fn measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = Some(measurer);
        self
    }

    /// Measure text with the metrics of a TrueType/OpenType font file.
    pub fn font_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_file = Some(path.into());
        self
    }

    pub fn logo_loader(mut self, loader: Arc<dyn LogoLoader>) -> Self {
        self.logo_loader = loader;
        self
    }

    pub fn logo_timeout(mut self, timeout: Duration) -> Self {
        self.logo_timeout = timeout;
        self
    }

    /// strftime pattern for the "generated on" stamp, evaluated per render.
    pub fn stamp_format(mut self, format: impl Into<String>) -> Self {
        self.stamp = StampSource::Now {
            format: format.into(),
        };
        self
    }

    /// Pin the "generated on" stamp, for reproducible output.
    pub fn generated_on(mut self, stamp: impl Into<String>) -> Self {
        self.stamp = StampSource::Fixed(stamp.into());
        self
    }

    pub fn file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = extension.into();
        self
    }

    /// Record page breaks and skipped elements as JSON lines.
    pub fn trace_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.trace_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<NoticeRenderer, NoticeError> {
        let geometry = self.layout.resolve()?;
        if self.logo_timeout.is_zero() {
            return Err(NoticeError::InvalidArgument(
                "logo_timeout must be greater than zero".to_string(),
            ));
        }
        let file_extension = self.file_extension.trim_start_matches('.').to_string();
        if file_extension.is_empty() || !file_extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(NoticeError::InvalidArgument(format!(
                "file extension {:?} must be non-empty and alphanumeric",
                self.file_extension
            )));
        }
        if let StampSource::Now { format } = &self.stamp {
            validate_stamp_format(format)?;
        }
        let measurer: Arc<dyn TextMeasurer> = match (self.measurer, self.font_file) {
            (Some(measurer), _) => measurer,
            (None, Some(path)) => Arc::new(
                FontMeasurer::from_file(&path)?.with_units_per_point(self.layout.units_per_point),
            ),
            (None, None) => Arc::new(FixedAdvanceMeasurer::new(0.5, self.layout.units_per_point)),
        };
        let trace = match self.trace_path {
            Some(path) => Some(RenderTrace::new(path)?),
            None => None,
        };
        Ok(NoticeRenderer {
            layout: self.layout,
            geometry,
            compat: self.compat,
            palette: self.palette,
            labels: self.labels,
            measurer,
            logo_loader: self.logo_loader,
            logo_timeout: self.logo_timeout,
            stamp: self.stamp,
            file_extension,
            trace,
        })
    }
}

impl Default for NoticeRendererBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_stamp_format(format: &str) -> Result<(), NoticeError> {
    use chrono::format::{Item, StrftimeItems};

    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(NoticeError::InvalidArgument(format!(
            "invalid stamp format {format:?}"
        )));
    }
    Ok(())
}
