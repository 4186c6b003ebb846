use crate::canvas::RenderedDocument;
use crate::debug::RenderTrace;
use crate::layout::{Geometry, LayoutCompat, Palette};
use crate::logo::{LogoLoader, load_with_timeout};
use crate::measure::TextMeasurer;
use crate::notice::{NoticeDocument, NoticeLabels, ResolvedNotice};
use crate::sections::{self, SectionContext};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const FILENAME_PREFIX: &str = "Notice-";
pub const MAX_STEM_LEN: usize = 30;

/// Keep ASCII letters and digits only, then cut to `max_len` characters.
pub fn sanitize_stem(title: &str, max_len: usize) -> String {
    title
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(max_len)
        .collect()
}

/// `Notice-<stem>.<extension>` for a notice title.
pub fn notice_filename(title: &str, extension: &str) -> String {
    let stem = sanitize_stem(title, MAX_STEM_LEN);
    let extension = extension.trim_start_matches('.');
    format!("{FILENAME_PREFIX}{stem}.{extension}")
}

/// Runs the section renderers in their fixed order over one cursor.
pub(crate) struct DocumentAssembler<'a> {
    pub(crate) geometry: &'a Geometry,
    pub(crate) measurer: &'a dyn TextMeasurer,
    pub(crate) labels: &'a NoticeLabels,
    pub(crate) palette: &'a Palette,
    pub(crate) compat: LayoutCompat,
    pub(crate) logo_loader: Arc<dyn LogoLoader>,
    pub(crate) logo_timeout: Duration,
    pub(crate) stamp: &'a str,
    pub(crate) extension: &'a str,
    pub(crate) trace: Option<&'a RenderTrace>,
}

impl DocumentAssembler<'_> {
    pub fn render(&self, doc: &NoticeDocument) -> RenderedDocument {
        let started = Instant::now();
        let filename = notice_filename(&doc.title, self.extension);
        let notice = ResolvedNotice::resolve(doc, self.labels);
        let logo = doc.logo_image.clone().map(|source| {
            log::debug!("{filename}: loading logo from {}", source.describe());
            load_with_timeout(self.logo_loader.clone(), source, self.logo_timeout)
        });
        let stamp = format!("{} {}", self.labels.generated_on, self.stamp);

        let mut ctx = SectionContext::new(
            self.geometry,
            self.measurer,
            self.labels,
            self.palette,
            self.compat,
            self.trace,
            &filename,
        );
        sections::render_header(&mut ctx, logo);
        sections::render_title_banner(&mut ctx);
        sections::render_title(&mut ctx, notice.title);
        sections::render_building_label(&mut ctx, notice.building_label);
        sections::render_date_banner(
            &mut ctx,
            &notice.work_period,
            notice.daily_hours.as_deref(),
            notice.job_type.as_deref(),
        );
        sections::render_body(&mut ctx, notice.body_text);
        sections::render_schedule(&mut ctx, &notice.schedule);
        sections::render_footer(&mut ctx, notice.service_provider, notice.contact, &stamp);

        let page_count = ctx.canvas.page_count();
        if let Some(trace) = self.trace {
            trace.emit_summary(&filename, page_count, &ctx.counters);
        }
        let canvas = ctx.canvas;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        log::debug!("{filename}: {page_count} page(s) in {elapsed_ms:.2} ms");
        canvas.finish(filename, elapsed_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DrawOp;
    use crate::error::NoticeError;
    use crate::layout::LayoutConfig;
    use crate::logo::{DecodingLogoLoader, LoadedLogo};
    use crate::measure::FixedAdvanceMeasurer;
    use crate::notice::{LogoSource, ScheduleDay, ScheduleSlot};
    use crate::types::Length;
    use proptest::prelude::*;

    struct FailingLoader;

    impl LogoLoader for FailingLoader {
        fn load(&self, _source: &LogoSource) -> Result<LoadedLogo, NoticeError> {
            Err(NoticeError::Asset("connection refused".to_string()))
        }
    }

    struct Env {
        geometry: Geometry,
        measurer: FixedAdvanceMeasurer,
        labels: NoticeLabels,
        palette: Palette,
    }

    impl Env {
        fn new() -> Self {
            Self {
                geometry: LayoutConfig::default().resolve().unwrap(),
                measurer: FixedAdvanceMeasurer::default(),
                labels: NoticeLabels::default(),
                palette: Palette::default(),
            }
        }

        fn assembler(&self, loader: Arc<dyn LogoLoader>) -> DocumentAssembler<'_> {
            DocumentAssembler {
                geometry: &self.geometry,
                measurer: &self.measurer,
                labels: &self.labels,
                palette: &self.palette,
                compat: LayoutCompat::default(),
                logo_loader: loader,
                logo_timeout: Duration::from_secs(5),
                stamp: "2026-05-04",
                extension: "pdf",
                trace: None,
            }
        }
    }

    impl Env {
        /// Whole body lines left on page one once the blocks above the body are drawn.
        fn first_page_body_capacity(&self, doc: &NoticeDocument) -> usize {
            let notice = ResolvedNotice::resolve(doc, &self.labels);
            let mut ctx = SectionContext::new(
                &self.geometry,
                &self.measurer,
                &self.labels,
                &self.palette,
                LayoutCompat::default(),
                None,
                "capacity",
            );
            sections::render_title_banner(&mut ctx);
            sections::render_title(&mut ctx, notice.title);
            sections::render_building_label(&mut ctx, notice.building_label);
            sections::render_date_banner(
                &mut ctx,
                &notice.work_period,
                notice.daily_hours.as_deref(),
                notice.job_type.as_deref(),
            );
            ctx.cursor.remaining_height().whole_steps(self.geometry.body_line_height)
        }
    }

    fn notice() -> NoticeDocument {
        NoticeDocument {
            title: "Balcony Inspection".to_string(),
            building_label: "Harbor View Towers".to_string(),
            body_text: "Inspectors will access every balcony.".to_string(),
            service_provider_label: Some("Acme Facade Co.".to_string()),
            ..NoticeDocument::default()
        }
    }

    fn day(date: &str, slots: usize) -> ScheduleDay {
        ScheduleDay {
            date: Some(date.to_string()),
            slots: (0..slots)
                .map(|i| ScheduleSlot {
                    start_time: Some(format!("{}:00", 8 + i)),
                    end_time: Some(format!("{}:00", 9 + i)),
                    units_label: None,
                })
                .collect(),
        }
    }

    /// Indices of pages with a text containing `needle`.
    fn pages_with(doc: &RenderedDocument, needle: &str) -> Vec<usize> {
        doc.pages
            .iter()
            .enumerate()
            .filter(|(_, page)| page.contains_text(needle))
            .map(|(idx, _)| idx)
            .collect()
    }

    #[test]
    fn filename_keeps_alphanumerics_only() {
        assert_eq!(
            notice_filename("Hazard Notice: North Tower (Phase 2)!!", "pdf"),
            "Notice-HazardNoticeNorthTowerPhase2.pdf"
        );
        assert_eq!(
            sanitize_stem("Élévation façade nord — 2026", 30),
            "lvationfaadenord2026"
        );
        assert_eq!(notice_filename("!!!", ".pdf"), "Notice-.pdf");
        assert_eq!(sanitize_stem(&"a".repeat(45), MAX_STEM_LEN).len(), 30);
    }

    #[test]
    fn sections_render_in_fixed_order() {
        let env = Env::new();
        let mut doc = notice();
        doc.schedule = Some(vec![day("Mon, May 4", 1)]);
        let rendered = env.assembler(Arc::new(DecodingLogoLoader)).render(&doc);
        let texts: Vec<&str> = rendered.pages[0].texts().collect();
        assert_eq!(
            texts,
            vec![
                "OFFICIAL NOTICE",
                "Balcony Inspection",
                "Harbor View Towers",
                "Work period: Dates to be announced",
                "Inspectors will access every balcony.",
                "WORK SCHEDULE",
                "Mon, May 4",
                "8:00 \u{2013} 9:00 | Units TBD",
                "Acme Facade Co.",
                "Generated on 2026-05-04",
            ]
        );
        assert_eq!(rendered.filename, "Notice-BalconyInspection.pdf");
    }

    #[test]
    fn missing_dates_render_placeholder_banner() {
        let env = Env::new();
        let rendered = env.assembler(Arc::new(DecodingLogoLoader)).render(&notice());
        assert_eq!(rendered.page_count(), 1);
        assert!(rendered.pages[0].contains_text("Dates to be announced"));
    }

    #[test]
    fn failing_logo_does_not_stop_the_render() {
        let env = Env::new();
        let mut doc = notice();
        doc.logo_image = Some(LogoSource::Path("/srv/logo.png".into()));
        doc.schedule = Some(vec![day("Tue, May 5", 2)]);
        let rendered = env.assembler(Arc::new(FailingLoader)).render(&doc);
        let page = &rendered.pages[0];
        assert!(!page.commands.iter().any(|op| matches!(op, DrawOp::Image { .. })));
        assert!(rendered.images.is_empty());
        for expected in [
            "OFFICIAL NOTICE",
            "Balcony Inspection",
            "Inspectors will",
            "Tue, May 5",
            "Acme Facade Co.",
        ] {
            assert!(page.contains_text(expected), "missing {expected}");
        }
    }

    #[test]
    fn decoded_logo_is_registered_and_drawn() {
        let env = Env::new();
        let mut doc = notice();
        doc.logo_image = Some(LogoSource::Bytes(crate::logo::png_bytes(60, 20)));
        let rendered = env.assembler(Arc::new(DecodingLogoLoader)).render(&doc);
        assert!(rendered.images.contains_key(sections::LOGO_RESOURCE_ID));
        assert!(matches!(
            rendered.pages[0].commands[0],
            DrawOp::Image { width, .. } if width == Length::from_i32(45)
        ));
    }

    #[test]
    fn schedule_day_moves_to_new_page_before_its_label() {
        let env = Env::new();
        let mut doc = notice();
        doc.body_text = vec!["filler"; 18].join("\n");
        doc.schedule = Some(vec![day("Day A", 2), day("Day B", 2)]);
        let rendered = env.assembler(Arc::new(DecodingLogoLoader)).render(&doc);
        // Day A still has 50 units; Day B does not and starts page 2.
        assert_eq!(pages_with(&rendered, "Day A"), vec![0]);
        assert_eq!(pages_with(&rendered, "Day B"), vec![1]);
        let page_two: Vec<&str> = rendered.pages[1].texts().collect();
        assert_eq!(page_two[0], "Day B");
    }

    #[test]
    fn rendering_is_deterministic() {
        let env = Env::new();
        let mut doc = notice();
        doc.body_text = "Scaffolding goes up on the north elevation. ".repeat(80);
        doc.schedule = Some((0..8).map(|i| day(&format!("Day {i}"), 4)).collect());
        let assembler = env.assembler(Arc::new(DecodingLogoLoader));
        let first = assembler.render(&doc);
        let second = assembler.render(&doc);
        assert!(first.page_count() > 1);
        assert_eq!(first.page_count(), second.page_count());
        assert_eq!(first.pages, second.pages);
        assert_eq!(first.fingerprint_sha256(), second.fingerprint_sha256());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn every_body_line_is_drawn_exactly_once(line_count in 0usize..160) {
            let env = Env::new();
            let mut doc = notice();
            doc.service_provider_label = None;
            doc.body_text = (0..line_count).map(|i| format!("L{i:03}")).collect::<Vec<_>>().join("\n");
            let rendered = env.assembler(Arc::new(DecodingLogoLoader)).render(&doc);
            let first_capacity = env.first_page_body_capacity(&doc);
            let capacity = Length::from_i32(257).whole_steps(env.geometry.body_line_height);
            prop_assert!(first_capacity < capacity);
            let mut drawn = Vec::new();
            for (idx, page) in rendered.pages.iter().enumerate() {
                let lines: Vec<&str> = page.texts().filter(|t| t.starts_with('L')).collect();
                let limit = if idx == 0 { first_capacity } else { capacity };
                prop_assert!(lines.len() <= limit);
                if idx + 1 < rendered.pages.len() {
                    prop_assert_eq!(lines.len(), limit);
                }
                drawn.extend(lines.into_iter().map(str::to_string));
            }
            let expected: Vec<String> = (0..line_count).map(|i| format!("L{i:03}")).collect();
            prop_assert_eq!(drawn, expected);
        }
    }
}
