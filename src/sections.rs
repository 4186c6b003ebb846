//! Section renderers. Each one draws a single block of the notice at the
//! cursor and leaves the cursor below what it drew.

use crate::canvas::{Canvas, DrawOp};
use crate::cursor::PageCursor;
use crate::debug::{RenderTrace, TraceCounters};
use crate::error::NoticeError;
use crate::layout::{Geometry, LayoutCompat, Palette};
use crate::logo::LoadedLogo;
use crate::measure::TextMeasurer;
use crate::notice::{NoticeLabels, ResolvedDay};
use crate::types::{Color, Length};

pub(crate) const LOGO_RESOURCE_ID: &str = "logo";

/// Mutable state for one render. Never shared between renders.
pub(crate) struct SectionContext<'a> {
    pub cursor: PageCursor,
    pub canvas: Canvas,
    pub measurer: &'a dyn TextMeasurer,
    pub geometry: &'a Geometry,
    pub labels: &'a NoticeLabels,
    pub palette: &'a Palette,
    pub compat: LayoutCompat,
    pub trace: Option<&'a RenderTrace>,
    pub counters: TraceCounters,
    /// Identifies the document in logs and trace lines.
    pub doc_id: &'a str,
}

struct TextStyle {
    font_size: f32,
    bold: bool,
    color: Color,
}

impl<'a> SectionContext<'a> {
    pub fn new(
        geometry: &'a Geometry,
        measurer: &'a dyn TextMeasurer,
        labels: &'a NoticeLabels,
        palette: &'a Palette,
        compat: LayoutCompat,
        trace: Option<&'a RenderTrace>,
        doc_id: &'a str,
    ) -> Self {
        Self {
            cursor: PageCursor::from_geometry(geometry),
            canvas: Canvas::new(geometry.page_size),
            measurer,
            geometry,
            labels,
            palette,
            compat,
            trace,
            counters: TraceCounters::default(),
            doc_id,
        }
    }

    fn page_break(&mut self, section: &str) {
        self.cursor.new_page();
        self.record_break(section);
    }

    fn record_break(&mut self, section: &str) {
        let page_index = self.cursor.page_index();
        self.canvas.ensure_page(page_index);
        log::debug!(
            "{}: {section} continues on page {}",
            self.doc_id,
            page_index + 1
        );
        if let Some(trace) = self.trace {
            trace.page_break(&mut self.counters, self.doc_id, section, page_index);
        }
    }

    /// Baseline that vertically centres a line of `font_size` in a band.
    fn baseline(&self, top: Length, band: Length, font_size: f32) -> Length {
        top + band / 2 + self.geometry.font_height(font_size).mul_ratio(7, 20)
    }

    fn draw_text(&mut self, page: usize, x: Length, baseline_y: Length, text: &str, style: &TextStyle) {
        if text.is_empty() {
            return;
        }
        self.canvas.push(
            page,
            DrawOp::Text {
                x,
                baseline_y,
                text: text.to_string(),
                font_size: style.font_size,
                bold: style.bold,
                color: style.color,
            },
        );
    }

    fn fill_band(&mut self, page: usize, y: Length, height: Length, color: Color) {
        self.canvas.push(
            page,
            DrawOp::FillRect {
                x: self.geometry.content_left(),
                y,
                width: self.geometry.content_width(),
                height,
                color,
            },
        );
    }

    /// One line of text in its own band of `line_height`, placed at the cursor.
    fn line(&mut self, x: Length, line_height: Length, text: &str, style: &TextStyle, section: &str) {
        let placement = self.cursor.place(line_height);
        if placement.broke_page {
            self.record_break(section);
        }
        let baseline = self.baseline(placement.y, line_height, style.font_size);
        self.draw_text(placement.page_index, x, baseline, text, style);
    }
}

/// Logo at fixed height, width from the image aspect ratio. A failed load is
/// logged and the header is skipped.
pub(crate) fn render_header(ctx: &mut SectionContext<'_>, logo: Option<Result<LoadedLogo, NoticeError>>) {
    let logo = match logo {
        None => return,
        Some(Ok(logo)) => logo,
        Some(Err(err)) => {
            log::warn!("{}: skipping logo: {err}", ctx.doc_id);
            if let Some(trace) = ctx.trace {
                trace.degraded(&mut ctx.counters, ctx.doc_id, "logo", &err.to_string());
            }
            return;
        }
    };
    let g = ctx.geometry;
    let mut height = g.logo_height;
    let (pixel_width, pixel_height) = (i64::from(logo.pixel_width), i64::from(logo.pixel_height));
    let mut width = height.mul_ratio(pixel_width, pixel_height);
    if width > g.content_width() {
        width = g.content_width();
        height = width.mul_ratio(pixel_height, pixel_width);
    }
    let placement = ctx.cursor.place(g.logo_height);
    ctx.canvas.register_image(LOGO_RESOURCE_ID, logo.into_resource());
    ctx.canvas.push(
        placement.page_index,
        DrawOp::Image {
            x: g.content_left(),
            y: placement.y,
            width,
            height,
            resource_id: LOGO_RESOURCE_ID.to_string(),
        },
    );
    ctx.cursor.skip(g.logo_gap);
}

pub(crate) fn render_title_banner(ctx: &mut SectionContext<'_>) {
    let g = ctx.geometry;
    let placement = ctx.cursor.place(g.title_banner_height);
    if placement.broke_page {
        ctx.record_break("title_banner");
    }
    ctx.fill_band(placement.page_index, placement.y, g.title_banner_height, ctx.palette.accent);
    let labels = ctx.labels;
    let label = labels.official_notice.as_str();
    let width = ctx.measurer.measure_width(label, g.banner_font_size);
    let x = g.content_left() + ((g.content_width() - width) / 2).max(Length::ZERO);
    let baseline = ctx.baseline(placement.y, g.title_banner_height, g.banner_font_size);
    let style = TextStyle {
        font_size: g.banner_font_size,
        bold: true,
        color: ctx.palette.on_accent,
    };
    ctx.draw_text(placement.page_index, x, baseline, label, &style);
    ctx.cursor.skip(g.title_banner_gap);
}

pub(crate) fn render_title(ctx: &mut SectionContext<'_>, title: &str) {
    let g = ctx.geometry;
    let style = TextStyle {
        font_size: g.title_font_size,
        bold: true,
        color: ctx.palette.text,
    };
    for line in ctx.measurer.wrap(title, g.content_width(), g.title_font_size) {
        ctx.line(g.content_left(), g.title_line_height, &line, &style, "title");
    }
}

pub(crate) fn render_building_label(ctx: &mut SectionContext<'_>, building_label: &str) {
    let g = ctx.geometry;
    let style = TextStyle {
        font_size: g.label_font_size,
        bold: false,
        color: ctx.palette.muted,
    };
    ctx.line(g.content_left(), g.label_line_height, building_label, &style, "building_label");
}

/// Bordered banner with the work period and, when known, daily hours and
/// job type on fixed offsets inside the banner.
pub(crate) fn render_date_banner(
    ctx: &mut SectionContext<'_>,
    work_period: &str,
    daily_hours: Option<&str>,
    job_type: Option<&str>,
) {
    let g = ctx.geometry;
    let banner = g.date_banner_height;
    let placement = ctx.cursor.place(banner);
    if placement.broke_page {
        ctx.record_break("date_banner");
    }
    let page = placement.page_index;
    ctx.fill_band(page, placement.y, banner, ctx.palette.banner_fill);
    ctx.canvas.push(
        page,
        DrawOp::StrokeRect {
            x: g.content_left(),
            y: placement.y,
            width: g.content_width(),
            height: banner,
            color: ctx.palette.banner_border,
            line_width: Length::from_f32(0.5),
        },
    );

    let x = g.content_left() + Length::from_i32(4);
    let lines = [
        (banner.mul_ratio(6, 20), Some(work_period), true),
        (banner.mul_ratio(11, 20), daily_hours, false),
        (banner.mul_ratio(16, 20), job_type, false),
    ];
    for (offset, text, bold) in lines {
        let Some(text) = text else {
            continue;
        };
        let style = TextStyle {
            font_size: g.label_font_size,
            bold,
            color: ctx.palette.text,
        };
        ctx.draw_text(page, x, placement.y + offset, text, &style);
    }
    ctx.cursor.skip(g.date_banner_gap);
}

/// Body text split across pages by whole-line capacity. Continuation pages
/// start at the top margin with no repeated header.
pub(crate) fn render_body(ctx: &mut SectionContext<'_>, body_text: &str) {
    if body_text.trim().is_empty() {
        return;
    }
    let g = ctx.geometry;
    let line_height = g.body_line_height;
    let style = TextStyle {
        font_size: g.body_font_size,
        bold: false,
        color: ctx.palette.text,
    };
    let lines = ctx.measurer.wrap(body_text, g.content_width(), g.body_font_size);
    let mut pending: &[String] = &lines;
    while !pending.is_empty() {
        let mut capacity = ctx.cursor.remaining_height().whole_steps(line_height);
        if capacity == 0 {
            if !ctx.cursor.is_at_top() {
                ctx.page_break("body");
                continue;
            }
            capacity = 1;
        }
        let take = capacity.min(pending.len());
        let (chunk, rest) = pending.split_at(take);
        for text in chunk {
            let placement = ctx.cursor.place(line_height);
            let baseline = ctx.baseline(placement.y, line_height, style.font_size);
            ctx.draw_text(placement.page_index, g.content_left(), baseline, text, &style);
        }
        pending = rest;
        if !pending.is_empty() {
            ctx.page_break("body");
        }
    }
    ctx.cursor.skip(g.body_gap);
}

fn schedule_header_band(ctx: &mut SectionContext<'_>) {
    let g = ctx.geometry;
    let placement = ctx.cursor.place(g.schedule_header_height);
    if placement.broke_page {
        ctx.record_break("schedule");
    }
    ctx.fill_band(placement.page_index, placement.y, g.schedule_header_height, ctx.palette.accent);
    let labels = ctx.labels;
    let title = labels.schedule_title.as_str();
    let baseline = ctx.baseline(placement.y, g.schedule_header_height, g.schedule_font_size);
    let style = TextStyle {
        font_size: g.schedule_font_size,
        bold: true,
        color: ctx.palette.on_accent,
    };
    ctx.draw_text(
        placement.page_index,
        g.content_left() + Length::from_i32(3),
        baseline,
        title,
        &style,
    );
    ctx.cursor.skip(g.schedule_header_gap);
}

fn schedule_break(ctx: &mut SectionContext<'_>) {
    ctx.page_break("schedule");
    if ctx.compat.repeat_schedule_header {
        schedule_header_band(ctx);
    }
}

/// Header band, then one block per day. A day starts on a new page when
/// less than the per-day minimum remains.
pub(crate) fn render_schedule(ctx: &mut SectionContext<'_>, days: &[ResolvedDay]) {
    if days.is_empty() {
        return;
    }
    let g = ctx.geometry;
    schedule_header_band(ctx);
    let day_style = TextStyle {
        font_size: g.schedule_font_size,
        bold: true,
        color: ctx.palette.accent,
    };
    let slot_style = TextStyle {
        font_size: g.schedule_font_size,
        bold: false,
        color: ctx.palette.text,
    };
    let slot_x = g.content_left() + Length::from_i32(4);
    for day in days {
        if ctx.cursor.remaining_height() < g.day_min_remaining {
            schedule_break(ctx);
        }
        if !ctx.cursor.fits(g.day_label_height) {
            schedule_break(ctx);
        }
        ctx.line(g.content_left(), g.day_label_height, &day.date, &day_style, "schedule");
        for slot in &day.slots {
            if !ctx.cursor.fits(g.slot_line_height) {
                schedule_break(ctx);
            }
            ctx.line(slot_x, g.slot_line_height, slot, &slot_style, "schedule");
        }
        ctx.cursor.skip(g.day_gap);
    }
}

/// Rule, provider and stamp at the bottom of the current page, with the
/// contact on a second line. Drawn in place unless `ensure_footer_fits` is set.
pub(crate) fn render_footer(
    ctx: &mut SectionContext<'_>,
    service_provider: Option<&str>,
    contact: Option<&str>,
    stamp: &str,
) {
    let g = ctx.geometry;
    if ctx.compat.ensure_footer_fits && ctx.cursor.remaining_height() < g.footer_height {
        ctx.page_break("footer");
    }
    let page = ctx.cursor.page_index();
    let rule_y = g.content_bottom() - g.footer_height;
    ctx.canvas.push(
        page,
        DrawOp::Line {
            x1: g.content_left(),
            y1: rule_y,
            x2: g.content_right(),
            y2: rule_y,
            color: ctx.palette.rule,
            line_width: Length::from_f32(0.3),
        },
    );
    let style = TextStyle {
        font_size: g.footer_font_size,
        bold: false,
        color: ctx.palette.muted,
    };
    let first_line = rule_y + g.footer_height.mul_ratio(5, 12);
    if let Some(provider) = service_provider {
        ctx.draw_text(page, g.content_left(), first_line, provider, &style);
    }
    let stamp_width = ctx.measurer.measure_width(stamp, g.footer_font_size);
    let stamp_x = (g.content_right() - stamp_width).max(g.content_left());
    ctx.draw_text(page, stamp_x, first_line, stamp, &style);
    if let Some(contact) = contact {
        let second_line = rule_y + g.footer_height.mul_ratio(9, 12);
        ctx.draw_text(page, g.content_left(), second_line, contact, &style);
    }
}
