use crate::error::NoticeError;
use crate::types::{Color, Length, Size};
use serde::Deserialize;

/// Page geometry and typography, in document units (millimetres by default)
/// except font sizes, which are in points.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub logo_height: f32,
    pub logo_gap: f32,
    pub title_banner_height: f32,
    pub title_banner_gap: f32,
    pub title_line_height: f32,
    pub label_line_height: f32,
    pub date_banner_height: f32,
    pub date_banner_gap: f32,
    pub body_line_height: f32,
    pub body_gap: f32,
    pub schedule_header_height: f32,
    pub schedule_header_gap: f32,
    pub day_label_height: f32,
    pub slot_line_height: f32,
    pub day_gap: f32,
    pub day_min_remaining: f32,
    pub footer_height: f32,
    pub title_font_size: f32,
    pub banner_font_size: f32,
    pub label_font_size: f32,
    pub body_font_size: f32,
    pub schedule_font_size: f32,
    pub footer_font_size: f32,
    /// Document units per typographic point; converts font sizes for measurers.
    pub units_per_point: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin: 20.0,
            logo_height: 15.0,
            logo_gap: 5.0,
            title_banner_height: 16.0,
            title_banner_gap: 8.0,
            title_line_height: 8.0,
            label_line_height: 6.0,
            date_banner_height: 20.0,
            date_banner_gap: 8.0,
            body_line_height: 6.0,
            body_gap: 6.0,
            schedule_header_height: 8.0,
            schedule_header_gap: 4.0,
            day_label_height: 6.0,
            slot_line_height: 5.0,
            day_gap: 4.0,
            day_min_remaining: 50.0,
            footer_height: 12.0,
            title_font_size: 18.0,
            banner_font_size: 14.0,
            label_font_size: 10.0,
            body_font_size: 11.0,
            schedule_font_size: 10.0,
            footer_font_size: 8.0,
            units_per_point: 25.4 / 72.0,
        }
    }
}

impl LayoutConfig {
    /// Validate every value and convert to fixed-point geometry.
    pub fn resolve(&self) -> Result<Geometry, NoticeError> {
        let positive = [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("logo_height", self.logo_height),
            ("title_banner_height", self.title_banner_height),
            ("title_line_height", self.title_line_height),
            ("label_line_height", self.label_line_height),
            ("date_banner_height", self.date_banner_height),
            ("body_line_height", self.body_line_height),
            ("schedule_header_height", self.schedule_header_height),
            ("day_label_height", self.day_label_height),
            ("slot_line_height", self.slot_line_height),
            ("footer_height", self.footer_height),
            ("title_font_size", self.title_font_size),
            ("banner_font_size", self.banner_font_size),
            ("label_font_size", self.label_font_size),
            ("body_font_size", self.body_font_size),
            ("schedule_font_size", self.schedule_font_size),
            ("footer_font_size", self.footer_font_size),
            ("units_per_point", self.units_per_point),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(NoticeError::InvalidArgument(format!(
                    "{name} must be finite and positive, got {value}"
                )));
            }
        }
        let non_negative = [
            ("margin", self.margin),
            ("logo_gap", self.logo_gap),
            ("title_banner_gap", self.title_banner_gap),
            ("date_banner_gap", self.date_banner_gap),
            ("body_gap", self.body_gap),
            ("schedule_header_gap", self.schedule_header_gap),
            ("day_gap", self.day_gap),
            ("day_min_remaining", self.day_min_remaining),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(NoticeError::InvalidArgument(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }

        let content_width = self.page_width - 2.0 * self.margin;
        let content_height = self.page_height - 2.0 * self.margin;
        if content_width <= 0.0 || content_height <= 0.0 {
            return Err(NoticeError::InvalidArgument(format!(
                "margin {} leaves no content area on a {}x{} page",
                self.margin, self.page_width, self.page_height
            )));
        }
        let line_heights = [
            ("title_line_height", self.title_line_height),
            ("body_line_height", self.body_line_height),
            ("slot_line_height", self.slot_line_height),
        ];
        for (name, value) in line_heights {
            if value > content_height {
                return Err(NoticeError::InvalidArgument(format!(
                    "{name} {value} exceeds the content height {content_height}"
                )));
            }
        }

        let len = Length::from_f32;
        Ok(Geometry {
            page_size: Size {
                width: len(self.page_width),
                height: len(self.page_height),
            },
            margin: len(self.margin),
            logo_height: len(self.logo_height),
            logo_gap: len(self.logo_gap),
            title_banner_height: len(self.title_banner_height),
            title_banner_gap: len(self.title_banner_gap),
            title_line_height: len(self.title_line_height),
            label_line_height: len(self.label_line_height),
            date_banner_height: len(self.date_banner_height),
            date_banner_gap: len(self.date_banner_gap),
            body_line_height: len(self.body_line_height),
            body_gap: len(self.body_gap),
            schedule_header_height: len(self.schedule_header_height),
            schedule_header_gap: len(self.schedule_header_gap),
            day_label_height: len(self.day_label_height),
            slot_line_height: len(self.slot_line_height),
            day_gap: len(self.day_gap),
            day_min_remaining: len(self.day_min_remaining),
            footer_height: len(self.footer_height),
            title_font_size: self.title_font_size,
            banner_font_size: self.banner_font_size,
            label_font_size: self.label_font_size,
            body_font_size: self.body_font_size,
            schedule_font_size: self.schedule_font_size,
            footer_font_size: self.footer_font_size,
            units_per_point: self.units_per_point,
        })
    }
}

/// Validated geometry used during one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub page_size: Size,
    pub margin: Length,
    pub logo_height: Length,
    pub logo_gap: Length,
    pub title_banner_height: Length,
    pub title_banner_gap: Length,
    pub title_line_height: Length,
    pub label_line_height: Length,
    pub date_banner_height: Length,
    pub date_banner_gap: Length,
    pub body_line_height: Length,
    pub body_gap: Length,
    pub schedule_header_height: Length,
    pub schedule_header_gap: Length,
    pub day_label_height: Length,
    pub slot_line_height: Length,
    pub day_gap: Length,
    pub day_min_remaining: Length,
    pub footer_height: Length,
    pub title_font_size: f32,
    pub banner_font_size: f32,
    pub label_font_size: f32,
    pub body_font_size: f32,
    pub schedule_font_size: f32,
    pub footer_font_size: f32,
    pub units_per_point: f32,
}

impl Geometry {
    pub fn content_left(&self) -> Length {
        self.margin
    }

    pub fn content_right(&self) -> Length {
        self.page_size.width - self.margin
    }

    pub fn content_width(&self) -> Length {
        self.page_size.width - self.margin - self.margin
    }

    pub fn content_bottom(&self) -> Length {
        self.page_size.height - self.margin
    }

    /// Font size in points expressed in document units, used for baselines.
    pub fn font_height(&self, font_size: f32) -> Length {
        Length::from_f32(font_size * self.units_per_point)
    }
}

/// Opt-in corrections for two layout behaviours that are kept by default
/// for output compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct LayoutCompat {
    /// Start a new page when the footer would not fit below the cursor.
    pub ensure_footer_fits: bool,
    /// Re-draw the schedule header band after every page break in the table.
    pub repeat_schedule_header: bool,
}

impl LayoutCompat {
    /// Both corrections on.
    pub fn strict() -> Self {
        Self {
            ensure_footer_fits: true,
            repeat_schedule_header: true,
        }
    }
}

/// Colours resolved by the caller's branding layer.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub accent: Color,
    pub on_accent: Color,
    pub banner_fill: Color,
    pub banner_border: Color,
    pub text: Color,
    pub muted: Color,
    pub rule: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            accent: Color::from_rgb8(0x9b, 0x1c, 0x1c),
            on_accent: Color::WHITE,
            banner_fill: Color::from_rgb8(0xfd, 0xf2, 0xf2),
            banner_border: Color::from_rgb8(0x9b, 0x1c, 0x1c),
            text: Color::BLACK,
            muted: Color::from_rgb8(0x6b, 0x72, 0x80),
            rule: Color::from_rgb8(0xd1, 0xd5, 0xdb),
        }
    }
}
