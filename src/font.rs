use crate::error::NoticeError;
use crate::measure::{MM_PER_POINT, TextMeasurer};
use crate::types::Length;
use rustybuzz::{Direction as HbDirection, Face as HbFace, UnicodeBuffer};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

const FIRST_CHAR: u32 = 32;
const LAST_CHAR: u32 = 255;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct TextWidthKey {
    size_milli: i64,
    text: String,
}

#[derive(Debug)]
struct TextWidthCache {
    map: HashMap<TextWidthKey, Length>,
    order: VecDeque<TextWidthKey>,
    max_entries: usize,
}

impl TextWidthCache {
    fn new(max_entries: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            max_entries,
        }
    }

    fn get(&self, key: &TextWidthKey) -> Option<Length> {
        self.map.get(key).copied()
    }

    fn insert(&mut self, key: TextWidthKey, value: Length) {
        if self.map.contains_key(&key) {
            return;
        }
        self.map.insert(key.clone(), value);
        self.order.push_back(key);
        while self.map.len() > self.max_entries {
            if let Some(old) = self.order.pop_front() {
                self.map.remove(&old);
            } else {
                break;
            }
        }
    }
}

/// Advance widths for the Latin-1 range, in 1/1000 em.
#[derive(Debug)]
struct LatinMetrics {
    widths: Vec<u16>,
    missing_width: u16,
    ascent: i16,
    descent: i16,
    line_gap: i16,
}

impl LatinMetrics {
    fn from_face(face: &ttf_parser::Face<'_>) -> Self {
        let scale = 1000.0 / face.units_per_em().max(1) as f32;
        let mut widths = Vec::with_capacity((LAST_CHAR - FIRST_CHAR + 1) as usize);
        for code in FIRST_CHAR..=LAST_CHAR {
            let advance = char::from_u32(code)
                .and_then(|ch| face.glyph_index(ch))
                .and_then(|id| face.glyph_hor_advance(id))
                .unwrap_or(0);
            let scaled = (advance as f32 * scale).round() as i32;
            widths.push(scaled.clamp(0, u16::MAX as i32) as u16);
        }
        let missing_width = widths.first().copied().unwrap_or(0);
        Self {
            widths,
            missing_width,
            ascent: scale_i16(face.ascender(), scale),
            descent: scale_i16(face.descender(), scale),
            line_gap: scale_i16(face.line_gap(), scale),
        }
    }

    fn covers(&self, text: &str) -> bool {
        text.chars()
            .all(|ch| (FIRST_CHAR..=LAST_CHAR).contains(&(ch as u32)))
    }

    fn width_units(&self, text: &str) -> i32 {
        let mut total: i32 = 0;
        for ch in text.chars() {
            let code = ch as u32;
            let adv = if (FIRST_CHAR..=LAST_CHAR).contains(&code) {
                self.widths
                    .get((code - FIRST_CHAR) as usize)
                    .copied()
                    .unwrap_or(self.missing_width)
            } else {
                self.missing_width
            };
            total = total.saturating_add(adv as i32);
        }
        total
    }
}

/// Text measurer backed by a TrueType/OpenType font program.
///
/// Latin-1 text is measured from a cached advance table; anything else is
/// shaped with rustybuzz so ligatures and contextual forms are accounted for.
#[derive(Debug)]
pub struct FontMeasurer {
    name: String,
    data: Vec<u8>,
    metrics: LatinMetrics,
    units_per_point: f32,
    cache: Mutex<TextWidthCache>,
}

impl FontMeasurer {
    pub fn from_bytes(data: Vec<u8>, source_name: Option<&str>) -> Result<Self, NoticeError> {
        let source = source_name.unwrap_or("EmbeddedFont");
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|err| NoticeError::Asset(format!("invalid font data for {source}: {err}")))?;
        let metrics = LatinMetrics::from_face(&face);
        let name = font_name(&face).unwrap_or_else(|| source.to_string());
        drop(face);
        Ok(Self {
            name,
            data,
            metrics,
            units_per_point: MM_PER_POINT,
            cache: Mutex::new(TextWidthCache::new(20_000)),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, NoticeError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let stem = path.file_stem().and_then(|v| v.to_str());
        Self::from_bytes(data, stem)
    }

    pub fn with_units_per_point(mut self, units_per_point: f32) -> Self {
        self.units_per_point = units_per_point;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recommended baseline-to-baseline distance for `font_size`, in document units.
    pub fn line_height(&self, font_size: f32) -> Length {
        let height_1000 = self.metrics.ascent as i32 - self.metrics.descent as i32
            + self.metrics.line_gap as i32;
        if height_1000 <= 0 {
            return Length::ZERO;
        }
        self.points(font_size).mul_ratio(i64::from(height_1000), 1000)
    }

    fn points(&self, font_size: f32) -> Length {
        Length::from_f32(font_size * self.units_per_point)
    }

    fn shaped_width_units(&self, text: &str) -> Option<i32> {
        let face = HbFace::from_slice(&self.data, 0)?;
        let units_per_em = face.units_per_em().max(1) as i64;
        let mut buffer = UnicodeBuffer::new();
        buffer.set_direction(detect_direction(text));
        buffer.push_str(text);
        let output = rustybuzz::shape(&face, &[], buffer);
        let positions = output.glyph_positions();
        if positions.is_empty() {
            return None;
        }
        let mut total: i32 = 0;
        for pos in positions {
            let adv = (((pos.x_advance as i64) * 1000 + (units_per_em / 2)) / units_per_em) as i32;
            total = total.saturating_add(adv);
        }
        Some(total)
    }
}

impl TextMeasurer for FontMeasurer {
    fn measure_width(&self, text: &str, font_size: f32) -> Length {
        if text.is_empty() {
            return Length::ZERO;
        }
        let key = TextWidthKey {
            size_milli: (font_size as f64 * 1000.0).round() as i64,
            text: text.to_string(),
        };
        if let Ok(cache) = self.cache.lock() {
            if let Some(value) = cache.get(&key) {
                return value;
            }
        }
        let units = if self.metrics.covers(text) {
            self.metrics.width_units(text)
        } else {
            self.shaped_width_units(text)
                .unwrap_or_else(|| self.metrics.width_units(text))
        };
        let value = if units <= 0 {
            Length::ZERO
        } else {
            self.points(font_size).mul_ratio(i64::from(units), 1000)
        };
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, value);
        }
        value
    }
}

fn detect_direction(text: &str) -> HbDirection {
    for ch in text.chars() {
        let code = ch as u32;
        let rtl = matches!(
            code,
            0x0590..=0x08FF
                | 0xFB1D..=0xFDFF
                | 0xFE70..=0xFEFF
                | 0x1EE00..=0x1EEFF
        );
        if rtl {
            return HbDirection::RightToLeft;
        }
    }
    HbDirection::LeftToRight
}

fn scale_i16(value: i16, scale: f32) -> i16 {
    let scaled = (value as f32 * scale).round() as i32;
    scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn font_name(face: &ttf_parser::Face<'_>) -> Option<String> {
    use ttf_parser::name::name_id;

    let mut family = None;
    let mut post = None;
    for entry in face.names() {
        let Some(name) = entry.to_string() else {
            continue;
        };
        match entry.name_id {
            name_id::POST_SCRIPT_NAME if post.is_none() => post = Some(name),
            name_id::TYPOGRAPHIC_FAMILY | name_id::FAMILY if family.is_none() => {
                family = Some(name)
            }
            _ => {}
        }
    }
    post.or(family)
}
