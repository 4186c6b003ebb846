use crate::types::Length;
use std::collections::HashMap;

/// Millimetres per typographic point.
pub const MM_PER_POINT: f32 = 25.4 / 72.0;

/// Text width provider used for line fitting.
///
/// Widths are returned in document units for a font size given in points.
/// Implementations must be deterministic for a given text and size.
pub trait TextMeasurer: Send + Sync {
    fn measure_width(&self, text: &str, font_size: f32) -> Length;

    /// Greedy word wrap to `max_width`.
    ///
    /// Explicit newlines always break; runs of whitespace collapse to one
    /// space; a word wider than the line is split by characters. At least one
    /// (possibly empty) line is always returned.
    fn wrap(&self, text: &str, max_width: Length, font_size: f32) -> Vec<String> {
        wrap_greedy(text, max_width, |s| self.measure_width(s, font_size))
    }
}

pub(crate) fn wrap_greedy<F>(text: &str, max_width: Length, mut measure: F) -> Vec<String>
where
    F: FnMut(&str) -> Length,
{
    let max_width = max_width.max(Length::from_f32(0.001));
    let mut lines = Vec::new();
    let space_width = measure(" ");
    let mut word_widths: HashMap<&str, Length> = HashMap::new();
    for segment in text.split('\n') {
        if segment.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        let mut current_width = Length::ZERO;
        for word in segment.split_whitespace() {
            let word_width = match word_widths.get(word) {
                Some(value) => *value,
                None => {
                    let value = measure(word);
                    word_widths.insert(word, value);
                    value
                }
            };
            if current.is_empty() {
                if word_width > max_width {
                    lines.extend(split_long_word(word, max_width, &mut measure));
                } else {
                    current.push_str(word);
                    current_width = word_width;
                }
                continue;
            }
            let next_width = current_width + space_width + word_width;
            if next_width <= max_width {
                current.push(' ');
                current.push_str(word);
                current_width = next_width;
            } else {
                lines.push(std::mem::take(&mut current));
                current_width = Length::ZERO;
                if word_width > max_width {
                    lines.extend(split_long_word(word, max_width, &mut measure));
                } else {
                    current.push_str(word);
                    current_width = word_width;
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn split_long_word<F>(word: &str, max_width: Length, measure: &mut F) -> Vec<String>
where
    F: FnMut(&str) -> Length,
{
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_width = Length::ZERO;
    let mut char_widths: HashMap<char, Length> = HashMap::new();
    let mut buf = [0u8; 4];
    for ch in word.chars() {
        let w = match char_widths.get(&ch) {
            Some(value) => *value,
            None => {
                let glyph: &str = ch.encode_utf8(&mut buf);
                let value = measure(glyph);
                char_widths.insert(ch, value);
                value
            }
        };
        let mut next_width = current_width + w;
        if !current.is_empty() && next_width > max_width {
            parts.push(std::mem::take(&mut current));
            next_width = w;
        }
        current.push(ch);
        current_width = next_width;
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Every character advances by the same fraction of the em.
///
/// Used when no font program is registered; deterministic across platforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvanceMeasurer {
    em_fraction: f32,
    units_per_point: f32,
}

impl FixedAdvanceMeasurer {
    pub fn new(em_fraction: f32, units_per_point: f32) -> Self {
        Self {
            em_fraction,
            units_per_point,
        }
    }
}

impl Default for FixedAdvanceMeasurer {
    fn default() -> Self {
        Self::new(0.5, MM_PER_POINT)
    }
}

impl TextMeasurer for FixedAdvanceMeasurer {
    fn measure_width(&self, text: &str, font_size: f32) -> Length {
        let advance = Length::from_f32(font_size * self.em_fraction * self.units_per_point);
        advance.mul_ratio(text.chars().count() as i64, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One unit per character, independent of font size.
    struct CharCount;

    impl TextMeasurer for CharCount {
        fn measure_width(&self, text: &str, _font_size: f32) -> Length {
            Length::from_i32(text.chars().count() as i32)
        }
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = CharCount.wrap("the quick brown fox jumps", Length::from_i32(10), 11.0);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn keeps_explicit_newlines_and_blank_lines() {
        let lines = CharCount.wrap("one\n\ntwo  three", Length::from_i32(20), 11.0);
        assert_eq!(lines, vec!["one", "", "two three"]);
    }

    #[test]
    fn splits_words_wider_than_the_line() {
        let lines = CharCount.wrap("ab abcdefghij", Length::from_i32(4), 11.0);
        assert_eq!(lines, vec!["ab", "abcd", "efgh", "ij"]);
    }

    #[test]
    fn empty_text_yields_one_empty_line() {
        assert_eq!(CharCount.wrap("", Length::from_i32(4), 11.0), vec![String::new()]);
    }

    #[test]
    fn wrap_is_deterministic() {
        let m = FixedAdvanceMeasurer::default();
        let text = "Crews will be working on the north elevation balconies. ".repeat(12);
        let a = m.wrap(&text, Length::from_i32(170), 11.0);
        let b = m.wrap(&text, Length::from_i32(170), 11.0);
        assert_eq!(a, b);
        assert!(a.len() > 1);
    }

    #[test]
    fn fixed_advance_scales_with_font_size() {
        let m = FixedAdvanceMeasurer::new(0.5, 1.0);
        assert_eq!(m.measure_width("abcd", 10.0), Length::from_i32(20));
        assert_eq!(m.measure_width("abcd", 20.0), Length::from_i32(40));
    }
}
