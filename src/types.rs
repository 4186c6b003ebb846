use fixed::types::I32F32;
use serde::Deserialize;

/// Layout length in document units, quantized to 1/1000 of a unit.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Length(I32F32);

impl Length {
    pub const ZERO: Length = Length(I32F32::from_bits(0));

    pub fn from_f32(value: f32) -> Length {
        if !value.is_finite() {
            return Length::ZERO;
        }
        let milli = (value as f64 * 1000.0).round();
        Length::from_milli(milli.clamp(i64::MIN as f64, i64::MAX as f64) as i128)
    }

    pub fn from_i32(value: i32) -> Length {
        Length::from_milli(value as i128 * 1000)
    }

    pub fn to_f32(self) -> f32 {
        self.0.to_num()
    }

    pub fn to_milli_i64(self) -> i64 {
        let bits = self.0.to_bits() as i128;
        let denom = 1i128 << 32;
        let scaled = bits * 1000;
        let adj = if scaled >= 0 { denom / 2 } else { -denom / 2 };
        let milli = (scaled + adj) / denom;
        milli.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    fn from_milli(milli: i128) -> Length {
        let denom = 1i128 << 32;
        let adj = if milli >= 0 { 500 } else { -500 };
        let bits = (milli * denom + adj) / 1000;
        let bits = bits.clamp(i64::MIN as i128, i64::MAX as i128) as i64;
        Length(I32F32::from_bits(bits))
    }

    /// How many whole `step`s fit into `self`. Zero for non-positive inputs.
    pub fn whole_steps(self, step: Length) -> usize {
        let step = step.to_milli_i64();
        let total = self.to_milli_i64();
        if step <= 0 || total <= 0 {
            return 0;
        }
        (total / step) as usize
    }

    pub fn mul_ratio(self, num: i64, denom: i64) -> Length {
        if denom == 0 {
            return Length::ZERO;
        }
        let milli = self.to_milli_i64() as i128;
        let value = div_round_i128(milli.saturating_mul(num as i128), denom as i128);
        Length::from_milli(value)
    }
}

impl std::ops::Add for Length {
    type Output = Length;
    fn add(self, rhs: Length) -> Length {
        Length::from_milli(self.to_milli_i64() as i128 + rhs.to_milli_i64() as i128)
    }
}

impl std::ops::AddAssign for Length {
    fn add_assign(&mut self, rhs: Length) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Length {
    type Output = Length;
    fn sub(self, rhs: Length) -> Length {
        Length::from_milli(self.to_milli_i64() as i128 - rhs.to_milli_i64() as i128)
    }
}

impl std::ops::Div<i32> for Length {
    type Output = Length;
    fn div(self, rhs: i32) -> Length {
        if rhs == 0 {
            Length::ZERO
        } else {
            let milli = self.to_milli_i64() as i128;
            Length::from_milli(div_round_i128(milli, rhs as i128))
        }
    }
}

fn div_round_i128(num: i128, den: i128) -> i128 {
    if den == 0 {
        return 0;
    }
    let den_abs = den.abs();
    if num >= 0 {
        (num + (den_abs / 2)) / den
    } else {
        -(((-num) + (den_abs / 2)) / den)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: Length,
    pub height: Length,
}

impl Size {
    /// A4 portrait in millimetres.
    pub fn a4_mm() -> Self {
        Self {
            width: Length::from_i32(210),
            height: Length::from_i32(297),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }
}
