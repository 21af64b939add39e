//! Q16.16 saturating fixed-point scalar.
//!
//! All kinematic quantities in the engine (position in meters, velocity in
//! m/s) are signed Q16.16: an `i32` holding 16 integer and 16 fractional
//! bits. Arithmetic clamps to the representable range instead of wrapping;
//! intermediate products widen to 64/128 bits before truncation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// Number of fractional bits in the Q16.16 format.
pub const FRAC_BITS: u32 = 16;

/// Signed Q16.16 fixed-point value. Wraps the raw `i32` representation.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fixed(i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(1 << FRAC_BITS);
    pub const MAX: Fixed = Fixed(i32::MAX);
    pub const MIN: Fixed = Fixed(i32::MIN);

    /// Construct from the raw two's-complement Q16.16 bit pattern.
    pub const fn from_raw(raw: i32) -> Self {
        Fixed(raw)
    }

    /// Raw Q16.16 bit pattern.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Construct from an integer number of units, saturating at the format
    /// limits (±32768).
    pub fn from_int(v: i32) -> Self {
        let raw = (v as i64) << FRAC_BITS;
        Fixed(raw.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }

    /// Quantize a float, returning `None` if it is non-finite or falls
    /// outside the Q16.16 range. This is the validator's representability
    /// check for incoming report fields.
    pub fn try_from_f64(v: f64) -> Option<Self> {
        if !v.is_finite() {
            return None;
        }
        let scaled = (v * (1u32 << FRAC_BITS) as f64).round();
        if scaled < i32::MIN as f64 || scaled > i32::MAX as f64 {
            return None;
        }
        Some(Fixed(scaled as i32))
    }

    /// Quantize a float, saturating out-of-range values (non-finite maps to
    /// the nearest limit, NaN to zero). Simulation/test helper.
    pub fn from_f64(v: f64) -> Self {
        if v.is_nan() {
            return Fixed::ZERO;
        }
        let scaled = (v * (1u32 << FRAC_BITS) as f64).round();
        if scaled <= i32::MIN as f64 {
            Fixed::MIN
        } else if scaled >= i32::MAX as f64 {
            Fixed::MAX
        } else {
            Fixed(scaled as i32)
        }
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / (1u32 << FRAC_BITS) as f64
    }

    pub fn abs(self) -> Self {
        // i32::MIN has no positive counterpart; clamp to MAX.
        if self.0 == i32::MIN {
            Fixed::MAX
        } else {
            Fixed(self.0.abs())
        }
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Fixed(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Fixed(self.0.saturating_sub(rhs.0))
    }

    /// Saturating Q16.16 multiply: full-precision 64-bit product truncated
    /// back by the fractional width, then clamped.
    pub fn saturating_mul(self, rhs: Self) -> Self {
        let full = self.0 as i64 * rhs.0 as i64;
        let raw = full >> FRAC_BITS;
        Fixed(raw.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }

    /// Saturating Q16.16 divide. Division by zero saturates toward the sign
    /// of the numerator (0/0 is zero).
    pub fn saturating_div(self, rhs: Self) -> Self {
        if rhs.0 == 0 {
            return match self.0.signum() {
                1 => Fixed::MAX,
                -1 => Fixed::MIN,
                _ => Fixed::ZERO,
            };
        }
        let raw = ((self.0 as i64) << FRAC_BITS) / rhs.0 as i64;
        Fixed(raw.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }

    /// Fixed-point square root. Negative inputs clamp to zero.
    ///
    /// For raw value `r = x·2¹⁶`, `isqrt(r·2¹⁶) = √x·2¹⁶`, so a single
    /// 64-bit integer square root yields the Q16.16 result directly.
    pub fn sqrt(self) -> Self {
        if self.0 <= 0 {
            return Fixed::ZERO;
        }
        let wide = (self.0 as u64) << FRAC_BITS;
        Fixed(isqrt_u64(wide) as i32)
    }
}

/// Integer square root by Newton iteration (floor of √n).
pub fn isqrt_u64(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let mut x = n;
    let mut y = (x + 1) >> 1;
    while y < x {
        x = y;
        y = (x + n / x) >> 1;
    }
    x
}

// Operator sugar for the common cases; both saturate like the named methods.

impl Add for Fixed {
    type Output = Fixed;
    fn add(self, rhs: Fixed) -> Fixed {
        self.saturating_add(rhs)
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    fn sub(self, rhs: Fixed) -> Fixed {
        self.saturating_sub(rhs)
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    fn neg(self) -> Fixed {
        Fixed(0).saturating_sub(self)
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({:.4})", self.to_f64())
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.to_f64())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
