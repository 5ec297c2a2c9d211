// Mediatime
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

use crate::errors::{Error, Result};

/// The number of ticks per second in the default (microsecond) timebase.
pub const TIME_BASE: i32 = 1_000_000;

/// The default timebase, one microsecond per tick.
pub const TIME_BASE_Q: Rational = Rational { num: 1, den: TIME_BASE };

/// A `Rational` is an exact fraction of two 32-bit integers. When used as a timebase it is the
/// length in seconds of one tick.
///
/// The fraction is never reduced implicitly. Arithmetic on two rationals multiplies numerators
/// and denominators directly, and the 32-bit components wrap on overflow. Use
/// [`Rational::reduce`] to reduce a fraction explicitly.
///
/// The `0/0` rational, [`Rational::ZERO`], is an "undefined" sentinel. It is equal to itself, but
/// is not ordered relative to any other rational, and rescaling into or out of it yields `0`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Rational {
    /// The numerator.
    pub num: i32,
    /// The denominator.
    pub den: i32,
}

impl Rational {
    /// The undefined `0/0` rational.
    pub const ZERO: Rational = Rational { num: 0, den: 0 };

    /// Creates a new `Rational`. No reduction is performed.
    #[inline]
    pub const fn new(num: i32, den: i32) -> Self {
        Rational { num, den }
    }

    /// Returns `true` if this is the undefined `0/0` rational.
    #[inline]
    pub const fn is_undefined(&self) -> bool {
        self.num == 0 && self.den == 0
    }

    /// Converts the rational to a floating point value.
    ///
    /// A zero denominator yields an infinity or NaN.
    #[inline]
    pub fn to_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Swaps the numerator and denominator.
    #[inline]
    pub const fn invert(self) -> Self {
        Rational { num: self.den, den: self.num }
    }

    /// Reduces the fraction by the greatest common divisor of its components. The sign is moved
    /// to the numerator.
    pub fn reduce(self) -> Self {
        let (num, den, _) =
            reduce_bounded(i128::from(self.num), i128::from(self.den), MAX_I32, MAX_I32);

        Rational { num: num as i32, den: den as i32 }
    }

    /// Finds the closest rational to `value` whose numerator and denominator do not exceed `max`
    /// in magnitude.
    ///
    /// NaN converts to [`Rational::ZERO`], and infinities convert to `±1/0`.
    pub fn from_f64(value: f64, max: i32) -> Self {
        if value.is_nan() {
            return Rational::ZERO;
        }

        if value.is_infinite() {
            return Rational::new(if value < 0.0 { -1 } else { 1 }, 0);
        }

        let max = i128::from(max.max(1));

        // Beyond the bound the best approximation is the bound itself.
        if value.abs() > max as f64 + 0.5 {
            let num = if value < 0.0 { -max } else { max };
            return Rational::new(num as i32, 1);
        }

        // Scale the value to a 61-bit integer fraction, the remaining precision of an f64 mantissa
        // is preserved by choosing the exponent of the scale from the magnitude of the value.
        let exponent = (frexp_exponent(value) - 1).max(0);
        let den = 1i128 << (61 - exponent);
        let num = (value * den as f64).round() as i128;

        let (num, den, _) = reduce_bounded(num, den, max, max);

        Rational { num: num as i32, den: den as i32 }
    }

    /// Converts `value`, expressed in ticks of this timebase, into the equivalent number of ticks
    /// of the timebase `dst`.
    ///
    /// The computation is `value * self.num * dst.den / (self.den * dst.num)` using a 128-bit
    /// intermediate and rounding to the nearest tick (halfway cases away from zero). The result
    /// saturates to `±i64::MAX`. There is no error return: if either timebase has a zero component
    /// that would make the conversion undefined, `0` is returned.
    pub fn rescale(&self, value: i64, dst: Rational) -> i64 {
        if self.num == dst.num && self.den == dst.den {
            return value;
        }

        let b = i128::from(self.num) * i128::from(dst.den);
        let c = i128::from(self.den) * i128::from(dst.num);

        if c == 0 {
            return 0;
        }

        clamp_i64(div_round(i128::from(value) * b, c))
    }

    /// Compares two rationals by cross multiplication.
    ///
    /// Returns `None` if the comparison is undefined, which only happens when a zero denominator
    /// is involved and the comparison cannot be decided from the numerators.
    fn compare(&self, other: &Rational) -> Option<Ordering> {
        let lhs = i64::from(self.num) * i64::from(other.den);
        let rhs = i64::from(other.num) * i64::from(self.den);

        if lhs != rhs {
            // The sign of the difference flips once for every negative denominator.
            let less = (lhs < rhs) ^ (self.den < 0) ^ (other.den < 0);
            Some(if less { Ordering::Less } else { Ordering::Greater })
        }
        else if self.den != 0 && other.den != 0 {
            Some(Ordering::Equal)
        }
        else if self.num != 0 && other.num != 0 {
            // Both are infinities, order them by sign.
            Some((other.num < 0).cmp(&(self.num < 0)))
        }
        else {
            None
        }
    }
}

impl PartialEq for Rational {
    fn eq(&self, other: &Self) -> bool {
        if self.is_undefined() && other.is_undefined() {
            return true;
        }

        self.compare(other) == Some(Ordering::Equal)
    }
}

impl Eq for Rational {}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.is_undefined() && other.is_undefined() {
            return Some(Ordering::Equal);
        }

        self.compare(other)
    }
}

impl Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Rational) -> Rational {
        Rational {
            num: self.num.wrapping_mul(rhs.den).wrapping_add(rhs.num.wrapping_mul(self.den)),
            den: self.den.wrapping_mul(rhs.den),
        }
    }
}

impl Sub for Rational {
    type Output = Rational;

    fn sub(self, rhs: Rational) -> Rational {
        Rational {
            num: self.num.wrapping_mul(rhs.den).wrapping_sub(rhs.num.wrapping_mul(self.den)),
            den: self.den.wrapping_mul(rhs.den),
        }
    }
}

impl Mul for Rational {
    type Output = Rational;

    fn mul(self, rhs: Rational) -> Rational {
        Rational { num: self.num.wrapping_mul(rhs.num), den: self.den.wrapping_mul(rhs.den) }
    }
}

impl Div for Rational {
    type Output = Rational;

    fn div(self, rhs: Rational) -> Rational {
        Rational { num: self.num.wrapping_mul(rhs.den), den: self.den.wrapping_mul(rhs.num) }
    }
}

impl From<Rational> for f64 {
    fn from(value: Rational) -> Self {
        value.to_f64()
    }
}

impl From<(i32, i32)> for Rational {
    fn from((num, den): (i32, i32)) -> Self {
        Rational::new(num, den)
    }
}

impl From<i32> for Rational {
    fn from(num: i32) -> Self {
        Rational::new(num, 1)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl FromStr for Rational {
    type Err = Error;

    /// Parses `"num/den"` or a plain integer `"num"` (denominator 1).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        let (num, den) = match s.split_once('/') {
            Some((num, den)) => (num.trim(), den.trim()),
            None => (s, "1"),
        };

        match (num.parse::<i32>(), den.parse::<i32>()) {
            (Ok(num), Ok(den)) => Ok(Rational::new(num, den)),
            _ => Err(Error::InvalidParameters("malformed rational")),
        }
    }
}

const MAX_I32: i128 = i32::MAX as i128;

/// Gets the binary exponent `e` of `value` such that `value = m * 2^e` with `0.5 <= |m| < 1`.
fn frexp_exponent(value: f64) -> i32 {
    if value == 0.0 {
        return 0;
    }

    let bits = value.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;

    if biased == 0 {
        // Subnormal. Normalize first.
        frexp_exponent(value * (1u64 << 54) as f64) - 54
    }
    else {
        biased - 1022
    }
}

/// Divides `n` by `d`, rounding to the nearest integer with halfway cases away from zero.
pub(crate) fn div_round(n: i128, d: i128) -> i128 {
    let (n, d) = if d < 0 { (-n, -d) } else { (n, d) };

    if n >= 0 {
        (n + d / 2) / d
    }
    else {
        -((-n + d / 2) / d)
    }
}

/// Clamps a wide intermediate to the `i64` range, excluding `i64::MIN` which is reserved as the
/// raw "no timestamp" sentinel.
pub(crate) fn clamp_i64(value: i128) -> i64 {
    value.clamp(-i128::from(i64::MAX), i128::from(i64::MAX)) as i64
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.abs()
}

/// Reduces the fraction `num/den` so that the magnitude of the numerator does not exceed
/// `max_num` and the denominator does not exceed `max_den`.
///
/// If the reduced fraction does not fit, the closest approximation satisfying the bounds is
/// found from the continued fraction expansion of `num/den`. The sign is moved to the numerator.
/// Returns the numerator, the denominator, and `true` if the result is exact.
pub(crate) fn reduce_bounded(
    num: i128,
    den: i128,
    max_num: i128,
    max_den: i128,
) -> (i128, i128, bool) {
    let negative = (num < 0) ^ (den < 0);

    let mut num = num.abs();
    let mut den = den.abs();

    let g = gcd(num, den);

    if g != 0 {
        num /= g;
        den /= g;
    }

    let sign = |n: i128| if negative { -n } else { n };

    if num <= max_num && den <= max_den {
        return (sign(num), den, true);
    }

    // Convergents a0 and a1 of the continued fraction.
    let (mut a0n, mut a0d) = (0i128, 1i128);
    let (mut a1n, mut a1d) = (1i128, 0i128);

    while den != 0 {
        let x = num / den;
        let next_den = num - den * x;

        let a2n = x.checked_mul(a1n).and_then(|v| v.checked_add(a0n));
        let a2d = x.checked_mul(a1d).and_then(|v| v.checked_add(a0d));

        let fits = match (a2n, a2d) {
            (Some(n), Some(d)) => n <= max_num && d <= max_den,
            _ => false,
        };

        if !fits {
            // Take the largest semi-convergent that fits, if it is closer than the last
            // convergent.
            let mut x = i128::MAX;
            if a1n != 0 {
                x = (max_num - a0n) / a1n;
            }
            if a1d != 0 {
                x = x.min((max_den - a0d) / a1d);
            }

            let lhs = x
                .checked_mul(2 * a1d)
                .and_then(|v| v.checked_add(a0d))
                .and_then(|v| v.checked_mul(den));
            let rhs = num.checked_mul(a1d);

            if let (Some(lhs), Some(rhs)) = (lhs, rhs) {
                if lhs > rhs {
                    a1n = x * a1n + a0n;
                    a1d = x * a1d + a0d;
                }
            }

            break;
        }

        a0n = a1n;
        a0d = a1d;
        a1n = a2n.unwrap_or_default();
        a1d = a2d.unwrap_or_default();
        num = den;
        den = next_den;
    }

    (sign(a1n), a1d, den == 0)
}
