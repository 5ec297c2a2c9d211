// Mediatime
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};
use std::time::Duration;

use super::rational::{clamp_i64, reduce_bounded, Rational, TIME_BASE_Q};

/// The raw "no presentation timestamp" sentinel used by codec libraries.
///
/// A [`Timestamp`] never stores this value. It converts to and from an invalid `Timestamp` at the
/// boundary with [`Timestamp::new`] and [`Timestamp::to_raw`].
pub const NO_PTS: i64 = i64::MIN;

/// The timebase of [`Timestamp`]s created from a [`std::time::Duration`].
pub const NANOSECONDS_Q: Rational = Rational { num: 1, den: 1_000_000_000 };

/// A `Timestamp` is a tick count paired with the timebase the ticks are expressed in.
///
/// A `Timestamp` may be *invalid*, meaning the time is unknown. Invalid timestamps propagate
/// silently: arithmetic with an invalid operand produces an invalid result, [`Timestamp::seconds`]
/// returns NaN, and comparisons involving an invalid operand are unordered (`==` is `false`).
///
/// Two valid timestamps compare by the real time they represent, so `1*1/10` equals `100*1/1000`.
#[derive(Copy, Clone, Debug)]
pub struct Timestamp {
    ticks: Option<i64>,
    time_base: Rational,
}

impl Timestamp {
    /// Creates a new `Timestamp` of `ticks` in `time_base`. The raw sentinel [`NO_PTS`] creates an
    /// invalid timestamp.
    #[inline]
    pub const fn new(ticks: i64, time_base: Rational) -> Self {
        let ticks = if ticks == NO_PTS { None } else { Some(ticks) };
        Timestamp { ticks, time_base }
    }

    /// Creates an invalid `Timestamp` in the given timebase.
    #[inline]
    pub const fn none(time_base: Rational) -> Self {
        Timestamp { ticks: None, time_base }
    }

    /// Creates a `Timestamp` from a raw tick count as reported by a codec library. Identical to
    /// [`Timestamp::new`].
    #[inline]
    pub const fn from_raw(raw: i64, time_base: Rational) -> Self {
        Timestamp::new(raw, time_base)
    }

    /// Creates a `Timestamp` from an optional tick count.
    #[inline]
    pub fn from_ticks(ticks: Option<i64>, time_base: Rational) -> Self {
        match ticks {
            Some(ticks) => Timestamp::new(ticks, time_base),
            None => Timestamp::none(time_base),
        }
    }

    /// Creates a `Timestamp` from a `Duration`. The timebase is one nanosecond.
    pub fn from_duration(duration: Duration) -> Self {
        Timestamp::new(clamp_i64(duration.as_nanos() as i128), NANOSECONDS_Q)
    }

    /// Creates a `Timestamp` from a `Duration`, expressed in `time_base`.
    pub fn from_duration_in(duration: Duration, time_base: Rational) -> Self {
        let ts = Timestamp::from_duration(duration);
        ts.rescaled(time_base)
    }

    /// Gets the tick count, or `None` if the timestamp is invalid.
    #[inline]
    pub const fn ticks(&self) -> Option<i64> {
        self.ticks
    }

    /// Gets the timebase.
    #[inline]
    pub const fn time_base(&self) -> Rational {
        self.time_base
    }

    /// Returns `true` if the timestamp is known.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.ticks.is_some()
    }

    /// Gets the raw tick count, or [`NO_PTS`] if the timestamp is invalid.
    #[inline]
    pub fn to_raw(&self) -> i64 {
        self.ticks.unwrap_or(NO_PTS)
    }

    /// Gets the tick count expressed in `time_base`, or `None` if the timestamp is invalid.
    pub fn timestamp_in(&self, time_base: Rational) -> Option<i64> {
        self.ticks.map(|ticks| self.time_base.rescale(ticks, time_base))
    }

    /// Gets the raw tick count expressed in `time_base`, or [`NO_PTS`] if the timestamp is
    /// invalid.
    pub fn to_raw_in(&self, time_base: Rational) -> i64 {
        self.timestamp_in(time_base).unwrap_or(NO_PTS)
    }

    /// Returns the same instant expressed in `time_base`. Invalid timestamps stay invalid.
    pub fn rescaled(&self, time_base: Rational) -> Self {
        Timestamp { ticks: self.timestamp_in(time_base), time_base }
    }

    /// Gets the timestamp in seconds, or NaN if the timestamp is invalid.
    pub fn seconds(&self) -> f64 {
        match self.ticks {
            Some(ticks) => ticks as f64 * self.time_base.to_f64(),
            None => f64::NAN,
        }
    }

    /// Converts the timestamp to a `Duration`. Negative timestamps clamp to zero. Returns `None`
    /// if the timestamp is invalid.
    pub fn to_duration(&self) -> Option<Duration> {
        let nanos = self.timestamp_in(NANOSECONDS_Q)?;
        Some(Duration::from_nanos(nanos.max(0) as u64))
    }

    /// Gets `ticks * time_base.num * scale`, the numerator of the real time when brought over a
    /// common denominator.
    fn cross(&self, scale: i32) -> Option<i128> {
        self.ticks
            .map(|ticks| i128::from(ticks) * i128::from(self.time_base.num) * i128::from(scale))
    }

    fn compare(&self, other: &Timestamp) -> Option<Ordering> {
        // a/b <=> c/d is decided by a*d <=> c*b, flipped if b*d is negative.
        let lhs = self.cross(other.time_base.den)?;
        let rhs = other.cross(self.time_base.den)?;

        let sign = i64::from(self.time_base.den) * i64::from(other.time_base.den);

        match sign.cmp(&0) {
            Ordering::Greater => Some(lhs.cmp(&rhs)),
            Ordering::Less => Some(rhs.cmp(&lhs)),
            Ordering::Equal => None,
        }
    }
}

impl Default for Timestamp {
    /// An invalid timestamp in the microsecond timebase.
    fn default() -> Self {
        Timestamp::none(TIME_BASE_Q)
    }
}

impl From<Duration> for Timestamp {
    fn from(duration: Duration) -> Self {
        Timestamp::from_duration(duration)
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}

/// Picks the finer of two timebases, the one with the shorter tick.
fn finer(a: Rational, b: Rational) -> Rational {
    if a < b {
        a
    }
    else {
        b
    }
}

impl Add for Timestamp {
    type Output = Timestamp;

    /// Adds two timestamps. The result is expressed in the finer of the two timebases.
    fn add(self, rhs: Timestamp) -> Timestamp {
        let time_base = finer(self.time_base, rhs.time_base);

        let ticks = match (self.timestamp_in(time_base), rhs.timestamp_in(time_base)) {
            (Some(a), Some(b)) => Some(clamp_i64(i128::from(a) + i128::from(b))),
            _ => None,
        };

        Timestamp { ticks, time_base }
    }
}

impl Sub for Timestamp {
    type Output = Timestamp;

    /// Subtracts two timestamps. The result is expressed in the finer of the two timebases.
    fn sub(self, rhs: Timestamp) -> Timestamp {
        let time_base = finer(self.time_base, rhs.time_base);

        let ticks = match (self.timestamp_in(time_base), rhs.timestamp_in(time_base)) {
            (Some(a), Some(b)) => Some(clamp_i64(i128::from(a) - i128::from(b))),
            _ => None,
        };

        Timestamp { ticks, time_base }
    }
}

impl Mul for Timestamp {
    type Output = Timestamp;

    /// Multiplies two timestamps. Ticks multiply and timebases multiply, so the result is exact
    /// unless the product timebase overflows (see [`Rational`]).
    fn mul(self, rhs: Timestamp) -> Timestamp {
        let time_base = self.time_base * rhs.time_base;

        let ticks = match (self.ticks, rhs.ticks) {
            (Some(a), Some(b)) => Some(clamp_i64(i128::from(a) * i128::from(b))),
            _ => None,
        };

        Timestamp { ticks, time_base }
    }
}

impl Div for Timestamp {
    type Output = Timestamp;

    /// Divides two timestamps, giving their dimensionless ratio.
    ///
    /// The quotient is computed exactly as a fraction of 128-bit integers and reduced. The result
    /// is expressed as `ticks * 1/den` where `den` fits in an `i32`. If the reduced fraction does
    /// not fit, the closest fraction that does is used. Division by a zero-length timestamp
    /// gives an invalid result.
    fn div(self, rhs: Timestamp) -> Timestamp {
        let invalid = Timestamp::none(Rational::new(1, 1));

        // (a * an / ad) / (b * bn / bd) = (a * an * bd) / (b * bn * ad)
        let (numer, denom) = match (self.cross(rhs.time_base.den), rhs.cross(self.time_base.den)) {
            (Some(n), Some(d)) => (n, d),
            _ => return invalid,
        };

        if denom == 0 || self.time_base.den == 0 || rhs.time_base.den == 0 {
            return invalid;
        }

        let (ticks, den, _) =
            reduce_bounded(numer, denom, i128::from(i64::MAX), i128::from(i32::MAX));

        Timestamp::new(ticks as i64, Rational::new(1, den as i32))
    }
}

impl AddAssign for Timestamp {
    fn add_assign(&mut self, rhs: Timestamp) {
        *self = *self + rhs;
    }
}

impl SubAssign for Timestamp {
    fn sub_assign(&mut self, rhs: Timestamp) {
        *self = *self - rhs;
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        self + Timestamp::from_duration(rhs)
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: Duration) -> Timestamp {
        self - Timestamp::from_duration(rhs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ticks {
            Some(ticks) => write!(f, "{}*{}", ticks, self.time_base),
            None => write!(f, "NO_PTS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TB_MS: Rational = Rational { num: 1, den: 1000 };
    const TB_THIRD: Rational = Rational { num: 1, den: 3 };
    const TB_48K: Rational = Rational { num: 1, den: 48000 };

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn verify_validity() {
        let ts = Timestamp::new(NO_PTS, TB_MS);
        assert!(!ts.is_valid());
        assert_eq!(ts.ticks(), None);
        assert_eq!(ts.to_raw(), NO_PTS);
        assert!(ts.seconds().is_nan());
        assert_eq!(ts.timestamp_in(TB_48K), None);
        assert_eq!(ts.to_raw_in(TB_48K), NO_PTS);
        assert_eq!(ts.to_duration(), None);

        let ts = Timestamp::default();
        assert!(!ts.is_valid());
        assert_eq!(ts.time_base(), TIME_BASE_Q);

        let ts = Timestamp::new(5, TB_MS);
        assert!(ts.is_valid());
        assert_eq!(ts.ticks(), Some(5));
        assert_eq!(ts.to_raw(), 5);
    }

    #[test]
    fn verify_timestamp_in() {
        let ts = Timestamp::new(48000, TB_48K);
        assert_eq!(ts.timestamp_in(TB_MS), Some(1000));
        assert_eq!(ts.timestamp_in(TB_48K), Some(48000));
        assert_close(ts.seconds(), 1.0);

        let r = ts.rescaled(Rational::new(1, 90000));
        assert_eq!(r.ticks(), Some(90000));
        assert_eq!(r.time_base(), Rational::new(1, 90000));
    }

    #[test]
    fn verify_comparison() {
        let a = Timestamp::new(1, Rational::new(1, 10));
        let b = Timestamp::new(100, TB_MS);
        let c = Timestamp::new(101, TB_MS);

        assert_eq!(a, b);
        assert!(a < c);
        assert!(c > a);
        assert!(a <= b);
        assert!(a >= b);
        assert!(a != c);

        // Exactness where a microsecond reference would round: 1/3 s vs 333333 us.
        let third = Timestamp::new(1, TB_THIRD);
        let us = Timestamp::new(333_333, TIME_BASE_Q);
        assert!(us < third);

        // Invalid timestamps are unordered and never equal.
        let none = Timestamp::none(TB_MS);
        let other_none = none;
        assert!(none != other_none);
        assert!(none != a);
        assert_eq!(none.partial_cmp(&a), None);
        assert!(!(none < a));
        assert!(!(none > a));

        // Negative timebase denominators.
        let neg = Timestamp::new(-1, Rational::new(1, -10));
        assert_eq!(neg, a);
    }

    #[test]
    fn verify_add_uses_finer_timebase() {
        let a = Timestamp::new(1, TB_MS);
        let b = Timestamp::new(2, TB_THIRD);

        let c = a + b;
        assert_eq!(c.time_base(), TB_MS);
        assert_close(c.seconds(), 1.0 / 1000.0 + 2.0 / 3.0);

        let c = b + a;
        assert_eq!(c.time_base(), TB_MS);
        assert_close(c.seconds(), 1.0 / 1000.0 + 2.0 / 3.0);
    }

    #[test]
    fn verify_sub() {
        let a = Timestamp::new(1, TB_MS);
        let b = Timestamp::new(2, TB_THIRD);

        let c = a + b;
        let d = c - b;
        assert_eq!(d.time_base(), TB_MS);
        assert_eq!(d.ticks(), Some(1));

        let e = a - b;
        assert_eq!(e.ticks(), Some(1 - 667));
    }

    #[test]
    fn verify_add_near_limit() {
        let limit = i64::MAX / 48000;

        let t = Timestamp::new(limit, TB_48K);
        let inc = Timestamp::new(48000, TB_48K);

        let mut v1 = t;
        v1 += inc;

        let v2 = t + inc;
        let v3 = inc + t;

        assert_eq!(v1, v2);
        assert_eq!(v1, v3);
        assert_eq!(v1.ticks(), Some(limit + 48000));
    }

    #[test]
    fn verify_add_saturates() {
        let t = Timestamp::new(i64::MAX, TB_MS) + Timestamp::new(1, TB_MS);
        assert_eq!(t.ticks(), Some(i64::MAX));

        let t = Timestamp::new(-i64::MAX, TB_MS) - Timestamp::new(1, TB_MS);
        assert_eq!(t.ticks(), Some(-i64::MAX));
        assert!(t.is_valid());
    }

    #[test]
    fn verify_invalid_propagates() {
        let a = Timestamp::new(1, TB_MS);
        let none = Timestamp::none(TB_48K);

        assert!(!(a + none).is_valid());
        assert!(!(none + a).is_valid());
        assert!(!(a - none).is_valid());
        assert!(!(a * none).is_valid());
        assert!(!(a / none).is_valid());
        assert!(!(none / a).is_valid());

        // The result timebase is still chosen.
        assert_eq!((a + none).time_base(), TB_48K);
    }

    #[test]
    fn verify_mul() {
        let a = Timestamp::new(1, TB_MS);
        let b = Timestamp::new(2, TB_THIRD);

        let e = a * b;
        assert_eq!(e.ticks(), Some(2));
        assert_eq!(e.time_base(), Rational::new(1, 3000));
        assert_close(e.seconds(), (1.0 / 1000.0) * (2.0 / 3.0));
    }

    #[test]
    fn verify_div() {
        let a = Timestamp::new(1, TB_MS);
        let b = Timestamp::new(2, TB_THIRD);

        let f = a / b;
        assert_close(f.seconds(), (1.0 / 1000.0) / (2.0 / 3.0));
        assert_eq!(f.ticks(), Some(3));
        assert_eq!(f.time_base(), Rational::new(1, 2000));

        let g = Timestamp::new(300, Rational::new(1, 2)) / Timestamp::new(150, TB_THIRD);
        assert_eq!(g.ticks(), Some(3));
        assert_eq!(g.time_base(), Rational::new(1, 1));

        // A quotient with both an integer and a fractional part stays exact.
        let h = Timestamp::new(7, TB_MS) / Timestamp::new(2, TB_MS);
        assert_close(h.seconds(), 3.5);

        // Division by zero length.
        assert!(!(a / Timestamp::new(0, TB_MS)).is_valid());
    }

    #[test]
    fn verify_div_reduces_to_fit() {
        // A ratio whose reduced denominator, 7 * (2^31 - 1), cannot fit in an i32.
        let a = Timestamp::new(1, Rational::new(1, i32::MAX));
        let b = Timestamp::new(7, TB_MS);

        let q = a / b;
        let expected = (1.0 / f64::from(i32::MAX)) / (7.0 / 1000.0);

        assert!(q.is_valid());
        assert!(q.time_base().den > 0);
        assert!(((q.seconds() - expected) / expected).abs() < 1e-6);
    }

    #[test]
    fn verify_durations() {
        let ts = Timestamp::from(Duration::from_micros(500));
        assert_eq!(ts.time_base(), NANOSECONDS_Q);
        assert_eq!(ts.ticks(), Some(500_000));
        assert_close(ts.seconds(), 0.0005);

        let ts2 = ts + Duration::from_secs(5);
        assert_close(ts2.seconds(), 5.0005);
        assert_eq!(ts2.to_duration(), Some(Duration::from_micros(5_000_500)));
        assert_eq!(ts2.timestamp_in(TB_MS), Some(5001));

        let ts3 = Timestamp::from_duration_in(Duration::from_millis(1500), TB_MS);
        assert_eq!(ts3.ticks(), Some(1500));
        assert_eq!(ts3.time_base(), TB_MS);

        assert_eq!(Timestamp::new(-10, TB_MS).to_duration(), Some(Duration::ZERO));

        let back = ts3 - Duration::from_millis(500);
        assert_eq!(back.timestamp_in(TB_MS), Some(1000));
    }

    #[test]
    fn verify_display() {
        assert_eq!(Timestamp::new(48000, TB_48K).to_string(), "48000*1/48000");
        assert_eq!(Timestamp::none(TB_48K).to_string(), "NO_PTS");
    }
}
