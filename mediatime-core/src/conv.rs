// Mediatime
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `conv` module provides methods to convert samples between different sample types.
//!
//! All conversions go through a normalised `f64`. Integer samples are scaled so that their full
//! range maps onto `[-1.0, 1.0)`, and `f64` samples are clamped to `[-1.0, 1.0]` before being
//! converted to an integer type.

/// `FromSample` implements a conversion from sample type `F` to `Self`.
///
/// This may be a lossy conversion if converting from a sample type of higher precision to one of
/// lower precision. No dithering is applied.
pub trait FromSample<F> {
    fn from_sample(val: F) -> Self;
}

/// `IntoSample` implements a conversion from `Self` to sample type `T`.
pub trait IntoSample<T> {
    fn into_sample(self) -> T;
}

impl<F, T: FromSample<F>> IntoSample<T> for F {
    #[inline]
    fn into_sample(self) -> T {
        T::from_sample(self)
    }
}

/// Clamps the given value to the [-1.0, 1.0] range.
#[inline]
fn clamp_f64(val: f64) -> f64 {
    let mut clamped = val;
    clamped = if clamped > 1.0 { 1.0 } else { clamped };
    clamped = if clamped < -1.0 { -1.0 } else { clamped };
    clamped
}

// A `<float> as <integer>` cast saturates to the bounds of the integer, so converting a clamped
// value of exactly 1.0 lands on the maximum integer value.

macro_rules! impl_convert {
    ($from:ty, $to:ty, $sample:ident, $func:expr) => {
        impl FromSample<$from> for $to {
            #[inline(always)]
            fn from_sample($sample: $from) -> Self {
                $func
            }
        }
    };
}

// ... to f64

impl_convert!(u8, f64, s, (f64::from(s) / 128.0) - 1.0);
impl_convert!(i16, f64, s, f64::from(s) / 32_768.0);
impl_convert!(i32, f64, s, f64::from(s) / 2_147_483_648.0);
impl_convert!(i64, f64, s, s as f64 / 9_223_372_036_854_775_808.0);
impl_convert!(f32, f64, s, f64::from(s));
impl_convert!(f64, f64, s, s);

// f64 to ...

impl_convert!(f64, u8, s, ((clamp_f64(s) + 1.0) * 128.0) as u8);
impl_convert!(f64, i16, s, (clamp_f64(s) * 32_768.0) as i16);
impl_convert!(f64, i32, s, (clamp_f64(s) * 2_147_483_648.0) as i32);
impl_convert!(f64, i64, s, (clamp_f64(s) * 9_223_372_036_854_775_808.0) as i64);
impl_convert!(f64, f32, s, s as f32);

#[cfg(test)]
mod tests {
    use super::{FromSample, IntoSample};

    #[test]
    fn verify_to_f64() {
        assert_eq!(f64::from_sample(u8::MAX), 127.0 / 128.0);
        assert_eq!(f64::from_sample(128u8), 0.0);
        assert_eq!(f64::from_sample(u8::MIN), -1.0);

        assert_eq!(f64::from_sample(i16::MAX), 32_767.0 / 32_768.0);
        assert_eq!(f64::from_sample(0i16), 0.0);
        assert_eq!(f64::from_sample(i16::MIN), -1.0);

        assert_eq!(f64::from_sample(i32::MIN), -1.0);
        assert_eq!(f64::from_sample(0i32), 0.0);

        assert_eq!(f64::from_sample(i64::MIN), -1.0);
        assert_eq!(f64::from_sample(0i64), 0.0);

        assert_eq!(f64::from_sample(0.5f32), 0.5);
    }

    #[test]
    fn verify_from_f64() {
        assert_eq!(u8::from_sample(1.0f64), u8::MAX);
        assert_eq!(u8::from_sample(0.0f64), 128);
        assert_eq!(u8::from_sample(-1.0f64), u8::MIN);

        assert_eq!(i16::from_sample(1.0f64), i16::MAX);
        assert_eq!(i16::from_sample(0.0f64), 0);
        assert_eq!(i16::from_sample(-1.0f64), i16::MIN);

        assert_eq!(i32::from_sample(1.0f64), i32::MAX);
        assert_eq!(i32::from_sample(-1.0f64), i32::MIN);

        assert_eq!(i64::from_sample(1.0f64), i64::MAX);
        assert_eq!(i64::from_sample(-1.0f64), i64::MIN);

        // Out of range values clamp.
        assert_eq!(i16::from_sample(4.0f64), i16::MAX);
        assert_eq!(u8::from_sample(-3.0f64), u8::MIN);

        // Floating point samples are never clamped.
        assert_eq!(f32::from_sample(1.5f64), 1.5);
    }

    #[test]
    fn verify_integer_round_trip() {
        for s in [i16::MIN, -12_345, -1, 0, 1, 12_345, i16::MAX] {
            let f: f64 = s.into_sample();
            assert_eq!(i16::from_sample(f), s);
        }

        for s in [0u8, 1, 127, 128, 200, 255] {
            let f: f64 = s.into_sample();
            assert_eq!(u8::from_sample(f), s);
        }

        for s in [i32::MIN, -7, 0, 7, i32::MAX] {
            let f: f64 = s.into_sample();
            assert_eq!(i32::from_sample(f), s);
        }
    }
}
