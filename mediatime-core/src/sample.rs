// Mediatime
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `sample` module defines the sample formats and the core audio sample trait.

use std::fmt;
use std::str::FromStr;

use bytemuck::Pod;

use crate::conv::FromSample;
use crate::errors::Error;

/// SampleFormat describes the data encoding and memory arrangement of audio samples.
///
/// Packed (interleaved) formats store all channels of a frame together in a single plane. Planar
/// formats store each channel in its own plane.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Unsigned 8-bit integer, packed.
    U8,
    /// Signed 16-bit integer, packed.
    S16,
    /// Signed 32-bit integer, packed.
    S32,
    /// Signed 64-bit integer, packed.
    S64,
    /// Single precision (32-bit) floating point, packed.
    F32,
    /// Double precision (64-bit) floating point, packed.
    F64,
    /// Unsigned 8-bit integer, planar.
    U8P,
    /// Signed 16-bit integer, planar.
    S16P,
    /// Signed 32-bit integer, planar.
    S32P,
    /// Signed 64-bit integer, planar.
    S64P,
    /// Single precision (32-bit) floating point, planar.
    F32P,
    /// Double precision (64-bit) floating point, planar.
    F64P,
}

const ALL_FORMATS: [SampleFormat; 12] = [
    SampleFormat::U8,
    SampleFormat::S16,
    SampleFormat::S32,
    SampleFormat::S64,
    SampleFormat::F32,
    SampleFormat::F64,
    SampleFormat::U8P,
    SampleFormat::S16P,
    SampleFormat::S32P,
    SampleFormat::S64P,
    SampleFormat::F32P,
    SampleFormat::F64P,
];

impl SampleFormat {
    /// Gets the short name of the sample format. The names are the ones used by common codec
    /// libraries, for example `s16` or `fltp`.
    pub fn name(&self) -> &'static str {
        match self {
            SampleFormat::U8 => "u8",
            SampleFormat::S16 => "s16",
            SampleFormat::S32 => "s32",
            SampleFormat::S64 => "s64",
            SampleFormat::F32 => "flt",
            SampleFormat::F64 => "dbl",
            SampleFormat::U8P => "u8p",
            SampleFormat::S16P => "s16p",
            SampleFormat::S32P => "s32p",
            SampleFormat::S64P => "s64p",
            SampleFormat::F32P => "fltp",
            SampleFormat::F64P => "dblp",
        }
    }

    /// Finds a sample format by its short name.
    pub fn from_name(name: &str) -> Option<SampleFormat> {
        ALL_FORMATS.iter().copied().find(|format| format.name() == name)
    }

    /// Gets the number of bytes used to store a single sample of one channel.
    pub fn bytes_per_sample(&self) -> usize {
        match self.packed() {
            SampleFormat::U8 => 1,
            SampleFormat::S16 => 2,
            SampleFormat::S32 | SampleFormat::F32 => 4,
            _ => 8,
        }
    }

    /// Gets the number of bits used to store a single sample of one channel.
    pub fn bits_per_sample(&self) -> u32 {
        8 * self.bytes_per_sample() as u32
    }

    /// Returns `true` if each channel is stored in its own plane.
    pub fn is_planar(&self) -> bool {
        matches!(
            self,
            SampleFormat::U8P
                | SampleFormat::S16P
                | SampleFormat::S32P
                | SampleFormat::S64P
                | SampleFormat::F32P
                | SampleFormat::F64P
        )
    }

    /// Returns `true` if the samples are floating point.
    pub fn is_float(&self) -> bool {
        matches!(self.packed(), SampleFormat::F32 | SampleFormat::F64)
    }

    /// Gets the packed (interleaved) variant of the sample format.
    pub fn packed(&self) -> SampleFormat {
        match self {
            SampleFormat::U8P => SampleFormat::U8,
            SampleFormat::S16P => SampleFormat::S16,
            SampleFormat::S32P => SampleFormat::S32,
            SampleFormat::S64P => SampleFormat::S64,
            SampleFormat::F32P => SampleFormat::F32,
            SampleFormat::F64P => SampleFormat::F64,
            packed => *packed,
        }
    }

    /// Gets the planar variant of the sample format.
    pub fn planar(&self) -> SampleFormat {
        match self {
            SampleFormat::U8 => SampleFormat::U8P,
            SampleFormat::S16 => SampleFormat::S16P,
            SampleFormat::S32 => SampleFormat::S32P,
            SampleFormat::S64 => SampleFormat::S64P,
            SampleFormat::F32 => SampleFormat::F32P,
            SampleFormat::F64 => SampleFormat::F64P,
            planar => *planar,
        }
    }

    /// Gets the planar variant if `planar` is `true`, otherwise the packed variant.
    pub fn alternative(&self, planar: bool) -> SampleFormat {
        if planar {
            self.planar()
        }
        else {
            self.packed()
        }
    }

    /// Gets the number of planes a buffer of this format with `channels` channels has.
    pub fn planes(&self, channels: usize) -> usize {
        if self.is_planar() {
            channels
        }
        else {
            1
        }
    }

    /// Calculates the number of bytes required to store `frames` frames of `channels` channels.
    ///
    /// Every plane is padded to a multiple of `align` bytes. An alignment of `0` or `1` disables
    /// padding. Returns `None` if the size overflows.
    pub fn required_buffer_size(
        &self,
        channels: usize,
        frames: usize,
        align: usize,
    ) -> Option<usize> {
        let samples_per_plane =
            if self.is_planar() { frames } else { frames.checked_mul(channels)? };

        let line_size = samples_per_plane.checked_mul(self.bytes_per_sample())?;

        let line_size = match align {
            0 | 1 => line_size,
            _ => line_size.checked_add(align - 1)? / align * align,
        };

        line_size.checked_mul(self.planes(channels))
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SampleFormat::from_name(s).ok_or(Error::InvalidParameters("unknown sample format"))
    }
}

/// `Sample` ties a primitive sample type to its packed [`SampleFormat`] and to the normalised
/// `f64` representation used for conversion.
///
/// Integer samples map onto `[-1.0, 1.0)`. Floating point samples are nominally within
/// `[-1.0, 1.0]` but are not clamped until converted to an integer type.
pub trait Sample: Pod + Default + PartialOrd {
    /// The packed sample format of this sample type.
    const FORMAT: SampleFormat;

    /// The value of a silent sample.
    const MID: Self;

    /// Converts the sample to a normalised `f64`.
    fn to_f64(self) -> f64;

    /// Converts a normalised `f64` to a sample.
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_sample {
    ($t:ty, $format:expr, $mid:expr) => {
        impl Sample for $t {
            const FORMAT: SampleFormat = $format;
            const MID: $t = $mid;

            #[inline(always)]
            fn to_f64(self) -> f64 {
                f64::from_sample(self)
            }

            #[inline(always)]
            fn from_f64(value: f64) -> Self {
                <$t>::from_sample(value)
            }
        }
    };
}

impl_sample!(u8, SampleFormat::U8, 128);
impl_sample!(i16, SampleFormat::S16, 0);
impl_sample!(i32, SampleFormat::S32, 0);
impl_sample!(i64, SampleFormat::S64, 0);
impl_sample!(f32, SampleFormat::F32, 0.0);
impl_sample!(f64, SampleFormat::F64, 0.0);
