// Mediatime
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `audio` module provides primitives for working with raw audio.

mod channels;
mod samples;

pub use channels::*;
pub use samples::*;

use crate::errors::{invalid_parameters_error, Result};
use crate::sample::SampleFormat;
use crate::units::Rational;

/// `AudioSpec` describes the format of a buffer of audio samples.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AudioSpec {
    /// The sample format.
    pub format: SampleFormat,
    /// The sample rate in Hz.
    pub rate: u32,
    /// The channel layout.
    pub layout: ChannelLayout,
}

impl AudioSpec {
    pub fn new(format: SampleFormat, rate: u32, layout: ChannelLayout) -> Self {
        AudioSpec { format, rate, layout }
    }

    /// Gets the number of channels.
    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Gets the timebase of one sample, `1/rate`.
    pub fn time_base(&self) -> Rational {
        Rational::new(1, self.rate as i32)
    }

    /// Checks that the specification describes a usable buffer.
    pub fn validate(&self) -> Result<()> {
        if self.rate == 0 {
            return invalid_parameters_error("sample rate is zero");
        }

        if self.rate > i32::MAX as u32 {
            return invalid_parameters_error("sample rate exceeds the timebase range");
        }

        if !self.layout.is_valid() {
            return invalid_parameters_error("channel layout is undefined");
        }

        Ok(())
    }
}

impl std::fmt::Display for AudioSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Hz, {}, {}", self.rate, self.layout, self.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    #[test]
    fn verify_validate() {
        let spec = AudioSpec::new(SampleFormat::S16, 48_000, layouts::STEREO);
        assert_eq!(spec.validate(), Ok(()));
        assert_eq!(spec.channels(), 2);
        assert_eq!(spec.time_base(), Rational::new(1, 48_000));
        assert_eq!(spec.to_string(), "48000 Hz, stereo, s16");

        let spec = AudioSpec::new(SampleFormat::S16, 0, layouts::STEREO);
        assert_eq!(spec.validate(), Err(Error::InvalidParameters("sample rate is zero")));

        let spec = AudioSpec::new(SampleFormat::F32P, 44_100, ChannelLayout::empty());
        assert_eq!(spec.validate(), Err(Error::InvalidParameters("channel layout is undefined")));

        let spec = AudioSpec::new(SampleFormat::F32P, u32::MAX, layouts::MONO);
        assert!(spec.validate().is_err());
    }
}
