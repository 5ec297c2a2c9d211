// Mediatime
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::mem;

use crate::errors::{invalid_parameters_error, Result};
use crate::sample::{Sample, SampleFormat};
use crate::units::{Rational, Timestamp};

use super::{AudioSpec, ChannelLayout};

/// `AudioSamples` is an owned buffer of raw audio samples together with its timing.
///
/// Samples are stored as native-endian bytes in one plane per channel for planar formats, or a
/// single interleaved plane for packed formats.
///
/// A *null* `AudioSamples`, created with [`AudioSamples::null`], holds no format and no planes. It
/// is used as the flush marker when pushing audio into a resampler.
#[derive(Clone, Debug)]
pub struct AudioSamples {
    spec: AudioSpec,
    frames: usize,
    planes: Vec<Vec<u8>>,
    pts: Timestamp,
    time_base: Rational,
    stream_index: i32,
}

impl AudioSamples {
    /// Creates a buffer of `frames` frames of silence.
    pub fn new(spec: AudioSpec, frames: usize) -> Result<AudioSamples> {
        spec.validate()?;

        let channels = spec.channels();

        let size = match spec.format.required_buffer_size(channels, frames, 1) {
            Some(size) => size,
            None => return invalid_parameters_error("audio buffer is too large"),
        };

        let num_planes = spec.format.planes(channels);
        let silence = if spec.format.packed() == SampleFormat::U8 { 0x80 } else { 0 };

        let planes = (0..num_planes).map(|_| vec![silence; size / num_planes]).collect();

        Ok(AudioSamples {
            spec,
            frames,
            planes,
            pts: Timestamp::none(spec.time_base()),
            time_base: spec.time_base(),
            stream_index: 0,
        })
    }

    /// Creates a buffer from interleaved samples.
    ///
    /// The sample type must match the format of `spec`, ignoring whether the format is packed or
    /// planar. Planar formats are de-interleaved.
    pub fn from_interleaved<S: Sample>(spec: AudioSpec, data: &[S]) -> Result<AudioSamples> {
        if spec.format.packed() != S::FORMAT {
            return invalid_parameters_error("sample type does not match the sample format");
        }

        spec.validate()?;

        let channels = spec.channels();

        if data.len() % channels != 0 {
            return invalid_parameters_error("sample count is not a multiple of the channel count");
        }

        let mut samples = AudioSamples::new(spec, data.len() / channels)?;

        if spec.format.is_planar() {
            let size = mem::size_of::<S>();

            for (i, sample) in data.iter().enumerate() {
                let (ch, frame) = (i % channels, i / channels);
                samples.planes[ch][frame * size..(frame + 1) * size]
                    .copy_from_slice(bytemuck::bytes_of(sample));
            }
        }
        else {
            samples.planes[0].copy_from_slice(bytemuck::cast_slice(data));
        }

        Ok(samples)
    }

    /// Creates the null buffer, the flush marker.
    pub fn null() -> AudioSamples {
        let spec = AudioSpec::new(SampleFormat::S16, 0, ChannelLayout::empty());

        AudioSamples {
            spec,
            frames: 0,
            planes: Vec::new(),
            pts: Timestamp::default(),
            time_base: Rational::ZERO,
            stream_index: 0,
        }
    }

    /// Returns `true` if this is the null buffer.
    pub fn is_null(&self) -> bool {
        self.planes.is_empty()
    }

    /// Gets the audio specification.
    pub fn spec(&self) -> &AudioSpec {
        &self.spec
    }

    pub fn format(&self) -> SampleFormat {
        self.spec.format
    }

    pub fn rate(&self) -> u32 {
        self.spec.rate
    }

    pub fn layout(&self) -> ChannelLayout {
        self.spec.layout
    }

    /// Gets the number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Gets the number of channels.
    pub fn channels(&self) -> usize {
        self.spec.channels()
    }

    /// Gets the number of planes.
    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    /// Gets the bytes of plane `index`, or `None` if there is no such plane.
    pub fn plane(&self, index: usize) -> Option<&[u8]> {
        self.planes.get(index).map(|plane| plane.as_slice())
    }

    /// Gets the bytes of plane `index` mutably, or `None` if there is no such plane.
    pub fn plane_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        self.planes.get_mut(index).map(|plane| plane.as_mut_slice())
    }

    /// Finds the plane and the sample index within that plane of a channel's sample.
    ///
    /// # Panics
    ///
    /// Panics if `ch` or `frame` is out of range.
    fn locate(&self, ch: usize, frame: usize) -> (usize, usize) {
        let channels = self.channels();

        assert!(ch < channels, "channel out of range");
        assert!(frame < self.frames, "frame out of range");

        if self.spec.format.is_planar() {
            (ch, frame)
        }
        else {
            (0, frame * channels + ch)
        }
    }

    /// Reads a sample as a normalised `f64`.
    ///
    /// # Panics
    ///
    /// Panics if `ch` or `frame` is out of range.
    pub fn sample_f64(&self, ch: usize, frame: usize) -> f64 {
        let (plane, idx) = self.locate(ch, frame);
        let bytes = &self.planes[plane];

        match self.spec.format.packed() {
            SampleFormat::U8 => read_sample::<u8>(bytes, idx),
            SampleFormat::S16 => read_sample::<i16>(bytes, idx),
            SampleFormat::S32 => read_sample::<i32>(bytes, idx),
            SampleFormat::S64 => read_sample::<i64>(bytes, idx),
            SampleFormat::F32 => read_sample::<f32>(bytes, idx),
            _ => read_sample::<f64>(bytes, idx),
        }
    }

    /// Writes a sample from a normalised `f64`, converting it to the buffer's sample format.
    ///
    /// # Panics
    ///
    /// Panics if `ch` or `frame` is out of range.
    pub fn set_sample_f64(&mut self, ch: usize, frame: usize, value: f64) {
        let (plane, idx) = self.locate(ch, frame);
        let format = self.spec.format.packed();
        let bytes = &mut self.planes[plane];

        match format {
            SampleFormat::U8 => write_sample::<u8>(bytes, idx, value),
            SampleFormat::S16 => write_sample::<i16>(bytes, idx, value),
            SampleFormat::S32 => write_sample::<i32>(bytes, idx, value),
            SampleFormat::S64 => write_sample::<i64>(bytes, idx, value),
            SampleFormat::F32 => write_sample::<f32>(bytes, idx, value),
            _ => write_sample::<f64>(bytes, idx, value),
        }
    }

    /// Shortens the buffer to `frames` frames. Has no effect if the buffer is already shorter.
    pub fn truncate(&mut self, frames: usize) {
        if frames >= self.frames {
            return;
        }

        let bps = self.spec.format.bytes_per_sample();

        let len = if self.spec.format.is_planar() {
            frames * bps
        }
        else {
            frames * bps * self.channels()
        };

        for plane in self.planes.iter_mut() {
            plane.truncate(len);
        }

        self.frames = frames;
    }

    /// Gets the presentation timestamp.
    pub fn pts(&self) -> Timestamp {
        self.pts
    }

    /// Sets the presentation timestamp.
    pub fn set_pts(&mut self, pts: Timestamp) {
        self.pts = pts;
    }

    /// Gets the timebase of the buffer.
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /// Sets the timebase of the buffer. The presentation timestamp is rescaled into the new
    /// timebase.
    pub fn set_time_base(&mut self, time_base: Rational) {
        self.pts = self.pts.rescaled(time_base);
        self.time_base = time_base;
    }

    pub fn stream_index(&self) -> i32 {
        self.stream_index
    }

    pub fn set_stream_index(&mut self, stream_index: i32) {
        self.stream_index = stream_index;
    }

    /// Gets the duration of the buffer, `frames` ticks of `1/rate`. The null buffer has an
    /// invalid duration.
    pub fn duration(&self) -> Timestamp {
        if self.is_null() {
            return Timestamp::default();
        }

        Timestamp::new(self.frames as i64, self.spec.time_base())
    }
}

impl Default for AudioSamples {
    fn default() -> Self {
        AudioSamples::null()
    }
}

/// Converts a sample count at `rate` Hz to a duration in ticks of `time_base`.
pub fn samples_to_duration(count: i64, rate: u32, time_base: Rational) -> i64 {
    Rational::new(1, rate as i32).rescale(count, time_base)
}

/// Converts a duration in ticks of `time_base` to a sample count at `rate` Hz.
pub fn duration_to_samples(duration: i64, rate: u32, time_base: Rational) -> i64 {
    time_base.rescale(duration, Rational::new(1, rate as i32))
}

fn read_sample<S: Sample>(bytes: &[u8], idx: usize) -> f64 {
    let size = mem::size_of::<S>();
    bytemuck::pod_read_unaligned::<S>(&bytes[idx * size..(idx + 1) * size]).to_f64()
}

fn write_sample<S: Sample>(bytes: &mut [u8], idx: usize, value: f64) {
    let size = mem::size_of::<S>();
    bytes[idx * size..(idx + 1) * size].copy_from_slice(bytemuck::bytes_of(&S::from_f64(value)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::layouts;
    use crate::errors::Error;

    fn spec(format: SampleFormat) -> AudioSpec {
        AudioSpec::new(format, 48_000, layouts::STEREO)
    }

    #[test]
    fn verify_new_is_silent() {
        let formats = [SampleFormat::U8, SampleFormat::S16P, SampleFormat::F32, SampleFormat::S64P];

        for format in formats {
            let buf = AudioSamples::new(spec(format), 16).unwrap();

            assert!(!buf.is_null());
            assert_eq!(buf.frames(), 16);
            assert_eq!(buf.channels(), 2);
            assert_eq!(buf.num_planes(), format.planes(2));
            assert!(!buf.pts().is_valid());
            assert_eq!(buf.time_base(), Rational::new(1, 48_000));

            for ch in 0..2 {
                for i in 0..16 {
                    assert_eq!(buf.sample_f64(ch, i), 0.0);
                }
            }
        }
    }

    #[test]
    fn verify_new_rejects_invalid_spec() {
        let bad = AudioSpec::new(SampleFormat::S16, 0, layouts::STEREO);
        assert_eq!(
            AudioSamples::new(bad, 4).unwrap_err(),
            Error::InvalidParameters("sample rate is zero")
        );
    }

    #[test]
    fn verify_from_interleaved() {
        let data: [i16; 6] = [0, 16_384, -16_384, 8_192, 32_767, -32_768];

        for format in [SampleFormat::S16, SampleFormat::S16P] {
            let buf = AudioSamples::from_interleaved(spec(format), &data).unwrap();

            assert_eq!(buf.frames(), 3);
            assert_eq!(buf.sample_f64(0, 0), 0.0);
            assert_eq!(buf.sample_f64(1, 0), 0.5);
            assert_eq!(buf.sample_f64(0, 1), -0.5);
            assert_eq!(buf.sample_f64(1, 1), 0.25);
            assert_eq!(buf.sample_f64(1, 2), -1.0);
        }

        let planar = AudioSamples::from_interleaved(spec(SampleFormat::S16P), &data).unwrap();
        let left: [i16; 3] = [0, -16_384, 32_767];
        assert_eq!(planar.plane(0).unwrap(), bytemuck::cast_slice::<i16, u8>(&left));

        // Wrong sample type.
        assert!(AudioSamples::from_interleaved(spec(SampleFormat::F32), &data).is_err());
        // Incomplete frame.
        assert!(AudioSamples::from_interleaved(spec(SampleFormat::S16), &data[..5]).is_err());
    }

    #[test]
    fn verify_set_sample() {
        let mut buf = AudioSamples::new(spec(SampleFormat::F32P), 4).unwrap();

        buf.set_sample_f64(1, 3, 0.75);
        assert_eq!(buf.sample_f64(1, 3), 0.75);
        assert_eq!(buf.sample_f64(0, 3), 0.0);

        let mut buf = AudioSamples::new(spec(SampleFormat::U8), 4).unwrap();

        buf.set_sample_f64(0, 2, -1.0);
        assert_eq!(buf.plane(0).unwrap()[4], 0);
        assert_eq!(buf.sample_f64(0, 2), -1.0);
    }

    #[test]
    #[should_panic]
    fn verify_sample_out_of_range() {
        let buf = AudioSamples::new(spec(SampleFormat::S32), 4).unwrap();
        buf.sample_f64(0, 4);
    }

    #[test]
    fn verify_truncate() {
        let data: Vec<i32> = (0..20).collect();

        let mut buf = AudioSamples::from_interleaved(spec(SampleFormat::S32), &data).unwrap();
        buf.truncate(4);
        assert_eq!(buf.frames(), 4);
        assert_eq!(buf.plane(0).unwrap().len(), 4 * 2 * 4);

        let mut buf = AudioSamples::from_interleaved(spec(SampleFormat::S32P), &data).unwrap();
        buf.truncate(20);
        assert_eq!(buf.frames(), 10);
        buf.truncate(0);
        assert_eq!(buf.frames(), 0);
        assert_eq!(buf.plane(1).unwrap().len(), 0);
    }

    #[test]
    fn verify_null() {
        let null = AudioSamples::null();

        assert!(null.is_null());
        assert_eq!(null.frames(), 0);
        assert_eq!(null.plane(0), None);
        assert!(!null.duration().is_valid());
        assert!(AudioSamples::default().is_null());
    }

    #[test]
    fn verify_timing() {
        let mut buf = AudioSamples::new(spec(SampleFormat::S16), 480).unwrap();

        assert_eq!(buf.duration(), Timestamp::new(10, Rational::new(1, 1000)));

        buf.set_pts(Timestamp::new(96_000, Rational::new(1, 48_000)));
        buf.set_time_base(Rational::new(1, 1000));
        assert_eq!(buf.pts().ticks(), Some(2000));
        assert_eq!(buf.time_base(), Rational::new(1, 1000));

        buf.set_stream_index(3);
        assert_eq!(buf.stream_index(), 3);
    }

    #[test]
    fn verify_duration_helpers() {
        let ms = Rational::new(1, 1000);

        assert_eq!(samples_to_duration(48_000, 48_000, ms), 1000);
        assert_eq!(samples_to_duration(1024, 44_100, ms), 23);
        assert_eq!(duration_to_samples(1000, 44_100, ms), 44_100);
        assert_eq!(duration_to_samples(20, 48_000, ms), 960);
    }
}
