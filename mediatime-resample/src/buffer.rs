// Mediatime
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::{debug, warn};

use mediatime_core::audio::{AudioSamples, AudioSpec};
use mediatime_core::errors::{not_initialized_error, Error, Result};
use mediatime_core::units::Timestamp;

use crate::converter::SampleConverter;
use crate::resampler::RubatoConverter;

/// A configured conversion session.
struct Session {
    dst: AudioSpec,
    src: AudioSpec,
    converter: Box<dyn SampleConverter>,
}

/// `ResampleBuffer` converts a stream of audio buffers and keeps the converted buffers on a
/// continuous timeline.
///
/// Audio is pushed in the source format in buffers of any size and popped in the destination
/// format in buffers of a size chosen by the caller. Every popped buffer is stamped with a
/// timestamp in the destination timebase, `1/dst_rate`, that directly follows the previous popped
/// buffer. The timeline starts at zero. If the timestamps of the pushed audio jump backward, the
/// timeline is restarted at zero with the next popped buffer.
///
/// # Flushing
///
/// At the end of the stream, push [`AudioSamples::null`], then pop with `drain` set until `pop`
/// returns `Ok(false)`. Samples still buffered when the `ResampleBuffer` is dropped are lost.
pub struct ResampleBuffer {
    session: Option<Session>,
    stream_index: i32,
    prev_input_pts: Timestamp,
    next_output_pts: Timestamp,
}

impl ResampleBuffer {
    /// Creates a buffer converting from `src` to `dst` with the built-in [`RubatoConverter`].
    pub fn new(dst: AudioSpec, src: AudioSpec) -> Result<ResampleBuffer> {
        let converter = RubatoConverter::new(dst, src)?;
        ResampleBuffer::with_converter(dst, src, Box::new(converter))
    }

    /// Creates a buffer converting from `src` to `dst` with the given converter.
    pub fn with_converter(
        dst: AudioSpec,
        src: AudioSpec,
        converter: Box<dyn SampleConverter>,
    ) -> Result<ResampleBuffer> {
        let mut buffer = ResampleBuffer::default();
        buffer.configure(dst, src, converter)?;
        Ok(buffer)
    }

    /// Configures an unconfigured buffer, or replaces the conversion session of a configured one,
    /// with the built-in [`RubatoConverter`]. The timeline is restarted.
    pub fn init(&mut self, dst: AudioSpec, src: AudioSpec) -> Result<()> {
        let converter = RubatoConverter::new(dst, src)?;
        self.configure(dst, src, Box::new(converter))
    }

    fn configure(
        &mut self,
        dst: AudioSpec,
        src: AudioSpec,
        converter: Box<dyn SampleConverter>,
    ) -> Result<()> {
        dst.validate()?;
        src.validate()?;

        debug!("resample buffer: {} -> {}", src, dst);

        self.session = Some(Session { dst, src, converter });
        self.prev_input_pts = Timestamp::none(dst.time_base());
        self.next_output_pts = Timestamp::none(dst.time_base());

        Ok(())
    }

    /// Returns `true` if the buffer is configured.
    pub fn is_valid(&self) -> bool {
        self.session.is_some()
    }

    /// Gets the destination specification, or `None` if the buffer is not configured.
    pub fn dst_spec(&self) -> Option<&AudioSpec> {
        self.session.as_ref().map(|session| &session.dst)
    }

    /// Gets the source specification, or `None` if the buffer is not configured.
    pub fn src_spec(&self) -> Option<&AudioSpec> {
        self.session.as_ref().map(|session| &session.src)
    }

    /// Gets the stream index of the most recently pushed audio.
    pub fn stream_index(&self) -> i32 {
        self.stream_index
    }

    /// Gets the timestamp the next popped buffer will carry. Invalid before the first pop, and
    /// after a discontinuity until the next pop.
    pub fn next_output_pts(&self) -> Timestamp {
        self.next_output_pts
    }

    /// Gets the number of converted frames ready to be popped, or `-1` if the buffer is not
    /// configured.
    pub fn delay(&self) -> i64 {
        match &self.session {
            Some(session) => session.converter.delay(),
            None => -1,
        }
    }

    /// Pushes audio in the source format. Pushing the null buffer flushes the converter.
    ///
    /// The timestamp of every pushed buffer, including the null buffer, is recorded. A timestamp
    /// earlier than the previously recorded one is a discontinuity: the output timeline restarts
    /// at zero with the next popped buffer.
    ///
    /// Audio that does not exactly match the source specification is rejected with
    /// [`Error::InputFormatChanged`], and the buffer is left unchanged.
    pub fn push(&mut self, samples: &AudioSamples) -> Result<()> {
        let session = match &mut self.session {
            Some(session) => session,
            None => return not_initialized_error(),
        };

        if samples.is_null() {
            debug!("flushing resample buffer");
            session.converter.push(None)?;
            self.prev_input_pts = samples.pts();
            return Ok(());
        }

        if *samples.spec() != session.src {
            warn!("input changed from {} to {}", session.src, samples.spec());
            return Err(Error::InputFormatChanged);
        }

        let dst_tb = session.dst.time_base();

        session.converter.push(Some(samples))?;

        let pts = samples.pts();

        if pts < self.prev_input_pts {
            debug!(
                "input timestamp went backward from {} to {}, restarting output timeline",
                self.prev_input_pts, pts
            );
            self.next_output_pts = Timestamp::none(dst_tb);
        }

        self.prev_input_pts = pts;
        self.stream_index = samples.stream_index();

        Ok(())
    }

    /// Pops converted audio into `out`, which must match the destination specification.
    ///
    /// As many frames as `out` holds are requested. If fewer frames are ready, `Ok(false)` is
    /// returned and nothing is popped, unless `drain` is set, in which case the remaining frames
    /// are popped. The frame count of `out` is set to the number of frames popped.
    ///
    /// Returns `Ok(true)` if any frames were popped.
    pub fn pop(&mut self, out: &mut AudioSamples, drain: bool) -> Result<bool> {
        let session = match &mut self.session {
            Some(session) => session,
            None => return not_initialized_error(),
        };

        if *out.spec() != session.dst {
            return Err(Error::OutputFormatChanged);
        }

        let requested = out.frames();

        if session.converter.delay() < requested as i64 && !drain {
            return Ok(false);
        }

        let count = session.converter.pull(out, requested)?;
        out.truncate(count);

        if count == 0 {
            return Ok(false);
        }

        let dst_tb = session.dst.time_base();

        if !self.next_output_pts.is_valid() {
            self.next_output_pts = Timestamp::new(0, dst_tb);
        }

        out.set_time_base(dst_tb);
        out.set_pts(self.next_output_pts);
        out.set_stream_index(self.stream_index);

        self.next_output_pts += Timestamp::new(count as i64, dst_tb);

        Ok(true)
    }

    /// Pops `frames` converted frames into a newly allocated buffer, with the same semantics as
    /// [`ResampleBuffer::pop`]. A request for `0` frames pops every frame that is ready.
    ///
    /// Returns `Ok(None)` if nothing was popped.
    pub fn pop_samples(&mut self, frames: usize, drain: bool) -> Result<Option<AudioSamples>> {
        let dst = match self.dst_spec() {
            Some(dst) => *dst,
            None => return not_initialized_error(),
        };

        let frames = if frames == 0 { self.delay().max(0) as usize } else { frames };

        let mut out = AudioSamples::new(dst, frames)?;

        if self.pop(&mut out, drain)? {
            Ok(Some(out))
        }
        else {
            Ok(None)
        }
    }

    /// Discards every buffered sample and restarts the output timeline.
    pub fn reset(&mut self) {
        if let Some(session) = &mut self.session {
            session.converter.reset();
        }

        self.prev_input_pts = Timestamp::default();
        self.next_output_pts = Timestamp::default();
    }
}

impl Default for ResampleBuffer {
    /// An unconfigured buffer.
    fn default() -> Self {
        ResampleBuffer {
            session: None,
            stream_index: 0,
            prev_input_pts: Timestamp::default(),
            next_output_pts: Timestamp::default(),
        }
    }
}

impl Drop for ResampleBuffer {
    fn drop(&mut self) {
        let delay = self.delay();

        if delay > 0 {
            warn!("dropping resample buffer with {} undrained frames", delay);
        }
    }
}
