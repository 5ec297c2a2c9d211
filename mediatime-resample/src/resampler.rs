// Mediatime
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::VecDeque;

use log::{debug, warn};
use rubato::{FftFixedIn, Resampler};

use mediatime_core::audio::{AudioSamples, AudioSpec, ChannelLayout};
use mediatime_core::conv::FromSample;
use mediatime_core::errors::{invalid_parameters_error, Error, Result};

use crate::converter::SampleConverter;

/// The requested number of input frames rubato processes at once. Rubato rounds this to a
/// multiple of its FFT size.
const CHUNK_FRAMES: usize = 1024;

/// The number of sub-chunks each chunk is split into by rubato.
const SUB_CHUNKS: usize = 2;

/// The error code reported when rubato fails to process a chunk.
pub const RUBATO_ERROR: i32 = -1;

/// The sources and gains that make up one output channel.
type ChannelMix = Vec<(usize, f64)>;

/// `RubatoConverter` is a [`SampleConverter`] backed by rubato's synchronous FFT resampler.
///
/// Samples are converted to `f32` and remapped to the destination channel layout, then resampled
/// by [`rubato::FftFixedIn`] whenever a full chunk of input is staged. The resampler's latency is
/// trimmed from the start of the output, so output frame `k` lines up with input time
/// `k / dst_rate`. A flush pads the staged input with silence and trims the output so that every
/// segment emits exactly `ceil(frames_in * dst_rate / src_rate)` frames. Input pushed after a
/// flush starts a new segment.
///
/// If the rates match, no resampling is performed.
///
/// Channels present in both layouts are copied. A missing mono channel is mixed down from front
/// left and front right, and missing front left and front right channels are copied from a mono
/// channel. Any other missing channel is silent.
pub struct RubatoConverter {
    dst: AudioSpec,
    src: AudioSpec,
    /// For each destination channel, the source channels mixed into it.
    mix: Vec<ChannelMix>,
    resampler: Option<FftFixedIn<f32>>,
    /// Remapped input frames waiting for a full chunk.
    input: Vec<Vec<f32>>,
    /// Scratch output of one rubato chunk.
    output: Vec<Vec<f32>>,
    /// Converted frames ready to be pulled.
    queue: Vec<VecDeque<f32>>,
    /// Leading output frames still to discard.
    skip: usize,
    /// Input frames pushed in this segment.
    frames_in: u64,
    /// Output frames queued in this segment.
    frames_out: u64,
}

impl RubatoConverter {
    /// Creates a converter from `src` to `dst`.
    pub fn new(dst: AudioSpec, src: AudioSpec) -> Result<RubatoConverter> {
        dst.validate()?;
        src.validate()?;

        let mix: Vec<ChannelMix> =
            dst.layout.iter().map(|ch| channel_mix(ch, src.layout)).collect();

        let channels = mix.len();

        let mut converter = RubatoConverter {
            dst,
            src,
            mix,
            resampler: None,
            input: vec![Vec::new(); channels],
            output: Vec::new(),
            queue: vec![VecDeque::new(); channels],
            skip: 0,
            frames_in: 0,
            frames_out: 0,
        };

        converter.start_segment()?;

        debug!("rubato converter: {} -> {}", src, dst);

        Ok(converter)
    }

    /// Prepares a fresh resampler for a new segment of input.
    fn start_segment(&mut self) -> Result<()> {
        self.frames_in = 0;
        self.frames_out = 0;

        if self.src.rate == self.dst.rate {
            return Ok(());
        }

        let resampler = match FftFixedIn::<f32>::new(
            self.src.rate as usize,
            self.dst.rate as usize,
            CHUNK_FRAMES,
            SUB_CHUNKS,
            self.mix.len(),
        ) {
            Ok(resampler) => resampler,
            Err(err) => {
                warn!("rubato: {}", err);
                return invalid_parameters_error("unsupported sample rate conversion");
            }
        };

        self.skip = resampler.output_delay();
        self.output = vec![vec![0.0; resampler.output_frames_max()]; self.mix.len()];
        self.resampler = Some(resampler);

        Ok(())
    }

    /// Gets the number of output frames a segment of `frames_in` input frames yields.
    fn segment_frames(&self) -> u64 {
        let num = u128::from(self.frames_in) * u128::from(self.dst.rate);
        num.div_ceil(u128::from(self.src.rate)) as u64
    }

    /// Resamples every full chunk of staged input.
    fn process_chunks(&mut self) -> Result<()> {
        let resampler = match &mut self.resampler {
            Some(resampler) => resampler,
            None => return Ok(()),
        };

        loop {
            let needed = resampler.input_frames_next();

            if self.input[0].len() < needed {
                return Ok(());
            }

            let chunk: Vec<&[f32]> = self.input.iter().map(|plane| &plane[..needed]).collect();

            let written = match resampler.process_into_buffer(&chunk, &mut self.output, None) {
                Ok((_, written)) => written,
                Err(err) => {
                    warn!("rubato: {}", err);
                    return Err(Error::ConversionError(RUBATO_ERROR));
                }
            };

            for plane in self.input.iter_mut() {
                plane.drain(..needed);
            }

            let skip = self.skip.min(written);
            self.skip -= skip;

            for (queue, plane) in self.queue.iter_mut().zip(&self.output) {
                queue.extend(&plane[skip..written]);
            }

            self.frames_out += (written - skip) as u64;
        }
    }

    /// Pushes out the remaining staged input and trims the segment to its exact length.
    fn flush(&mut self) -> Result<()> {
        let target = self.segment_frames();

        let chunk = self.resampler.as_ref().map(|resampler| resampler.input_frames_next());

        if let Some(chunk) = chunk {
            while self.frames_out < target {
                let padded = chunk - self.input[0].len() % chunk;

                for plane in self.input.iter_mut() {
                    plane.resize(plane.len() + padded, 0.0);
                }

                self.process_chunks()?;
            }

            // Silence left over from padding.
            for plane in self.input.iter_mut() {
                plane.clear();
            }
        }

        let excess = self.frames_out.saturating_sub(target) as usize;

        for queue in self.queue.iter_mut() {
            queue.truncate(queue.len().saturating_sub(excess));
        }

        self.start_segment()
    }
}

fn channel_mix(ch: ChannelLayout, src: ChannelLayout) -> ChannelMix {
    let stereo = ChannelLayout::FRONT_LEFT | ChannelLayout::FRONT_RIGHT;

    if let Some(idx) = src.index_of(ch) {
        vec![(idx, 1.0)]
    }
    else if ch == ChannelLayout::FRONT_CENTER && src.contains(stereo) {
        src.iter()
            .filter(|pos| stereo.contains(*pos))
            .filter_map(|pos| src.index_of(pos))
            .map(|idx| (idx, 0.5))
            .collect()
    }
    else if stereo.contains(ch) && src.contains(ChannelLayout::FRONT_CENTER) {
        src.index_of(ChannelLayout::FRONT_CENTER).map(|idx| vec![(idx, 1.0)]).unwrap_or_default()
    }
    else {
        Vec::new()
    }
}

impl SampleConverter for RubatoConverter {
    fn delay(&self) -> i64 {
        self.queue.first().map_or(0, |queue| queue.len()) as i64
    }

    fn push(&mut self, input: Option<&AudioSamples>) -> Result<()> {
        let input = match input {
            Some(input) => input,
            None => return self.flush(),
        };

        if *input.spec() != self.src {
            return Err(Error::InputFormatChanged);
        }

        // Without a resampler the remapped frames are ready immediately.
        let resampling = self.resampler.is_some();

        for (ch, mix) in self.mix.iter().enumerate() {
            let remapped = (0..input.frames()).map(|frame| {
                let value: f64 =
                    mix.iter().map(|&(src, gain)| gain * input.sample_f64(src, frame)).sum();
                f32::from_sample(value)
            });

            if resampling {
                self.input[ch].extend(remapped);
            }
            else {
                self.queue[ch].extend(remapped);
            }
        }

        self.frames_in += input.frames() as u64;

        if resampling {
            self.process_chunks()
        }
        else {
            self.frames_out += input.frames() as u64;
            Ok(())
        }
    }

    fn pull(&mut self, out: &mut AudioSamples, max_frames: usize) -> Result<usize> {
        if *out.spec() != self.dst {
            return Err(Error::OutputFormatChanged);
        }

        let count = max_frames.min(out.frames()).min(self.delay().max(0) as usize);

        for (ch, queue) in self.queue.iter_mut().enumerate() {
            for (frame, sample) in queue.drain(..count).enumerate() {
                out.set_sample_f64(ch, frame, f64::from_sample(sample));
            }
        }

        Ok(count)
    }

    fn reset(&mut self) {
        for plane in self.input.iter_mut() {
            plane.clear();
        }

        for queue in self.queue.iter_mut() {
            queue.clear();
        }

        // A fresh resampler has no history. Its construction succeeded once already.
        if let Err(err) = self.start_segment() {
            warn!("failed to restart resampler: {}", err);
        }
    }
}
