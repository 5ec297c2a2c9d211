// Mediatime Check Tool
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::f64::consts::PI;

use mediatime::core::audio::{AudioSamples, AudioSpec};
use mediatime::core::errors::Result;
use mediatime::core::packet::PacketTiming;
use mediatime::core::pts::{DecodeHint, PtsReconstructor};
use mediatime::resample::ResampleBuffer;

use log::{debug, info};

/// The frequency of the synthetic tone.
const TONE_HZ: f64 = 440.0;

pub struct PipelineOptions {
    pub src: AudioSpec,
    pub dst: AudioSpec,
    pub chunk: usize,
    pub out_frames: usize,
    pub chunks: usize,
    pub reorder: bool,
    pub is_quiet: bool,
}

#[derive(Default)]
pub struct PipelineResult {
    pub n_units: u64,
    pub n_failed_units: u64,
    pub n_buffers: u64,
    pub n_failed_buffers: u64,
    pub frames_in: u64,
    pub frames_out: u64,
}

impl PipelineResult {
    /// Gets the number of frames the resampler must emit for the frames pushed into it.
    pub fn frames_expected(&self, opts: &PipelineOptions) -> u64 {
        let num = u128::from(self.frames_in) * u128::from(opts.dst.rate);
        num.div_ceil(u128::from(opts.src.rate)) as u64
    }

    pub fn is_pass(&self, opts: &PipelineOptions) -> bool {
        self.n_failed_units == 0
            && self.n_failed_buffers == 0
            && self.frames_out == self.frames_expected(opts)
    }
}

/// Gets the order the packets of the stream are decoded in.
///
/// With reordering, every group of three units is sent as `I P B`: the third unit of the group
/// is decoded before the second, as a B-frame would be.
fn decode_order(chunks: usize, reorder: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..chunks).collect();

    if reorder {
        for group in order.chunks_mut(3) {
            if group.len() == 3 {
                group.swap(1, 2);
            }
        }
    }

    order
}

/// A stand-in for a decoder that buffers units decoded ahead of time and emits them in
/// presentation order.
struct ReorderingDecoder {
    pending: Vec<(usize, DecodeHint)>,
    next_unit: usize,
}

impl ReorderingDecoder {
    fn new() -> Self {
        ReorderingDecoder { pending: Vec::new(), next_unit: 0 }
    }

    fn send(&mut self, unit: usize, hint: DecodeHint) {
        self.pending.push((unit, hint));
    }

    fn receive(&mut self) -> Option<(usize, DecodeHint)> {
        let pos = self.pending.iter().position(|&(unit, _)| unit == self.next_unit)?;
        self.next_unit += 1;
        Some(self.pending.swap_remove(pos))
    }
}

fn synthesize(spec: AudioSpec, first_frame: usize, frames: usize) -> Result<AudioSamples> {
    let mut samples = AudioSamples::new(spec, frames)?;

    for frame in 0..frames {
        let t = (first_frame + frame) as f64 / f64::from(spec.rate);
        let value = 0.5 * (2.0 * PI * TONE_HZ * t).sin();

        for ch in 0..spec.channels() {
            samples.set_sample_f64(ch, frame, value);
        }
    }

    Ok(samples)
}

struct Checker<'a> {
    opts: &'a PipelineOptions,
    result: &'a mut PipelineResult,
    next_pts: i64,
}

impl Checker<'_> {
    fn check_unit(&mut self, unit: usize, ticks: Option<i64>) {
        let expected = (unit * self.opts.chunk) as i64;

        self.result.n_units += 1;

        if ticks != Some(expected) {
            self.result.n_failed_units += 1;

            if !self.opts.is_quiet {
                println!("[FAIL] unit {}: pts {:?}, expected {}", unit, ticks, expected);
            }
        }
    }

    fn pop_all(&mut self, buffer: &mut ResampleBuffer, drain: bool) -> Result<()> {
        while let Some(out) = buffer.pop_samples(self.opts.out_frames, drain)? {
            let ticks = out.pts().ticks();

            self.result.n_buffers += 1;

            if ticks != Some(self.next_pts) {
                self.result.n_failed_buffers += 1;

                if !self.opts.is_quiet {
                    println!(
                        "[FAIL] buffer {}: pts {:?}, expected {}",
                        self.result.n_buffers, ticks, self.next_pts
                    );
                }
            }

            debug!("popped {} frames at {}", out.frames(), out.pts());

            self.next_pts = ticks.unwrap_or(self.next_pts) + out.frames() as i64;
            self.result.frames_out += out.frames() as u64;
        }

        Ok(())
    }
}

/// Runs a synthetic decode, reconstruct, resample, and drain pipeline.
pub fn run(opts: &PipelineOptions, result: &mut PipelineResult) -> Result<()> {
    let packet_tb = opts.src.time_base();

    let mut reconstructor = PtsReconstructor::new(0);
    let mut decoder = ReorderingDecoder::new();
    let mut buffer = ResampleBuffer::new(opts.dst, opts.src)?;

    info!("{} -> {}", opts.src, opts.dst);

    let mut checker = Checker { opts, result, next_pts: 0 };

    for (pos, unit) in decode_order(opts.chunks, opts.reorder).into_iter().enumerate() {
        let pts = (unit * opts.chunk) as i64;

        // Decode timestamps trail by one unit when units are reordered.
        let dts = if opts.reorder { (pos as i64 - 1) * opts.chunk as i64 } else { pts };

        let packet = PacketTiming::new(0, packet_tb).with_pts(pts).with_dts(dts);

        // Without reordering the decoder drops the token, so the packet DTS is used.
        let hint =
            if opts.reorder { DecodeHint::from_packet(&packet) } else { DecodeHint::default() };

        decoder.send(unit, hint);

        while let Some((unit, hint)) = decoder.receive() {
            let ts = reconstructor.reconstruct(&packet, &hint, packet_tb);

            checker.check_unit(unit, ts.ticks());

            let mut samples = synthesize(opts.src, unit * opts.chunk, opts.chunk)?;
            samples.set_pts(ts);

            buffer.push(&samples)?;
            checker.result.frames_in += opts.chunk as u64;

            checker.pop_all(&mut buffer, false)?;
        }
    }

    buffer.push(&AudioSamples::null())?;
    checker.pop_all(&mut buffer, true)?;

    Ok(())
}
