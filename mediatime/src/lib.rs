// Mediatime
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # Project Mediatime
//!
//! Mediatime is the timing layer of a media pipeline. It provides exact rational timebases,
//! timebase-safe timestamps, presentation timestamp reconstruction for decoded units, and an
//! audio resampler that keeps its output on a continuous timeline.
//!
//! # Usage
//!
//! The following steps describe how the pieces fit into a decode loop:
//!
//! 1.  Create one [`PtsReconstructor`][core::pts::PtsReconstructor] per decoded stream.
//! 2.  Before sending a packet to the decoder, create its reorder token with
//!     [`DecodeHint::from_packet`][core::pts::DecodeHint::from_packet]. The decoder must return
//!     the token with the unit decoded from the packet.
//! 3.  For every decoded unit, call
//!     [`PtsReconstructor::reconstruct`][core::pts::PtsReconstructor::reconstruct] with the timing
//!     of the most recently sent packet and the returned token. The result is the presentation
//!     timestamp of the unit.
//! 4.  For audio, create a [`ResampleBuffer`][resample::ResampleBuffer] converting the decoded
//!     [`AudioSpec`][core::audio::AudioSpec] to the one the consumer wants. Push every decoded
//!     buffer, then pop fixed size buffers until `pop` returns `Ok(false)`.
//! 5.  At the end of the stream, push [`AudioSamples::null`][core::audio::AudioSamples::null],
//!     and pop with `drain` set until `pop` returns `Ok(false)`.
//!
//! Every popped buffer carries a timestamp in the `1/dst_rate` timebase that directly follows the
//! previously popped buffer.

pub use mediatime_core as core;
pub use mediatime_resample as resample;
