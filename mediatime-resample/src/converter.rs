// Mediatime
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use mediatime_core::audio::AudioSamples;
use mediatime_core::errors::Result;

/// A `SampleConverter` converts audio from a fixed source format, sample rate, and channel layout
/// to a fixed destination format, sample rate, and channel layout.
///
/// The converter owns a queue of samples. Input is pushed in the source format and output is
/// pulled in the destination format, in any mix of buffer sizes.
pub trait SampleConverter: Send {
    /// Gets the number of output frames that can be pulled right now.
    fn delay(&self) -> i64;

    /// Queues input samples. `None` flushes the converter: every queued sample becomes ready to
    /// pull, including a final partial frame.
    fn push(&mut self, input: Option<&AudioSamples>) -> Result<()>;

    /// Pulls at most `max_frames` output frames into `out`, starting at frame 0, and returns the
    /// number of frames written. The frame count of `out` is not changed.
    fn pull(&mut self, out: &mut AudioSamples, max_frames: usize) -> Result<usize>;

    /// Discards every queued sample.
    fn reset(&mut self);
}
