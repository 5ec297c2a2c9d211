// Mediatime
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Audio sample rate, format, and channel layout conversion with continuous output timestamps.
//!
//! A [`ResampleBuffer`] wraps a [`SampleConverter`], by default the rubato-backed
//! [`RubatoConverter`]. Audio is pushed in arbitrarily sized buffers and popped in buffers of a
//! fixed size, each stamped with a presentation timestamp in the `1/dst_rate` timebase that
//! directly follows the previously popped buffer.

mod buffer;
mod converter;
mod resampler;

pub use buffer::ResampleBuffer;
pub use converter::SampleConverter;
pub use resampler::{RubatoConverter, RUBATO_ERROR};
