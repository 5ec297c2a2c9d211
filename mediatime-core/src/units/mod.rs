// Mediatime
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `units` module provides definitions for common units of time.
//!
//! A [`Rational`] is an exact fraction used as a timebase, the length in seconds of one tick. A
//! [`Timestamp`] is a tick count in some timebase, and may be invalid when the time is unknown.

mod rational;
mod timestamp;

pub use rational::{Rational, TIME_BASE, TIME_BASE_Q};
pub use timestamp::{Timestamp, NANOSECONDS_Q, NO_PTS};
