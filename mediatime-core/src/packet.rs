// Mediatime
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `packet` module defines the timing view of an encoded packet.

use crate::units::{Rational, Timestamp, NO_PTS};

/// `PacketTiming` is the timing information carried by an encoded packet, as reported by the
/// demuxer that produced it. The packet data itself is not needed to time decoded output.
///
/// # Timing
///
/// * **Presentation Timestamp (PTS):** The time the decoded packet should be presented. Streams
///   with reordered frames (B-frames) present packets in a different order than they are decoded.
///
/// * **Decode Timestamp (DTS):** The time the packet should be decoded. The DTS is usually the
///   same as the PTS for audio.
///
/// * **Duration:** The duration of the packet.
///
/// Every field is expressed in ticks of `time_base`, and any of them may be unknown.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PacketTiming {
    /// The presentation timestamp, if known.
    pub pts: Option<i64>,
    /// The decode timestamp, if known.
    pub dts: Option<i64>,
    /// The duration, if known.
    pub duration: Option<i64>,
    /// The timebase of the timestamps.
    pub time_base: Rational,
    /// The index of the stream the packet belongs to.
    pub stream_index: i32,
}

impl PacketTiming {
    /// Creates timing for a packet of `stream_index` with all timestamps unknown.
    pub fn new(stream_index: i32, time_base: Rational) -> Self {
        PacketTiming { pts: None, dts: None, duration: None, time_base, stream_index }
    }

    /// Creates timing from raw timestamps, where [`NO_PTS`] marks an unknown value.
    pub fn from_raw(stream_index: i32, time_base: Rational, pts: i64, dts: i64, dur: i64) -> Self {
        let known = |ts: i64| if ts == NO_PTS { None } else { Some(ts) };

        PacketTiming {
            pts: known(pts),
            dts: known(dts),
            duration: known(dur),
            time_base,
            stream_index,
        }
    }

    pub fn with_pts(mut self, pts: i64) -> Self {
        self.pts = Some(pts);
        self
    }

    pub fn with_dts(mut self, dts: i64) -> Self {
        self.dts = Some(dts);
        self
    }

    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Gets the presentation timestamp as a [`Timestamp`] in the packet timebase.
    #[inline]
    pub fn pts(&self) -> Timestamp {
        Timestamp::from_ticks(self.pts, self.time_base)
    }

    /// Gets the decode timestamp as a [`Timestamp`] in the packet timebase.
    #[inline]
    pub fn dts(&self) -> Timestamp {
        Timestamp::from_ticks(self.dts, self.time_base)
    }

    /// Gets the duration as a [`Timestamp`] in the packet timebase.
    #[inline]
    pub fn duration(&self) -> Timestamp {
        Timestamp::from_ticks(self.duration, self.time_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_from_raw() {
        let tb = Rational::new(1, 90_000);
        let timing = PacketTiming::from_raw(1, tb, 3_000, NO_PTS, 1_500);

        assert_eq!(timing.pts, Some(3_000));
        assert_eq!(timing.dts, None);
        assert_eq!(timing.duration, Some(1_500));
        assert_eq!(timing.stream_index, 1);

        assert_eq!(timing.pts().seconds(), 3_000.0 / 90_000.0);
        assert!(!timing.dts().is_valid());
        assert_eq!(timing.dts().to_raw(), NO_PTS);
    }

    #[test]
    fn verify_builder() {
        let tb = Rational::new(1, 1000);
        let timing = PacketTiming::new(0, tb).with_pts(40).with_dts(0).with_duration(40);

        assert_eq!(timing, PacketTiming::from_raw(0, tb, 40, 0, 40));
        assert_eq!(timing.duration(), Timestamp::new(40, tb));
    }
}
