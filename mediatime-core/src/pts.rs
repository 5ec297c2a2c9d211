// Mediatime
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `pts` module reconstructs presentation timestamps for decoded units.
//!
//! A decoder may emit units out of the order their packets were consumed (B-frames), and packets
//! may carry missing or unreliable timestamps. [`PtsReconstructor`] derives a consistent
//! presentation timestamp for every decoded unit from the timing of the packet most recently
//! consumed, a reorder token carried through the decoder alongside the unit ([`DecodeHint`]), and
//! a repetition hint.

use log::trace;

use crate::packet::PacketTiming;
use crate::units::{Rational, Timestamp};

/// `DecodeHint` is the per-unit information a decoder reports alongside a decoded unit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeHint {
    /// The reorder token: the presentation timestamp of the packet the unit was decoded from,
    /// carried through the decoder with the unit. Expressed in the packet timebase.
    pub reordered: Option<i64>,
    /// The number of extra half-units the unit spans, for example a repeated field.
    pub repeat: u32,
}

impl DecodeHint {
    /// Creates the reorder token for a packet about to be sent to the decoder. The decoder must
    /// hand the token back with the unit decoded from this packet.
    pub fn from_packet(packet: &PacketTiming) -> Self {
        DecodeHint { reordered: packet.pts, repeat: 0 }
    }

    /// Sets the repetition hint.
    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }
}

/// The state of a [`PtsReconstructor`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReconstructorState {
    /// No unit has been reconstructed since creation or the last reset.
    Fresh,
    /// At least one unit has been reconstructed.
    Tracking,
}

/// `PtsReconstructor` assigns presentation timestamps to the decoded units of a single stream.
///
/// For every decoded unit, the reconstructor:
///
/// 1. Takes the reorder token of the unit if present, otherwise the DTS of the packet.
/// 2. If that timestamp is known, it becomes the prediction. When it is earlier than the current
///    prediction and the packet has a known PTS, the packet PTS is used instead. An unknown
///    prediction is earlier than everything.
/// 3. Hands out the prediction as the unit's timestamp.
/// 4. Advances the prediction by `round(time_base * (1 + repeat / 2))` ticks of the packet
///    timebase.
///
/// Discontinuities, such as a seek, are not detected. Call [`PtsReconstructor::reset`] when one
/// occurs.
#[derive(Clone, Debug)]
pub struct PtsReconstructor {
    next_predicted: Timestamp,
    current: Timestamp,
    stream_index: i32,
    state: ReconstructorState,
}

impl PtsReconstructor {
    /// Creates a reconstructor for the stream `stream_index`.
    pub fn new(stream_index: i32) -> Self {
        PtsReconstructor {
            next_predicted: Timestamp::default(),
            current: Timestamp::default(),
            stream_index,
            state: ReconstructorState::Fresh,
        }
    }

    /// Reconstructs the presentation timestamp of a decoded unit, expressed in `unit_time_base`.
    ///
    /// `packet` is the timing of the packet most recently sent to the decoder, and `hint` is the
    /// information the decoder returned with the unit. If `unit_time_base` is undefined, the
    /// timestamp is returned in the packet timebase.
    ///
    /// An invalid timestamp is returned if nothing is known about the time of the unit.
    pub fn reconstruct(
        &mut self,
        packet: &PacketTiming,
        hint: &DecodeHint,
        unit_time_base: Rational,
    ) -> Timestamp {
        let packet_ts = match hint.reordered {
            Some(ticks) => Timestamp::new(ticks, packet.time_base),
            None => packet.dts(),
        };

        if packet_ts.is_valid() {
            let mut candidate = packet_ts;

            // An unknown prediction never compares as later.
            if candidate < self.next_predicted && packet.pts.is_some() {
                trace!(
                    "stream {}: reorder token {} is earlier than prediction {}, using pts",
                    self.stream_index,
                    candidate,
                    self.next_predicted
                );
                candidate = packet.pts();
            }

            self.next_predicted = candidate;
        }

        self.current = self.next_predicted;

        let frame_delay = packet.time_base.to_f64() * (1.0 + 0.5 * f64::from(hint.repeat));
        let advance = frame_delay.round();

        if advance.is_finite() && advance != 0.0 {
            self.next_predicted += Timestamp::new(advance as i64, packet.time_base);
        }

        self.state = ReconstructorState::Tracking;

        trace!(
            "stream {}: current={}, next_predicted={}",
            self.stream_index,
            self.current,
            self.next_predicted
        );

        if unit_time_base.is_undefined() {
            self.current
        }
        else {
            self.current.rescaled(unit_time_base)
        }
    }

    /// Returns the reconstructor to the fresh state, forgetting any prediction.
    pub fn reset(&mut self) {
        self.next_predicted = Timestamp::default();
        self.current = Timestamp::default();
        self.state = ReconstructorState::Fresh;
    }

    pub fn stream_index(&self) -> i32 {
        self.stream_index
    }

    /// Gets the timestamp most recently handed out, in the packet timebase.
    pub fn current(&self) -> Timestamp {
        self.current
    }

    /// Gets the timestamp that will be handed out for the next unit if no new timing arrives.
    pub fn next_predicted(&self) -> Timestamp {
        self.next_predicted
    }

    pub fn state(&self) -> ReconstructorState {
        self.state
    }
}
