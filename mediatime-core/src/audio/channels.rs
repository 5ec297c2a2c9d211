// Mediatime
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::errors::Error;

bitflags! {
    /// A bitmask of positional audio channels.
    ///
    /// The first 18 channel positions are identical to those specified by the channel mask in
    /// Microsoft's `WAVEFORMATEXTENSIBLE` structure. The remaining positions use the bits common
    /// codec libraries assign to them, so a mask can be exchanged with those libraries unchanged.
    ///
    /// The samples of the channels in a buffer are stored in the order of their bits, lowest bit
    /// first.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ChannelLayout: u64 {
        /// Front-left (left) channel.
        const FRONT_LEFT            = 1 << 0;
        /// Front-right (right) channel.
        const FRONT_RIGHT           = 1 << 1;
        /// Front-center (center) or the mono channel.
        const FRONT_CENTER          = 1 << 2;
        /// Low-frequency effects channel.
        const LOW_FREQUENCY         = 1 << 3;
        /// Back-left channel.
        const BACK_LEFT             = 1 << 4;
        /// Back-right channel.
        const BACK_RIGHT            = 1 << 5;
        /// Front left-of-center channel.
        const FRONT_LEFT_OF_CENTER  = 1 << 6;
        /// Front right-of-center channel.
        const FRONT_RIGHT_OF_CENTER = 1 << 7;
        /// Back-center channel.
        const BACK_CENTER           = 1 << 8;
        /// Side-left channel.
        const SIDE_LEFT             = 1 << 9;
        /// Side-right channel.
        const SIDE_RIGHT            = 1 << 10;
        /// Top-center channel.
        const TOP_CENTER            = 1 << 11;
        /// Top-front left channel.
        const TOP_FRONT_LEFT        = 1 << 12;
        /// Top-front center channel.
        const TOP_FRONT_CENTER      = 1 << 13;
        /// Top-front right channel.
        const TOP_FRONT_RIGHT       = 1 << 14;
        /// Top-back left channel.
        const TOP_BACK_LEFT         = 1 << 15;
        /// Top-back center channel.
        const TOP_BACK_CENTER       = 1 << 16;
        /// Top-back right channel.
        const TOP_BACK_RIGHT        = 1 << 17;

        // End of standard WAVE channels.

        /// Stereo downmix left channel.
        const STEREO_LEFT           = 1 << 29;
        /// Stereo downmix right channel.
        const STEREO_RIGHT          = 1 << 30;
        /// Front-left wide channel.
        const WIDE_LEFT             = 1 << 31;
        /// Front-right wide channel.
        const WIDE_RIGHT            = 1 << 32;
        /// Surround direct left channel.
        const SURROUND_DIRECT_LEFT  = 1 << 33;
        /// Surround direct right channel.
        const SURROUND_DIRECT_RIGHT = 1 << 34;
        /// Second low-frequency effects channel.
        const LOW_FREQUENCY_2       = 1 << 35;
    }
}

const CHANNEL_NAMES: &[(ChannelLayout, &str)] = &[
    (ChannelLayout::FRONT_LEFT, "FL"),
    (ChannelLayout::FRONT_RIGHT, "FR"),
    (ChannelLayout::FRONT_CENTER, "FC"),
    (ChannelLayout::LOW_FREQUENCY, "LFE"),
    (ChannelLayout::BACK_LEFT, "BL"),
    (ChannelLayout::BACK_RIGHT, "BR"),
    (ChannelLayout::FRONT_LEFT_OF_CENTER, "FLC"),
    (ChannelLayout::FRONT_RIGHT_OF_CENTER, "FRC"),
    (ChannelLayout::BACK_CENTER, "BC"),
    (ChannelLayout::SIDE_LEFT, "SL"),
    (ChannelLayout::SIDE_RIGHT, "SR"),
    (ChannelLayout::TOP_CENTER, "TC"),
    (ChannelLayout::TOP_FRONT_LEFT, "TFL"),
    (ChannelLayout::TOP_FRONT_CENTER, "TFC"),
    (ChannelLayout::TOP_FRONT_RIGHT, "TFR"),
    (ChannelLayout::TOP_BACK_LEFT, "TBL"),
    (ChannelLayout::TOP_BACK_CENTER, "TBC"),
    (ChannelLayout::TOP_BACK_RIGHT, "TBR"),
    (ChannelLayout::STEREO_LEFT, "DL"),
    (ChannelLayout::STEREO_RIGHT, "DR"),
    (ChannelLayout::WIDE_LEFT, "WL"),
    (ChannelLayout::WIDE_RIGHT, "WR"),
    (ChannelLayout::SURROUND_DIRECT_LEFT, "SDL"),
    (ChannelLayout::SURROUND_DIRECT_RIGHT, "SDR"),
    (ChannelLayout::LOW_FREQUENCY_2, "LFE2"),
];

pub mod layouts {
    //! Constants for common channel layouts.
    //!
    //! The names in [`NAMED_LAYOUTS`] are the conventional names used by common codec libraries,
    //! for example `5.1` for front left, front right, front center, low-frequency effects, back
    //! left, and back right.
    use super::ChannelLayout;

    macro_rules! layout {
        ($($args:expr),*) => {{
            let pos = ChannelLayout::empty();
            $(
                let pos = pos.union($args);
            )*
            pos
        }}
    }

    pub const MONO: ChannelLayout = ChannelLayout::FRONT_CENTER;
    pub const STEREO: ChannelLayout =
        layout!(ChannelLayout::FRONT_LEFT, ChannelLayout::FRONT_RIGHT);
    pub const LAYOUT_2P1: ChannelLayout = layout!(STEREO, ChannelLayout::LOW_FREQUENCY);
    pub const LAYOUT_2_1: ChannelLayout = layout!(STEREO, ChannelLayout::BACK_CENTER);
    pub const SURROUND: ChannelLayout = layout!(STEREO, ChannelLayout::FRONT_CENTER);
    pub const LAYOUT_3P1: ChannelLayout = layout!(SURROUND, ChannelLayout::LOW_FREQUENCY);
    pub const LAYOUT_4P0: ChannelLayout = layout!(SURROUND, ChannelLayout::BACK_CENTER);
    pub const LAYOUT_4P1: ChannelLayout = layout!(LAYOUT_4P0, ChannelLayout::LOW_FREQUENCY);
    pub const LAYOUT_2_2: ChannelLayout =
        layout!(STEREO, ChannelLayout::SIDE_LEFT, ChannelLayout::SIDE_RIGHT);
    pub const QUAD: ChannelLayout =
        layout!(STEREO, ChannelLayout::BACK_LEFT, ChannelLayout::BACK_RIGHT);
    pub const LAYOUT_5P0: ChannelLayout =
        layout!(SURROUND, ChannelLayout::SIDE_LEFT, ChannelLayout::SIDE_RIGHT);
    pub const LAYOUT_5P0_BACK: ChannelLayout =
        layout!(SURROUND, ChannelLayout::BACK_LEFT, ChannelLayout::BACK_RIGHT);
    pub const LAYOUT_5P1: ChannelLayout = layout!(LAYOUT_5P0, ChannelLayout::LOW_FREQUENCY);
    pub const LAYOUT_5P1_BACK: ChannelLayout =
        layout!(LAYOUT_5P0_BACK, ChannelLayout::LOW_FREQUENCY);
    pub const LAYOUT_6P0: ChannelLayout = layout!(LAYOUT_5P0, ChannelLayout::BACK_CENTER);
    pub const HEXAGONAL: ChannelLayout = layout!(LAYOUT_5P0_BACK, ChannelLayout::BACK_CENTER);
    pub const LAYOUT_6P1: ChannelLayout = layout!(LAYOUT_5P1, ChannelLayout::BACK_CENTER);
    pub const LAYOUT_7P0: ChannelLayout =
        layout!(LAYOUT_5P0, ChannelLayout::BACK_LEFT, ChannelLayout::BACK_RIGHT);
    pub const LAYOUT_7P1: ChannelLayout =
        layout!(LAYOUT_5P1, ChannelLayout::BACK_LEFT, ChannelLayout::BACK_RIGHT);
    pub const LAYOUT_7P1_WIDE: ChannelLayout = layout!(
        LAYOUT_5P1_BACK,
        ChannelLayout::FRONT_LEFT_OF_CENTER,
        ChannelLayout::FRONT_RIGHT_OF_CENTER
    );
    pub const OCTAGONAL: ChannelLayout = layout!(
        LAYOUT_5P0,
        ChannelLayout::BACK_LEFT,
        ChannelLayout::BACK_CENTER,
        ChannelLayout::BACK_RIGHT
    );
    pub const STEREO_DOWNMIX: ChannelLayout =
        layout!(ChannelLayout::STEREO_LEFT, ChannelLayout::STEREO_RIGHT);

    /// Every named layout. A mask matching more than one entry takes the name of the first.
    pub const NAMED_LAYOUTS: &[(&str, ChannelLayout)] = &[
        ("mono", MONO),
        ("stereo", STEREO),
        ("2.1", LAYOUT_2P1),
        ("3.0", SURROUND),
        ("3.0(back)", LAYOUT_2_1),
        ("4.0", LAYOUT_4P0),
        ("quad", QUAD),
        ("quad(side)", LAYOUT_2_2),
        ("3.1", LAYOUT_3P1),
        ("5.0", LAYOUT_5P0_BACK),
        ("5.0(side)", LAYOUT_5P0),
        ("4.1", LAYOUT_4P1),
        ("5.1", LAYOUT_5P1_BACK),
        ("5.1(side)", LAYOUT_5P1),
        ("6.0", LAYOUT_6P0),
        ("hexagonal", HEXAGONAL),
        ("6.1", LAYOUT_6P1),
        ("7.0", LAYOUT_7P0),
        ("7.1", LAYOUT_7P1),
        ("7.1(wide)", LAYOUT_7P1_WIDE),
        ("octagonal", OCTAGONAL),
        ("downmix", STEREO_DOWNMIX),
    ];
}

impl ChannelLayout {
    /// Gets the number of channels in the layout.
    pub fn channels(&self) -> usize {
        self.bits().count_ones() as usize
    }

    /// Returns `true` if the layout has at least one channel.
    pub fn is_valid(&self) -> bool {
        !self.is_empty()
    }

    /// Gets the buffer index of a single channel within the layout, or `None` if `channel` is not
    /// a single channel contained in the layout.
    pub fn index_of(&self, channel: ChannelLayout) -> Option<usize> {
        if channel.bits().count_ones() != 1 || !self.contains(channel) {
            return None;
        }

        // All channels of the layout that trail the selected channel come before it.
        let trailing = self.bits() & (channel.bits() - 1);
        Some(trailing.count_ones() as usize)
    }

    /// Gets the channel stored at buffer index `index`.
    pub fn channel_at(&self, index: usize) -> Option<ChannelLayout> {
        self.iter().nth(index)
    }

    /// Gets the channels of the layout that are also in `mask`.
    pub fn subset(&self, mask: ChannelLayout) -> ChannelLayout {
        self.intersection(mask)
    }

    /// Gets the default layout for a channel count.
    ///
    /// Counts without a conventional layout, and zero, return `None`.
    pub fn default_for_channels(channels: usize) -> Option<ChannelLayout> {
        match channels {
            1 => Some(layouts::MONO),
            2 => Some(layouts::STEREO),
            3 => Some(layouts::SURROUND),
            4 => Some(layouts::QUAD),
            5 => Some(layouts::LAYOUT_5P0_BACK),
            6 => Some(layouts::LAYOUT_5P1_BACK),
            7 => Some(layouts::LAYOUT_6P1),
            8 => Some(layouts::LAYOUT_7P1),
            _ => None,
        }
    }

    /// Gets the conventional name of the layout, if it has one.
    pub fn name(&self) -> Option<&'static str> {
        layouts::NAMED_LAYOUTS.iter().find(|(_, layout)| layout == self).map(|(name, _)| *name)
    }

    /// Describes the layout. Named layouts are described by their name, others by their channel
    /// count followed by the list of their channels, for example `3 channels (FL+FR+LFE2)`.
    pub fn describe(&self) -> String {
        if let Some(name) = self.name() {
            return name.to_string();
        }

        let list = self.iter().map(channel_name).collect::<Vec<_>>().join("+");

        format!("{} channels ({})", self.channels(), list)
    }
}

fn channel_name(channel: ChannelLayout) -> &'static str {
    CHANNEL_NAMES.iter().find(|(pos, _)| *pos == channel).map(|(_, name)| *name).unwrap_or("?")
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl FromStr for ChannelLayout {
    type Err = Error;

    /// Parses a layout name (`5.1`), a channel list (`FL+FR+LFE`), or a channel count (`6c`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ERR: Error = Error::InvalidParameters("unknown channel layout");

        let s = s.trim();

        if let Some((_, layout)) = layouts::NAMED_LAYOUTS.iter().find(|(name, _)| *name == s) {
            return Ok(*layout);
        }

        if let Some(count) = s.strip_suffix('c') {
            let count = count.parse::<usize>().map_err(|_| ERR)?;
            return ChannelLayout::default_for_channels(count).ok_or(ERR);
        }

        let mut layout = ChannelLayout::empty();

        for name in s.split('+') {
            let (channel, _) = CHANNEL_NAMES.iter().find(|(_, n)| *n == name).ok_or(ERR)?;
            layout |= *channel;
        }

        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::layouts::*;
    use super::*;

    #[test]
    fn verify_channel_counts() {
        assert_eq!(MONO.channels(), 1);
        assert_eq!(STEREO.channels(), 2);
        assert_eq!(LAYOUT_5P1_BACK.channels(), 6);
        assert_eq!(LAYOUT_7P1.channels(), 8);
        assert_eq!(OCTAGONAL.channels(), 8);
        assert_eq!(ChannelLayout::empty().channels(), 0);
        assert!(!ChannelLayout::empty().is_valid());
        assert!(MONO.is_valid());
    }

    #[test]
    fn verify_wave_compatible_bits() {
        assert_eq!(STEREO.bits(), 0x3);
        assert_eq!(LAYOUT_5P1_BACK.bits(), 0x3f);
        assert_eq!(LAYOUT_5P1.bits(), 0x60f);
        assert_eq!(LAYOUT_7P1.bits(), 0x63f);
    }

    #[test]
    fn verify_index_of() {
        let layout = LAYOUT_5P1_BACK;

        assert_eq!(layout.index_of(ChannelLayout::FRONT_LEFT), Some(0));
        assert_eq!(layout.index_of(ChannelLayout::FRONT_CENTER), Some(2));
        assert_eq!(layout.index_of(ChannelLayout::BACK_RIGHT), Some(5));
        assert_eq!(layout.index_of(ChannelLayout::SIDE_LEFT), None);
        assert_eq!(layout.index_of(STEREO), None);

        for i in 0..layout.channels() {
            let channel = layout.channel_at(i).unwrap();
            assert_eq!(layout.index_of(channel), Some(i));
        }

        assert_eq!(layout.channel_at(6), None);
    }

    #[test]
    fn verify_subset() {
        assert_eq!(LAYOUT_5P1_BACK.subset(STEREO), STEREO);
        assert_eq!(STEREO.subset(MONO), ChannelLayout::empty());
        assert_eq!(LAYOUT_7P1.subset(LAYOUT_5P1), LAYOUT_5P1);
    }

    #[test]
    fn verify_default_for_channels() {
        assert_eq!(ChannelLayout::default_for_channels(0), None);
        assert_eq!(ChannelLayout::default_for_channels(1), Some(MONO));
        assert_eq!(ChannelLayout::default_for_channels(2), Some(STEREO));
        assert_eq!(ChannelLayout::default_for_channels(6), Some(LAYOUT_5P1_BACK));
        assert_eq!(ChannelLayout::default_for_channels(9), None);

        for n in 1..=8 {
            assert_eq!(ChannelLayout::default_for_channels(n).map(|l| l.channels()), Some(n));
        }
    }

    #[test]
    fn verify_describe() {
        assert_eq!(STEREO.describe(), "stereo");
        assert_eq!(LAYOUT_5P1_BACK.to_string(), "5.1");
        assert_eq!(LAYOUT_5P1.to_string(), "5.1(side)");

        let odd = ChannelLayout::FRONT_LEFT | ChannelLayout::LOW_FREQUENCY_2;
        assert_eq!(odd.describe(), "2 channels (FL+LFE2)");
    }

    #[test]
    fn verify_parse() {
        for (name, layout) in NAMED_LAYOUTS {
            assert_eq!(name.parse::<ChannelLayout>(), Ok(*layout));
        }

        assert_eq!("FL+FR+LFE".parse::<ChannelLayout>(), Ok(LAYOUT_2P1));
        assert_eq!("6c".parse::<ChannelLayout>(), Ok(LAYOUT_5P1_BACK));
        assert!("9c".parse::<ChannelLayout>().is_err());
        assert!("FL+XX".parse::<ChannelLayout>().is_err());
        assert!("surround-ish".parse::<ChannelLayout>().is_err());

        let odd = ChannelLayout::FRONT_LEFT | ChannelLayout::LOW_FREQUENCY_2;
        assert_eq!("FL+LFE2".parse::<ChannelLayout>(), Ok(odd));
    }
}
