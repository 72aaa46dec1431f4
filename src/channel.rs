use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// One light source of the engine, plus the yellow/green filter which shares
/// the enable register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Red,
    Green,
    Cyan,
    Uv,
    Filter,
    Blue,
    Teal,
}

/// IIC address of a DAC driving a subset of channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DacBank {
    /// 0x18: red, green, cyan, uv
    Primary,
    /// 0x1A: blue, teal
    Secondary,
}

/// Position of the emission filter, toggled through [`Channel::Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Yellow,
    Green,
}

struct ChannelInfo {
    name: &'static str,
    enable_bit: u8,
    dac: Option<(DacBank, u8)>,
}

static TABLE: [(Channel, ChannelInfo); 7] = [
    (Channel::Red, ChannelInfo { name: "red", enable_bit: 0, dac: Some((DacBank::Primary, 0x08)) }),
    (Channel::Green, ChannelInfo { name: "green", enable_bit: 1, dac: Some((DacBank::Primary, 0x04)) }),
    (Channel::Cyan, ChannelInfo { name: "cyan", enable_bit: 2, dac: Some((DacBank::Primary, 0x02)) }),
    (Channel::Uv, ChannelInfo { name: "uv", enable_bit: 3, dac: Some((DacBank::Primary, 0x01)) }),
    (Channel::Filter, ChannelInfo { name: "filter", enable_bit: 4, dac: None }),
    (Channel::Blue, ChannelInfo { name: "blue", enable_bit: 5, dac: Some((DacBank::Secondary, 0x01)) }),
    (Channel::Teal, ChannelInfo { name: "teal", enable_bit: 6, dac: Some((DacBank::Secondary, 0x02)) }),
];

impl Channel {
    pub const ALL: [Channel; 7] = [
        Channel::Red,
        Channel::Green,
        Channel::Cyan,
        Channel::Uv,
        Channel::Filter,
        Channel::Blue,
        Channel::Teal,
    ];

    fn info(self) -> &'static ChannelInfo {
        // TABLE is ordered like the enum discriminants
        &TABLE[self as usize].1
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Bit of the enable register gating this channel.
    pub fn enable_mask(self) -> u8 {
        1 << self.info().enable_bit
    }

    /// DAC bank and selector bit for intensity control. `None` for the filter.
    pub fn dac(self) -> Option<(DacBank, u8)> {
        self.info().dac
    }

    /// Parses every name before returning, so one bad name rejects the lot.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Channel>, Error> {
        names.iter().map(|n| n.as_ref().parse()).collect()
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TABLE
            .iter()
            .find(|(_, info)| info.name.eq_ignore_ascii_case(wanted))
            .map(|(channel, _)| *channel)
            .ok_or_else(|| Error::InvalidChannel(s.to_string()))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl DacBank {
    pub const ALL: [DacBank; 2] = [DacBank::Primary, DacBank::Secondary];

    pub fn address(self) -> u8 {
        match self {
            DacBank::Primary => 0x18,
            DacBank::Secondary => 0x1A,
        }
    }
}

/// OR of the enable bits of `channels`.
pub fn enable_mask(channels: &[Channel]) -> u8 {
    channels.iter().fold(0, |mask, c| mask | c.enable_mask())
}

/// OR of the DAC selectors of `channels` that live on `bank`.
pub fn selector(channels: &[Channel], bank: DacBank) -> u8 {
    channels
        .iter()
        .filter_map(|c| c.dac())
        .filter(|(b, _)| *b == bank)
        .fold(0, |sel, (_, bit)| sel | bit)
}
