//! Marketing channels and per-channel lookup tables.

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};

/// The closed set of marketing channels a budget can be spread across.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Television
    Tv,
    /// Radio
    Radio,
    /// Print (newspapers, magazines)
    Print,
    /// Paid digital (display, search ads)
    Digital,
    /// Social media
    Social,
    /// Search engine optimisation
    Seo,
    /// Events and sponsorships
    Events,
    /// Public relations
    Pr,
}

impl Channel {
    /// Number of channels.
    pub const COUNT: usize = 8;

    /// All channels in table order.
    pub const ALL: [Channel; Channel::COUNT] = [
        Channel::Tv,
        Channel::Radio,
        Channel::Print,
        Channel::Digital,
        Channel::Social,
        Channel::Seo,
        Channel::Events,
        Channel::Pr,
    ];

    /// Position of the channel in a [`ChannelTable`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase identifier, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Tv => "tv",
            Channel::Radio => "radio",
            Channel::Print => "print",
            Channel::Digital => "digital",
            Channel::Social => "social",
            Channel::Seo => "seo",
            Channel::Events => "events",
            Channel::Pr => "pr",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-size table holding one value per [`Channel`].
///
/// Serializes as a map keyed by channel name; channels missing from the
/// input take `T::default()`.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelTable<T>([T; Channel::COUNT]);

impl<T> ChannelTable<T> {
    /// Build a table by evaluating `f` for every channel.
    pub fn from_fn(mut f: impl FnMut(Channel) -> T) -> Self {
        Self(std::array::from_fn(|i| f(Channel::ALL[i])))
    }

    /// Iterate `(channel, value)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &T)> + '_ {
        Channel::ALL.iter().copied().zip(self.0.iter())
    }

    /// Map every value into a new table.
    pub fn map<U>(&self, mut f: impl FnMut(Channel, &T) -> U) -> ChannelTable<U> {
        ChannelTable::from_fn(|c| f(c, &self[c]))
    }
}

impl ChannelTable<f64> {
    /// Sum across all channels.
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Channels with a strictly positive value, in table order.
    pub fn active(&self) -> Vec<Channel> {
        self.iter()
            .filter(|(_, v)| **v > 0.0)
            .map(|(c, _)| c)
            .collect()
    }
}

impl<T: Default> Default for ChannelTable<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<Channel> for ChannelTable<T> {
    type Output = T;

    fn index(&self, channel: Channel) -> &T {
        &self.0[channel.index()]
    }
}

impl<T> IndexMut<Channel> for ChannelTable<T> {
    fn index_mut(&mut self, channel: Channel) -> &mut T {
        &mut self.0[channel.index()]
    }
}

impl<T: Serialize> Serialize for ChannelTable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Channel::COUNT))?;
        for (channel, value) in self.iter() {
            map.serialize_entry(&channel, value)?;
        }
        map.end()
    }
}

impl<'de, T: Deserialize<'de> + Default> Deserialize<'de> for ChannelTable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<Channel, T>::deserialize(deserializer)?;
        let mut table = ChannelTable::default();
        for (channel, value) in entries {
            table[channel] = value;
        }
        Ok(table)
    }
}

/// Response-curve parameters for a single channel.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelParams {
    /// Share of last tick's adstock carried into this tick, in [0, 1).
    pub decay_rate: f64,
    /// Adstocked spend at which the Hill response reaches 0.5 (> 0).
    pub half_saturation: f64,
    /// Hill shape exponent (> 0); larger values give a sharper threshold.
    pub shape: f64,
    /// Visitors generated per response-weighted dollar (>= 0).
    pub efficiency: f64,
}

impl ChannelParams {
    /// Calibrated defaults for a channel.
    pub fn default_for(channel: Channel) -> Self {
        let (decay_rate, half_saturation, shape, efficiency) = match channel {
            Channel::Tv => (0.3, 50_000.0, 2.0, 0.8),
            Channel::Radio => (0.4, 20_000.0, 1.8, 0.6),
            Channel::Print => (0.5, 15_000.0, 1.5, 0.4),
            Channel::Digital => (0.5, 25_000.0, 1.2, 1.2),
            Channel::Social => (0.6, 15_000.0, 1.3, 1.0),
            Channel::Seo => (0.85, 10_000.0, 1.0, 1.5),
            Channel::Events => (0.35, 30_000.0, 2.5, 0.5),
            Channel::Pr => (0.7, 12_000.0, 1.6, 0.7),
        };
        Self {
            decay_rate,
            half_saturation,
            shape,
            efficiency,
        }
    }

    /// The default parameter table covering every channel.
    pub fn default_table() -> ChannelTable<ChannelParams> {
        ChannelTable::from_fn(Self::default_for)
    }
}
