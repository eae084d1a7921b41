use std::collections::BTreeMap;
use std::fmt;

use crate::error::{FrameError, Result};

/// Channels addressable by the 3-byte relay bit vector.
pub const MAX_CHANNELS: usize = 24;

/// Width of the relay bit vector on the wire.
pub const BIT_VECTOR_LEN: usize = 3;

/// A 1-based relay channel number, validated against a module's relay count.
///
/// The only way to obtain one is through [`RelayIndex::new`], so every value
/// in circulation is in `1..=relay_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelayIndex(u8);

impl RelayIndex {
    /// Validate `index` against `relay_count` (capped at [`MAX_CHANNELS`]).
    pub fn new(index: impl Into<i64>, relay_count: usize) -> Result<Self> {
        let index = index.into();
        let limit = relay_count.min(MAX_CHANNELS) as i64;
        if index < 1 || index > limit {
            return Err(FrameError::RelayOutOfRange { index, relay_count });
        }
        Ok(Self(index as u8))
    }

    /// The 1-based channel number.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Byte and bit offset of this channel within the bit vector.
    ///
    /// This is the single place where the 1-based channel number is shifted
    /// onto the 0-based wire layout.
    pub fn bit_position(self) -> (usize, u8) {
        let zero_based = usize::from(self.0 - 1);
        (zero_based / 8, (zero_based % 8) as u8)
    }

    fn all(relay_count: usize) -> impl Iterator<Item = RelayIndex> {
        (1..=relay_count.min(MAX_CHANNELS) as u8).map(RelayIndex)
    }
}

impl fmt::Display for RelayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Relay on/off states keyed by channel.
pub type ChannelMap = BTreeMap<RelayIndex, bool>;

/// The 24-bit packed relay state as it travels on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelBitVector([u8; BIT_VECTOR_LEN]);

impl ChannelBitVector {
    /// Wrap raw wire bytes.
    pub fn from_bytes(bytes: [u8; BIT_VECTOR_LEN]) -> Self {
        Self(bytes)
    }

    /// Decode from a response buffer, which must hold at least three bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; BIT_VECTOR_LEN] = bytes
            .get(..BIT_VECTOR_LEN)
            .and_then(|head| head.try_into().ok())
            .ok_or(FrameError::ShortResponse {
                command: "get_relay_state",
                expected: BIT_VECTOR_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(raw))
    }

    /// The three wire bytes.
    pub fn as_bytes(&self) -> &[u8; BIT_VECTOR_LEN] {
        &self.0
    }

    /// Whether the bit for `index` is set.
    pub fn is_set(&self, index: RelayIndex) -> bool {
        let (byte, bit) = index.bit_position();
        self.0[byte] & (1 << bit) != 0
    }

    /// Set or clear the bit for `index`.
    pub fn set(&mut self, index: RelayIndex, on: bool) {
        let (byte, bit) = index.bit_position();
        if on {
            self.0[byte] |= 1 << bit;
        } else {
            self.0[byte] &= !(1 << bit);
        }
    }
}

/// Pack channel states into the wire bit vector.
///
/// Channels above `relay_count` are left clear even if present in `states`;
/// channels missing from `states` are packed as off.
pub fn pack_channels(states: &ChannelMap, relay_count: usize) -> ChannelBitVector {
    let mut bits = ChannelBitVector::default();
    for (&index, &on) in states {
        if usize::from(index.get()) <= relay_count {
            bits.set(index, on);
        }
    }
    bits
}

/// Unpack the wire bit vector into exactly `relay_count` channel states.
///
/// Bits for channels above `relay_count` are discarded.
pub fn unpack_channels(bits: ChannelBitVector, relay_count: usize) -> ChannelMap {
    RelayIndex::all(relay_count)
        .map(|index| (index, bits.is_set(index)))
        .collect()
}
