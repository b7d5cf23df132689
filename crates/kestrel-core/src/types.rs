// Consensus-critical. Changes require a protocol version bump + tests.
//! Canonical value types shared by the consensus rules.
//!
//! `Hash32` carries 256-bit quantities (block hashes, targets) as big-endian
//! bytes. `BlockHeaderRecord` is the slice of a block header that difficulty
//! retargeting reads: height, timestamp and compact target.

use crate::constants::HASH32_LEN;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors related to parsing, validation, or construction of core protocol types.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Hex string had an unexpected byte length.
    #[error("invalid hex length: expected {expected} bytes, got {got} bytes")]
    InvalidHexLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes provided.
        got: usize,
    },

    /// Hex decoding failed.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Consensus parameters are internally inconsistent.
    #[error("invalid consensus parameters: {0}")]
    InvalidParams(&'static str),

    /// Network name did not match a known preset.
    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}

/// Fixed-size 32-byte value, interpreted as a big-endian 256-bit integer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Hash32(pub [u8; HASH32_LEN]);

impl Hash32 {
    /// Returns an all-zero hash.
    pub const fn zero() -> Self {
        Self([0u8; HASH32_LEN])
    }

    /// Returns the underlying big-endian byte array.
    pub const fn as_bytes(&self) -> &[u8; HASH32_LEN] {
        &self.0
    }

    /// Build from little-endian bytes (the in-memory order of Bitcoin-style `uint256`).
    pub fn from_le_bytes(mut bytes: [u8; HASH32_LEN]) -> Self {
        bytes.reverse();
        Self(bytes)
    }

    /// Returns the value as little-endian bytes.
    pub fn to_le_bytes(&self) -> [u8; HASH32_LEN] {
        let mut out = self.0;
        out.reverse();
        out
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", hex::encode(self.0))
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<[u8; HASH32_LEN]> for Hash32 {
    fn from(value: [u8; HASH32_LEN]) -> Self {
        Self(value)
    }
}

impl From<Hash32> for [u8; HASH32_LEN] {
    fn from(value: Hash32) -> Self {
        value.0
    }
}

impl FromStr for Hash32 {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != HASH32_LEN {
            return Err(CoreError::InvalidHexLength {
                expected: HASH32_LEN,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; HASH32_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl TryFrom<String> for Hash32 {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Hash32> for String {
    fn from(value: Hash32) -> Self {
        value.to_string()
    }
}

/// The fields of a historical block header that difficulty retargeting reads.
///
/// The predecessor of a record is the record one height below it in the same
/// chain view; only genesis (height 0) has none.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlockHeaderRecord {
    /// Height above genesis.
    pub height: u64,
    /// Block timestamp, Unix seconds. Not guaranteed monotonic.
    pub time: i64,
    /// Compact-encoded target the block was mined against.
    pub bits: u32,
}

impl BlockHeaderRecord {
    /// Construct a record.
    pub const fn new(height: u64, time: i64, bits: u32) -> Self {
        Self { height, time, bits }
    }

    /// Whether this is the genesis record.
    pub const fn is_genesis(&self) -> bool {
        self.height == 0
    }
}
