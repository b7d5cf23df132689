//! Consensus error types.

use kestrel_core::CoreError;
use thiserror::Error;

/// Errors returned by difficulty conversion, retargeting and PoW validation.
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// Compact target encoding is negative or overflows 256 bits.
    #[error("invalid compact target bits")]
    InvalidBits,

    /// Target decoded to zero or otherwise unusable.
    #[error("invalid difficulty target")]
    InvalidTarget,

    /// Target is easier than the network's proof-of-work limit.
    #[error("target above proof-of-work limit")]
    TargetAboveLimit,

    /// Proof-of-work hash did not meet the required target.
    #[error("insufficient proof of work")]
    InsufficientPoW,

    /// The chain view has no record at a height the lookback must reach.
    #[error("chain view is missing ancestor at height {height}")]
    MissingAncestor {
        /// Height that could not be read.
        height: u64,
    },

    /// `last` differs from the record the chain view holds at its height.
    #[error("chain view disagrees with the supplied last record at height {height}")]
    LastMismatch {
        /// Height of the supplied record.
        height: u64,
    },

    /// The index already ends at the largest representable height.
    #[error("header index already ends at height u64::MAX")]
    HeightOverflow,

    /// A header was appended out of height order.
    #[error("non-contiguous header height: expected {expected}, got {got}")]
    NonContiguousHeight {
        /// Height the index expected next.
        expected: u64,
        /// Height actually supplied.
        got: u64,
    },

    /// Error from core type handling.
    #[error(transparent)]
    Core(#[from] CoreError),
}
