// Consensus-critical. Changes require a protocol version bump + tests.
//! Proof-of-work validation.
//!
//! The PoW condition is:
//!     hash_as_u256 <= target(bits) <= pow_limit
//!
//! where `target(bits)` must be a valid (non-negative, non-overflowing,
//! non-zero) compact encoding. Block hashes arrive from untrusted peers, so
//! every failure here is a value, never a panic.

use crate::difficulty::{decode_compact, hash_meets_target, pow_limit_target};
use crate::error::ConsensusError;
use kestrel_core::{ConsensusParams, Hash32};
use num_traits::Zero;

/// Validate `hash` against compact `bits`, reporting why a check failed.
pub fn validate_pow(
    hash: &Hash32,
    bits: u32,
    params: &ConsensusParams,
) -> Result<(), ConsensusError> {
    let decoded = decode_compact(bits);
    if decoded.negative || decoded.overflow {
        return Err(ConsensusError::InvalidBits);
    }
    if decoded.target.is_zero() {
        return Err(ConsensusError::InvalidTarget);
    }
    if decoded.target > pow_limit_target(params) {
        return Err(ConsensusError::TargetAboveLimit);
    }
    if !hash_meets_target(hash.as_bytes(), &decoded.target) {
        return Err(ConsensusError::InsufficientPoW);
    }
    Ok(())
}

/// Whether `hash` satisfies the target encoded in `bits`.
pub fn check_proof_of_work(hash: &Hash32, bits: u32, params: &ConsensusParams) -> bool {
    validate_pow(hash, bits, params).is_ok()
}
