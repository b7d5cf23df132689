// Consensus-critical. Changes require a protocol version bump + tests.
//! Work represented by a compact target.

use crate::difficulty::bits_to_target;
use crate::error::ConsensusError;
use num_bigint::BigUint;
use num_traits::One;

/// Compute per-block work from compact `bits`.
///
/// Work is defined as `work = floor((2^256) / (target + 1))`, the expected
/// number of hashes needed to meet the target.
pub fn work_from_bits(bits: u32) -> Result<BigUint, ConsensusError> {
    let target = bits_to_target(bits)?;
    let two_256 = BigUint::one() << 256u32;
    Ok(&two_256 / (&target + BigUint::one()))
}
