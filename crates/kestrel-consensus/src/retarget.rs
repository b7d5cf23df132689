// Consensus-critical. Changes require a protocol version bump + tests.
//! Difficulty retargeting.
//!
//! Two rule eras, selected by the height of the block being built:
//!
//! - **Legacy**: the target only changes every `difficulty_adjustment_interval`
//!   blocks, scaled by how long the last interval took. The clamp is 4x/4x
//!   until `difficulty_change_activation_height`, then 1.5x harder / 6x easier.
//!   Networks with `allow_min_difficulty_blocks` accept a `pow_limit` block
//!   when the candidate arrives more than two spacings late.
//! - **Per-block**: from `per_block_difficulty_activation_height` the target is
//!   rescaled after every block from the last block's solve time, clamped to
//!   `[0.9, 1.2]` of the spacing.
//!
//! The rescale keeps the fixed-width 256-bit semantics of the legacy node
//! software: the intermediate product is reduced modulo 2^256, and the
//! one-bit pre-shift is the only overflow protection.

use crate::chain::HeaderChain;
use crate::difficulty::{decode_compact, encode_compact, pow_limit_bits, pow_limit_target, truncate_to_256};
use crate::error::ConsensusError;
use kestrel_core::{BlockHeaderRecord, ConsensusParams};
use num_bigint::BigUint;
use tracing::{debug, trace, warn};

/// Which retarget rules govern a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetargetEra {
    /// Fixed-interval adjustment.
    Legacy,
    /// Adjustment after every block.
    PerBlock,
}

impl RetargetEra {
    /// Era for the block at `next_height`.
    pub fn for_next_height(next_height: u64, params: &ConsensusParams) -> Self {
        if next_height >= params.per_block_difficulty_activation_height {
            RetargetEra::PerBlock
        } else {
            RetargetEra::Legacy
        }
    }
}

/// Compact target required of the block built on top of `last`.
///
/// `last` must be the record `chain` holds at `last.height`; a view without it
/// is `MissingAncestor`, a view holding a different record is `LastMismatch`.
/// `candidate_time` is the new block's timestamp in Unix seconds.
pub fn get_next_work_required<C: HeaderChain + ?Sized>(
    chain: &C,
    last: &BlockHeaderRecord,
    candidate_time: u64,
    params: &ConsensusParams,
) -> Result<u32, ConsensusError> {
    match chain.header_at(last.height) {
        Some(held) if held == *last => {}
        Some(_) => return Err(ConsensusError::LastMismatch { height: last.height }),
        None => return Err(ConsensusError::MissingAncestor { height: last.height }),
    }
    match RetargetEra::for_next_height(last.height.saturating_add(1), params) {
        RetargetEra::PerBlock => next_work_per_block(chain, last, candidate_time, params),
        RetargetEra::Legacy => next_work_legacy(chain, last, candidate_time, params),
    }
}

/// Legacy fixed-interval rule.
pub fn next_work_legacy<C: HeaderChain + ?Sized>(
    chain: &C,
    last: &BlockHeaderRecord,
    candidate_time: u64,
    params: &ConsensusParams,
) -> Result<u32, ConsensusError> {
    let interval = params.difficulty_adjustment_interval();
    let next_height = last.height.saturating_add(1);

    if next_height % interval != 0 {
        if params.allow_min_difficulty_blocks {
            let limit_bits = pow_limit_bits(params);
            if is_late(candidate_time, last, params) {
                debug!(next_height, bits = format_args!("{limit_bits:08x}"), "late block, minimum difficulty");
                return Ok(limit_bits);
            }
            return last_regular_bits(chain, last, interval, limit_bits);
        }
        return Ok(last.bits);
    }

    // Genesis has no predecessor, so the first retarget reaches back one block less.
    let blocks_to_go_back = if next_height == interval {
        interval - 1
    } else {
        interval
    };
    let first = chain.ancestor(last, blocks_to_go_back)?;

    Ok(calculate_next_work_required(last, first.time, params))
}

/// Bits of the newest record that was not a minimum-difficulty exception.
///
/// Walks back from `last` across `limit_bits` blocks, stopping at a retarget
/// boundary or at genesis.
fn last_regular_bits<C: HeaderChain + ?Sized>(
    chain: &C,
    last: &BlockHeaderRecord,
    interval: u64,
    limit_bits: u32,
) -> Result<u32, ConsensusError> {
    let mut cursor = *last;
    while cursor.height % interval != 0 && cursor.bits == limit_bits {
        match chain.predecessor(&cursor)? {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    trace!(from = last.height, to = cursor.height, "skipped minimum-difficulty blocks");
    Ok(cursor.bits)
}

/// Rescale `last.bits` by the time the last interval took.
///
/// Returns `last.bits` untouched when the network disables retargeting.
pub fn calculate_next_work_required(
    last: &BlockHeaderRecord,
    first_block_time: i64,
    params: &ConsensusParams,
) -> u32 {
    if params.no_retargeting {
        return last.bits;
    }

    let measured = last.time.saturating_sub(first_block_time);
    let (min, max) = legacy_timespan_bounds(last.height, params);
    let mut actual = measured;
    if actual < min {
        actual = min;
    }
    if actual > max {
        actual = max;
    }

    let bits = rescale(
        last.bits,
        actual,
        params.pow_target_timespan,
        &pow_limit_target(params),
    );
    debug!(
        height = last.height.saturating_add(1),
        measured,
        actual,
        old = format_args!("{:08x}", last.bits),
        new = format_args!("{bits:08x}"),
        "legacy retarget"
    );
    bits
}

/// Per-block rule.
pub fn next_work_per_block<C: HeaderChain + ?Sized>(
    chain: &C,
    last: &BlockHeaderRecord,
    candidate_time: u64,
    params: &ConsensusParams,
) -> Result<u32, ConsensusError> {
    // Needs one full block interval under the new rule to measure.
    if last.is_genesis()
        || last.height.saturating_add(1) == params.per_block_difficulty_activation_height
    {
        return Ok(last.bits);
    }

    if params.allow_min_difficulty_blocks && is_late(candidate_time, last, params) {
        return Ok(pow_limit_bits(params));
    }

    let prev = chain
        .predecessor(last)?
        .ok_or(ConsensusError::MissingAncestor {
            height: last.height.saturating_sub(1),
        })?;

    let spacing = params.pow_target_spacing;
    let measured = last.time.saturating_sub(prev.time);
    let mut actual = measured;
    if actual < 0 {
        warn!(height = last.height, measured, "negative block interval, using target spacing");
        actual = spacing;
    }

    let (min, max) = per_block_timespan_bounds(params);
    if actual < min {
        actual = min;
    }
    if actual > max {
        actual = max;
    }

    let bits = rescale(last.bits, actual, spacing, &pow_limit_target(params));
    debug!(
        height = last.height.saturating_add(1),
        measured,
        actual,
        old = format_args!("{:08x}", last.bits),
        new = format_args!("{bits:08x}"),
        "per-block retarget"
    );
    Ok(bits)
}

/// Clamp window for the legacy elapsed time, by era of `last_height`.
pub fn legacy_timespan_bounds(last_height: u64, params: &ConsensusParams) -> (i64, i64) {
    let timespan = params.pow_target_timespan;
    if last_height >= params.difficulty_change_activation_height {
        (timespan.saturating_mul(2) / 3, timespan.saturating_mul(6))
    } else {
        (timespan / 4, timespan.saturating_mul(4))
    }
}

/// Clamp window for the per-block solve time: 90% to 120% of the spacing.
pub fn per_block_timespan_bounds(params: &ConsensusParams) -> (i64, i64) {
    let spacing = params.pow_target_spacing;
    (
        spacing.saturating_mul(9) / 10,
        spacing.saturating_mul(12) / 10,
    )
}

fn is_late(candidate_time: u64, last: &BlockHeaderRecord, params: &ConsensusParams) -> bool {
    let candidate = i64::try_from(candidate_time).unwrap_or(i64::MAX);
    candidate > last.time.saturating_add(params.pow_target_spacing.saturating_mul(2))
}

/// `bits * actual / expected`, clamped to `pow_limit`.
fn rescale(bits: u32, actual: i64, expected: i64, pow_limit: &BigUint) -> u32 {
    let mut target = decode_compact(bits).target;

    let shift = target.bits() > pow_limit.bits().saturating_sub(1);
    if shift {
        target >>= 1u32;
    }
    target = truncate_to_256(target * u64::try_from(actual).unwrap_or(0));
    target /= u64::try_from(expected).unwrap_or(1).max(1);
    if shift {
        target = truncate_to_256(target << 1u32);
    }

    if target > *pow_limit {
        target = pow_limit.clone();
    }
    encode_compact(&target)
}
