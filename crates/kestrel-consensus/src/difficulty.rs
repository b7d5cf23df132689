// Consensus-critical. Changes require a protocol version bump + tests.
//! Compact target encoding.
//!
//! Block headers carry their target in a Bitcoin-style "compact" form:
//! `bits = (size << 24) | word`, where `size` is the byte length of the target
//! and `word` holds its three most significant bytes. Bit `0x0080_0000` is a
//! sign bit and the remaining 23 bits are the mantissa magnitude:
//!
//! - `size <= 3`: target = `word >> 8*(3 - size)`
//! - `size > 3`:  target = `word << 8*(size - 3)` (truncated to 256 bits)
//!
//! Decoding reports negative and overflowing encodings separately instead of
//! failing, because the retarget rules decode the previous block's bits the
//! same way the legacy fixed-width arithmetic did. Use [`bits_to_target`] when
//! an unusable encoding must be rejected.

use crate::error::ConsensusError;
use kestrel_core::ConsensusParams;
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Sign bit of the compact mantissa.
pub const COMPACT_SIGN_BIT: u32 = 0x0080_0000;

/// Mantissa magnitude mask.
pub const COMPACT_MANTISSA_MASK: u32 = 0x007f_ffff;

/// Width of a target in bits.
pub const TARGET_BITS: u64 = 256;

/// Result of decoding a compact target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTarget {
    /// Decoded value, reduced modulo 2^256.
    pub target: BigUint,
    /// Sign bit set with a non-zero mantissa.
    pub negative: bool,
    /// The encoding does not fit in 256 bits.
    pub overflow: bool,
}

impl DecodedTarget {
    /// Usable as a proof-of-work target: not negative, no overflow, non-zero.
    pub fn is_valid(&self) -> bool {
        !self.negative && !self.overflow && !self.target.is_zero()
    }
}

/// Reduce `value` modulo 2^256, as fixed-width 256-bit arithmetic would.
pub(crate) fn truncate_to_256(value: BigUint) -> BigUint {
    if value.bits() > TARGET_BITS {
        let mask = (BigUint::one() << TARGET_BITS) - 1u32;
        value & mask
    } else {
        value
    }
}

fn low_u64(value: &BigUint) -> u64 {
    value.iter_u64_digits().next().unwrap_or(0)
}

/// Decode compact `bits`, flagging negative and overflowing encodings.
pub fn decode_compact(bits: u32) -> DecodedTarget {
    let size = bits >> 24;
    let mut word = bits & COMPACT_MANTISSA_MASK;

    let target = if size <= 3 {
        word >>= 8 * (3 - size);
        BigUint::from(word)
    } else {
        truncate_to_256(BigUint::from(word) << (8 * (size - 3)))
    };

    // Flags look at the mantissa after any right shift, so tiny encodings
    // whose mantissa shifts away are neither negative nor overflowing.
    let negative = word != 0 && (bits & COMPACT_SIGN_BIT) != 0;
    let overflow = word != 0
        && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));

    DecodedTarget {
        target,
        negative,
        overflow,
    }
}

/// Encode a target into its minimal compact form.
///
/// Values wider than 256 bits are reduced modulo 2^256 first. Zero encodes
/// to `0`. The sign bit is never set; a mantissa whose top bit would read as
/// the sign is shifted down a byte and the size bumped instead.
pub fn encode_compact(target: &BigUint) -> u32 {
    let target = truncate_to_256(target.clone());
    let mut size = ((target.bits() + 7) / 8) as u32;

    let mut compact = if size <= 3 {
        (low_u64(&target) << (8 * (3 - size))) as u32
    } else {
        low_u64(&(&target >> (8 * (size - 3)))) as u32
    };

    if compact & COMPACT_SIGN_BIT != 0 {
        compact >>= 8;
        size += 1;
    }

    compact | (size << 24)
}

/// Decode compact `bits` to a full target.
///
/// Rejects encodings that are negative, overflow, or represent zero.
pub fn bits_to_target(bits: u32) -> Result<BigUint, ConsensusError> {
    let decoded = decode_compact(bits);
    if decoded.negative || decoded.overflow {
        return Err(ConsensusError::InvalidBits);
    }
    if decoded.target.is_zero() {
        return Err(ConsensusError::InvalidTarget);
    }
    Ok(decoded.target)
}

/// Encode a target into compact `bits`, rejecting values no header can carry.
pub fn target_to_bits(target: &BigUint) -> Result<u32, ConsensusError> {
    if target.is_zero() {
        return Err(ConsensusError::InvalidTarget);
    }
    if target.bits() > TARGET_BITS {
        return Err(ConsensusError::InvalidBits);
    }
    Ok(encode_compact(target))
}

/// Compare a 32-byte hash value (big-endian) with a target.
/// Returns `true` if `hash <= target`.
pub fn hash_meets_target(hash_be: &[u8; 32], target: &BigUint) -> bool {
    let h = BigUint::from_bytes_be(hash_be);
    h <= *target
}

/// The network's easiest target as an integer.
pub fn pow_limit_target(params: &ConsensusParams) -> BigUint {
    BigUint::from_bytes_be(params.pow_limit.as_bytes())
}

/// The network's easiest target in compact form (the "minimum difficulty" bits).
pub fn pow_limit_bits(params: &ConsensusParams) -> u32 {
    encode_compact(&pow_limit_target(params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::Network;

    fn hex_target(s: &str) -> BigUint {
        BigUint::parse_bytes(s.as_bytes(), 16).expect("hex")
    }

    #[test]
    fn decodes_small_exponents_by_right_shift() {
        let d = decode_compact(0x0112_3456);
        assert_eq!(d.target, BigUint::from(0x12u32));
        assert!(!d.negative && !d.overflow);
        assert_eq!(encode_compact(&d.target), 0x0112_0000);

        assert_eq!(decode_compact(0x0212_3456).target, BigUint::from(0x1234u32));
        assert_eq!(decode_compact(0x0312_3456).target, BigUint::from(0x12_3456u32));
        assert_eq!(decode_compact(0x0412_3456).target, BigUint::from(0x1234_5600u32));
    }

    #[test]
    fn mantissa_shifted_away_is_zero_not_negative() {
        for bits in [0x0000_0000u32, 0x0012_3456, 0x0100_3456, 0x0180_3456, 0x0300_0000, 0x0480_0000] {
            let d = decode_compact(bits);
            assert!(d.target.is_zero(), "bits {bits:08x}");
            assert!(!d.negative, "bits {bits:08x}");
            assert!(!d.overflow, "bits {bits:08x}");
            assert!(!d.is_valid());
        }
    }

    #[test]
    fn flags_negative_mantissa() {
        let d = decode_compact(0x0492_3456);
        assert!(d.negative);
        assert!(!d.overflow);
        assert_eq!(d.target, BigUint::from(0x1234_5600u32));

        let tiny = decode_compact(0x01fe_dcba);
        assert!(tiny.negative);
        assert_eq!(tiny.target, BigUint::from(0x7eu32));

        assert!(matches!(
            bits_to_target(0x0492_3456),
            Err(ConsensusError::InvalidBits)
        ));
    }

    #[test]
    fn flags_overflow_past_256_bits() {
        for bits in [0xff12_3456u32, 0x2101_0000, 0x2200_0100, 0x2300_0001] {
            assert!(decode_compact(bits).overflow, "bits {bits:08x}");
            assert!(matches!(bits_to_target(bits), Err(ConsensusError::InvalidBits)));
        }
        // Largest exponents that still fit.
        assert!(!decode_compact(0x2100_ffff).overflow);
        assert!(!decode_compact(0x2200_00ff).overflow);
        assert_eq!(
            decode_compact(0x2200_00ff).target,
            BigUint::from(0xffu32) << 248u32
        );
    }

    #[test]
    fn rejects_zero_targets() {
        assert!(matches!(bits_to_target(0), Err(ConsensusError::InvalidTarget)));
        assert!(matches!(
            target_to_bits(&BigUint::zero()),
            Err(ConsensusError::InvalidTarget)
        ));
        assert_eq!(encode_compact(&BigUint::zero()), 0);
    }

    #[test]
    fn roundtrip_bits_target() {
        for bits in [0x1d00_ffffu32, 0x1e0f_ffff, 0x207f_ffff, 0x1b04_04cb, 0x0500_9234, 0x2012_3456] {
            let target = bits_to_target(bits).expect("decode");
            assert_eq!(target_to_bits(&target).expect("encode"), bits);
        }
    }

    #[test]
    fn encode_avoids_sign_bit() {
        assert_eq!(encode_compact(&BigUint::from(0x80u32)), 0x0200_8000);
        assert_eq!(encode_compact(&BigUint::from(0x9234_0000u32)), 0x0500_9234);
    }

    #[test]
    fn encode_truncates_precision() {
        let target = hex_target("123456789abcdef0");
        let bits = encode_compact(&target);
        assert_eq!(bits, 0x0812_3456);
        assert_eq!(decode_compact(bits).target, hex_target("1234560000000000"));
    }

    #[test]
    fn target_to_bits_rejects_wide_values() {
        let too_wide = BigUint::one() << 256u32;
        assert!(matches!(target_to_bits(&too_wide), Err(ConsensusError::InvalidBits)));
    }

    #[test]
    fn network_pow_limits() {
        let main = ConsensusParams::for_network(Network::Mainnet);
        assert_eq!(pow_limit_bits(&main), 0x1e0f_ffff);
        assert_eq!(pow_limit_target(&main).bits(), 236);

        let reg = ConsensusParams::for_network(Network::Regtest);
        assert_eq!(pow_limit_bits(&reg), 0x207f_ffff);
    }

    #[test]
    fn hash_comparison_is_inclusive() {
        let target = bits_to_target(0x1d00_ffff).expect("target");
        let mut exact = [0u8; 32];
        exact[4] = 0xff;
        exact[5] = 0xff;
        assert!(hash_meets_target(&exact, &target));

        exact[31] = 1;
        assert!(!hash_meets_target(&exact, &target));
        assert!(hash_meets_target(&[0u8; 32], &target));
    }
}
