// Consensus-critical. Changes require a protocol version bump + tests.
//! Consensus parameters and per-network presets.
//!
//! Parameters are built once at startup (from a preset, or deserialized by the
//! host when the `serde` feature is enabled) and never mutated afterwards.

use crate::constants::*;
use crate::types::{CoreError, Hash32};
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Known Kestrel networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Network {
    /// Production network.
    #[default]
    Mainnet,
    /// Public test network; allows minimum-difficulty blocks.
    Testnet,
    /// Local regression network; difficulty never retargets.
    Regtest,
}

impl Network {
    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "main" | "mainnet" => Ok(Network::Mainnet),
            "test" | "testnet" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            _ => Err(CoreError::UnknownNetwork(s.to_string())),
        }
    }
}

/// Parameters that drive difficulty retargeting and proof-of-work checks.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConsensusParams {
    /// Easiest permitted target (big-endian).
    pub pow_limit: Hash32,
    /// Expected seconds between blocks.
    pub pow_target_spacing: i64,
    /// Expected seconds per legacy adjustment interval.
    pub pow_target_timespan: i64,
    /// Test-network relaxation: a late block may be mined at `pow_limit`.
    pub allow_min_difficulty_blocks: bool,
    /// Freeze difficulty at its current value.
    pub no_retargeting: bool,
    /// First height whose target is computed by the per-block algorithm.
    pub per_block_difficulty_activation_height: u64,
    /// First height of `last` for which the legacy clamp is 1.5x up / 6x down.
    pub difficulty_change_activation_height: u64,
}

impl ConsensusParams {
    /// Preset parameters for `network`.
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => Self {
                pow_limit: Hash32(MAINNET_POW_LIMIT),
                pow_target_spacing: TARGET_SPACING_SECS,
                pow_target_timespan: TARGET_TIMESPAN_SECS,
                allow_min_difficulty_blocks: false,
                no_retargeting: false,
                per_block_difficulty_activation_height: MAINNET_PER_BLOCK_HEIGHT,
                difficulty_change_activation_height: MAINNET_DIFFICULTY_CHANGE_HEIGHT,
            },
            Network::Testnet => Self {
                pow_limit: Hash32(MAINNET_POW_LIMIT),
                pow_target_spacing: TARGET_SPACING_SECS,
                pow_target_timespan: TARGET_TIMESPAN_SECS,
                allow_min_difficulty_blocks: true,
                no_retargeting: false,
                per_block_difficulty_activation_height: TESTNET_PER_BLOCK_HEIGHT,
                difficulty_change_activation_height: TESTNET_DIFFICULTY_CHANGE_HEIGHT,
            },
            Network::Regtest => Self {
                pow_limit: Hash32(REGTEST_POW_LIMIT),
                pow_target_spacing: TARGET_SPACING_SECS,
                pow_target_timespan: TARGET_TIMESPAN_SECS,
                allow_min_difficulty_blocks: true,
                no_retargeting: true,
                per_block_difficulty_activation_height: REGTEST_PER_BLOCK_HEIGHT,
                difficulty_change_activation_height: REGTEST_DIFFICULTY_CHANGE_HEIGHT,
            },
        }
    }

    /// Number of blocks between legacy retargets.
    ///
    /// Never zero; parameters that would make it zero fail [`Self::validate`].
    pub fn difficulty_adjustment_interval(&self) -> u64 {
        if self.pow_target_spacing <= 0 {
            return 1;
        }
        let interval = self.pow_target_timespan / self.pow_target_spacing;
        u64::try_from(interval).unwrap_or(0).max(1)
    }

    /// Check internal consistency. Presets always pass.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.pow_target_spacing <= 0 {
            return Err(CoreError::InvalidParams("pow_target_spacing must be positive"));
        }
        if self.pow_target_timespan <= 0 {
            return Err(CoreError::InvalidParams("pow_target_timespan must be positive"));
        }
        if self.pow_target_timespan < self.pow_target_spacing {
            return Err(CoreError::InvalidParams(
                "pow_target_timespan shorter than one block",
            ));
        }
        if self.pow_limit == Hash32::zero() {
            return Err(CoreError::InvalidParams("pow_limit must be non-zero"));
        }
        Ok(())
    }
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self::for_network(Network::default())
    }
}
