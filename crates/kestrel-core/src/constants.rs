//! Protocol-wide constants for Kestrel.

/// Length in bytes of a 32-byte hash or target.
pub const HASH32_LEN: usize = 32;

/// Block time target in seconds (2.5 minutes).
pub const TARGET_SPACING_SECS: i64 = 150;

/// Legacy retarget window in seconds (3.5 days).
///
/// With 150 second blocks this yields an adjustment interval of 2016 blocks.
pub const TARGET_TIMESPAN_SECS: i64 = 302_400;

/// Easiest target on mainnet and testnet, big-endian (`bits = 0x1e0fffff`).
pub const MAINNET_POW_LIMIT: [u8; HASH32_LEN] = [
    0x00, 0x00, 0x0f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
];

/// Easiest target on regtest, big-endian (`bits = 0x207fffff`).
pub const REGTEST_POW_LIMIT: [u8; HASH32_LEN] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
];

/// Mainnet height from which the legacy clamp becomes 1.5x up / 6x down.
pub const MAINNET_DIFFICULTY_CHANGE_HEIGHT: u64 = 150_000;

/// Mainnet height from which difficulty is retargeted after every block.
pub const MAINNET_PER_BLOCK_HEIGHT: u64 = 250_000;

/// Testnet height from which the legacy clamp becomes 1.5x up / 6x down.
pub const TESTNET_DIFFICULTY_CHANGE_HEIGHT: u64 = 2_000;

/// Testnet height from which difficulty is retargeted after every block.
pub const TESTNET_PER_BLOCK_HEIGHT: u64 = 4_000;

/// Regtest height from which the legacy clamp becomes 1.5x up / 6x down.
pub const REGTEST_DIFFICULTY_CHANGE_HEIGHT: u64 = 500;

/// Regtest height from which difficulty is retargeted after every block.
pub const REGTEST_PER_BLOCK_HEIGHT: u64 = 1_500;
