#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Kestrel proof-of-work consensus rules.
//!
//! This crate is responsible for:
//! - compact difficulty target encoding/decoding (Bitcoin-style `bits`)
//! - difficulty retargeting across the legacy and per-block eras
//! - proof-of-work validation against the target
//!
//! It does not store headers, choose between forks, or hash
//! blocks. Callers hand in a read-only [`HeaderChain`] and the block hash.

pub mod chain;
pub mod difficulty;
pub mod error;
pub mod pow;
pub mod retarget;
pub mod work;

pub use chain::*;
pub use difficulty::*;
pub use error::*;
pub use pow::*;
pub use retarget::*;
pub use work::*;
