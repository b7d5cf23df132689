#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Kestrel core: canonical header records, consensus parameters and network presets.
//!
//! Nothing in this crate performs difficulty arithmetic; that lives in
//! `kestrel-consensus`. This crate only defines the data every node must agree on.

pub mod constants;
pub mod params;
pub mod types;

pub use constants::*;
pub use params::*;
pub use types::*;
