//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator (clock, contract, wallet) is abstracted behind a trait.
//! This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod contract;
pub mod wallet;

pub use clock::NullClock;
pub use contract::{NullContract, WriteOutcome};
pub use wallet::NullWallet;
