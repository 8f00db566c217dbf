//! Fundamental types for the gift card workspace.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! fixed-point money, timestamps and clocks, token/chain/account identifiers, and the
//! card status enum.

pub mod address;
pub mod amount;
pub mod error;
pub mod ids;
pub mod state;
pub mod time;

pub use address::AccountAddress;
pub use amount::{Money, CURRENCY_DECIMALS, MINOR_UNITS_PER_MAJOR};
pub use error::{AddressParseError, AmountParseError};
pub use ids::{ChainId, TokenId};
pub use state::CardStatus;
pub use time::{Clock, SystemClock, Timestamp};
