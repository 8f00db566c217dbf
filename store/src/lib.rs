//! Storage for gift card records.
//!
//! Every backend implements [`GiftCardStore`]. The rest of the workspace depends only on
//! the trait. Balance writes go through [`GiftCardStore::compare_and_swap`] so that two
//! redemptions of the same card can never both commit against the same version.

pub mod card;
pub mod error;
pub mod memory;
pub mod redemption;

pub use card::{GiftCardStore, StoredCard};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use redemption::RedemptionRecord;
