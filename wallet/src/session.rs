//! Explicit session credentials.
//!
//! A [`Session`] is built once from a connected wallet plus the roles the caller has
//! been granted, and is passed to every service call.

use crate::connector::{ConnectionState, WalletConnector};
use crate::error::WalletError;
use giftcard_types::{AccountAddress, ChainId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// What a session is allowed to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Holds and spends their own cards.
    Customer,
    /// Redeems cards presented at the point of sale.
    Merchant,
    /// Issues cards and manages any card.
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Customer => "customer",
            Self::Merchant => "merchant",
            Self::Admin => "admin",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub account: AccountAddress,
    pub chain_id: ChainId,
    pub roles: BTreeSet<Role>,
}

impl Session {
    pub fn new(account: AccountAddress, chain_id: ChainId, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            account,
            chain_id,
            roles: roles.into_iter().collect(),
        }
    }

    /// Build a session for the wallet's current account.
    pub fn from_connector(
        connector: &dyn WalletConnector,
        roles: impl IntoIterator<Item = Role>,
    ) -> Result<Self, WalletError> {
        match connector.state() {
            ConnectionState::Connected { account, chain_id } => Ok(Self::new(account, chain_id, roles)),
            ConnectionState::Disconnected => Err(WalletError::NotConnected),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.has_role(*r))
    }

    /// Whether the wallet is still connected as this session's account and chain.
    pub fn matches(&self, state: &ConnectionState) -> bool {
        match state {
            ConnectionState::Connected { account, chain_id } => {
                *account == self.account && *chain_id == self.chain_id
            }
            ConnectionState::Disconnected => false,
        }
    }
}
