//! The wallet connector capability.
//!
//! Wallet access is injected rather than held in a module-level singleton: code that
//! needs the connected account receives an `Arc<dyn WalletConnector>` and listens for
//! changes through [`WalletConnector::subscribe`].

use crate::error::WalletError;
use async_trait::async_trait;
use giftcard_types::{AccountAddress, ChainId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Capacity of each connector's event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Whether a wallet is connected, and to what.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connected {
        account: AccountAddress,
        chain_id: ChainId,
    },
}

impl ConnectionState {
    pub fn account(&self) -> Option<&AccountAddress> {
        match self {
            Self::Connected { account, .. } => Some(account),
            Self::Disconnected => None,
        }
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        match self {
            Self::Connected { chain_id, .. } => Some(*chain_id),
            Self::Disconnected => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

/// A change in wallet state, broadcast to subscribers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletEvent {
    Connected {
        account: AccountAddress,
        chain_id: ChainId,
    },
    Disconnected,
    AccountChanged(AccountAddress),
    ChainChanged(ChainId),
}

/// Events implied by moving from `old` to `new`.
pub fn transition_events(old: &ConnectionState, new: &ConnectionState) -> Vec<WalletEvent> {
    match (old, new) {
        (ConnectionState::Disconnected, ConnectionState::Disconnected) => Vec::new(),
        (ConnectionState::Connected { .. }, ConnectionState::Disconnected) => {
            vec![WalletEvent::Disconnected]
        }
        (ConnectionState::Disconnected, ConnectionState::Connected { account, chain_id }) => {
            vec![WalletEvent::Connected {
                account: account.clone(),
                chain_id: *chain_id,
            }]
        }
        (
            ConnectionState::Connected {
                account: old_account,
                chain_id: old_chain,
            },
            ConnectionState::Connected { account, chain_id },
        ) => {
            let mut events = Vec::new();
            if old_account != account {
                events.push(WalletEvent::AccountChanged(account.clone()));
            }
            if old_chain != chain_id {
                events.push(WalletEvent::ChainChanged(*chain_id));
            }
            events
        }
    }
}

/// Access to a user's wallet.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Request access to the wallet and return the resulting state.
    async fn connect(&self) -> Result<ConnectionState, WalletError>;

    /// Drop the connection. Disconnecting twice is not an error.
    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Current state, without contacting the provider.
    fn state(&self) -> ConnectionState;

    /// Receive every subsequent [`WalletEvent`].
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;

    /// Human-readable name of this connector.
    fn name(&self) -> &str;
}
