//! Wallet connector backed by an Ethereum JSON-RPC provider.

use crate::connector::{
    transition_events, ConnectionState, WalletConnector, WalletEvent, EVENT_CHANNEL_CAPACITY,
};
use crate::error::{RpcError, WalletError};
use crate::rpc::{parse_quantity, JsonRpcTransport};
use async_trait::async_trait;
use giftcard_types::{AccountAddress, ChainId};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

/// EIP-1193 "user rejected request".
const USER_REJECTED: i64 = 4001;

/// JSON-RPC "method not found".
const METHOD_NOT_FOUND: i64 = -32601;

/// Connects to the first account the provider manages (a node's unlocked accounts,
/// or a signer proxy that implements `eth_requestAccounts`).
pub struct RpcWalletConnector {
    transport: Arc<JsonRpcTransport>,
    state: Mutex<ConnectionState>,
    events: broadcast::Sender<WalletEvent>,
}

impl RpcWalletConnector {
    pub fn new(transport: Arc<JsonRpcTransport>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            transport,
            state: Mutex::new(ConnectionState::Disconnected),
            events,
        }
    }

    /// The underlying transport, for sharing with a contract client.
    pub fn transport(&self) -> Arc<JsonRpcTransport> {
        Arc::clone(&self.transport)
    }

    /// Re-read account and chain from the provider while connected, emitting
    /// `AccountChanged`/`ChainChanged` (or `Disconnected` if the accounts are gone).
    pub async fn refresh(&self) -> Result<ConnectionState, WalletError> {
        if !self.state().is_connected() {
            return Ok(ConnectionState::Disconnected);
        }
        let accounts: Vec<String> = self.transport.call("eth_accounts", serde_json::json!([])).await?;
        let next = match accounts.first() {
            Some(raw) => ConnectionState::Connected {
                account: parse_account(raw)?,
                chain_id: self.chain_id().await?,
            },
            None => ConnectionState::Disconnected,
        };
        self.set_state(next.clone());
        Ok(next)
    }

    async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        match self
            .transport
            .call::<Vec<String>>("eth_requestAccounts", serde_json::json!([]))
            .await
        {
            Ok(accounts) => Ok(accounts),
            Err(RpcError::Provider { code, .. }) if code == USER_REJECTED => Err(WalletError::Rejected),
            Err(RpcError::Provider { code, .. }) if code == METHOD_NOT_FOUND => {
                tracing::debug!("provider lacks eth_requestAccounts, falling back to eth_accounts");
                Ok(self.transport.call("eth_accounts", serde_json::json!([])).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn chain_id(&self) -> Result<ChainId, WalletError> {
        let raw: String = self.transport.call("eth_chainId", serde_json::json!([])).await?;
        Ok(ChainId::new(parse_quantity(&raw)?))
    }

    fn set_state(&self, next: ConnectionState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        for event in transition_events(&state, &next) {
            tracing::info!(?event, "wallet state changed");
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
        *state = next;
    }
}

fn parse_account(raw: &str) -> Result<AccountAddress, WalletError> {
    AccountAddress::parse(raw).map_err(|e| WalletError::InvalidAccount(e.to_string()))
}

#[async_trait]
impl WalletConnector for RpcWalletConnector {
    async fn connect(&self) -> Result<ConnectionState, WalletError> {
        let accounts = self.request_accounts().await?;
        let raw = accounts.first().ok_or(WalletError::NoAccounts)?;
        let next = ConnectionState::Connected {
            account: parse_account(raw)?,
            chain_id: self.chain_id().await?,
        };
        self.set_state(next.clone());
        Ok(next)
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.set_state(ConnectionState::Disconnected);
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    fn name(&self) -> &str {
        "json-rpc"
    }
}
