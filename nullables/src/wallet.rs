//! Scripted wallet connector for testing.

use async_trait::async_trait;
use giftcard_types::{AccountAddress, ChainId};
use giftcard_wallet::connector::{transition_events, EVENT_CHANNEL_CAPACITY};
use giftcard_wallet::{ConnectionState, WalletConnector, WalletError, WalletEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;

/// A wallet whose account and chain are set by the test.
pub struct NullWallet {
    account: Mutex<AccountAddress>,
    chain_id: Mutex<ChainId>,
    state: Mutex<ConnectionState>,
    reject_next_connect: AtomicBool,
    events: broadcast::Sender<WalletEvent>,
}

impl NullWallet {
    /// A wallet that will connect as `account` on `chain_id`, initially disconnected.
    pub fn new(account: AccountAddress, chain_id: ChainId) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            account: Mutex::new(account),
            chain_id: Mutex::new(chain_id),
            state: Mutex::new(ConnectionState::Disconnected),
            reject_next_connect: AtomicBool::new(false),
            events,
        }
    }

    /// A wallet that is already connected.
    pub fn connected(account: AccountAddress, chain_id: ChainId) -> Self {
        let wallet = Self::new(account.clone(), chain_id);
        *wallet.state.lock().unwrap() = ConnectionState::Connected { account, chain_id };
        wallet
    }

    /// Simulate the user switching accounts in their wallet.
    pub fn switch_account(&self, account: AccountAddress) {
        *self.account.lock().unwrap() = account;
        self.sync_if_connected();
    }

    /// Simulate the user switching networks.
    pub fn switch_chain(&self, chain_id: ChainId) {
        *self.chain_id.lock().unwrap() = chain_id;
        self.sync_if_connected();
    }

    /// Make the next `connect` fail as if the user dismissed the prompt.
    pub fn reject_next_connect(&self) {
        self.reject_next_connect.store(true, Ordering::SeqCst);
    }

    fn current(&self) -> ConnectionState {
        ConnectionState::Connected {
            account: self.account.lock().unwrap().clone(),
            chain_id: *self.chain_id.lock().unwrap(),
        }
    }

    fn sync_if_connected(&self) {
        if self.state().is_connected() {
            self.set_state(self.current());
        }
    }

    fn set_state(&self, next: ConnectionState) {
        let mut state = self.state.lock().unwrap();
        for event in transition_events(&state, &next) {
            let _ = self.events.send(event);
        }
        *state = next;
    }
}

#[async_trait]
impl WalletConnector for NullWallet {
    async fn connect(&self) -> Result<ConnectionState, WalletError> {
        if self.reject_next_connect.swap(false, Ordering::SeqCst) {
            return Err(WalletError::Rejected);
        }
        let next = self.current();
        self.set_state(next.clone());
        Ok(next)
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.set_state(ConnectionState::Disconnected);
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state.lock().unwrap().clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    fn name(&self) -> &str {
        "null-wallet"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(last: u8) -> AccountAddress {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        AccountAddress::from_bytes(bytes)
    }

    #[tokio::test]
    async fn connect_switch_disconnect_emit_events() {
        let wallet = NullWallet::new(account(1), ChainId::LOCAL);
        let mut events = wallet.subscribe();

        wallet.connect().await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            WalletEvent::Connected {
                account: account(1),
                chain_id: ChainId::LOCAL,
            }
        );

        wallet.switch_account(account(2));
        assert_eq!(events.recv().await.unwrap(), WalletEvent::AccountChanged(account(2)));

        wallet.switch_chain(ChainId::MAINNET);
        assert_eq!(events.recv().await.unwrap(), WalletEvent::ChainChanged(ChainId::MAINNET));

        wallet.disconnect().await.unwrap();
        assert_eq!(events.recv().await.unwrap(), WalletEvent::Disconnected);
        assert_eq!(wallet.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn switching_while_disconnected_is_silent() {
        let wallet = NullWallet::new(account(1), ChainId::LOCAL);
        let mut events = wallet.subscribe();
        wallet.switch_account(account(2));
        assert!(events.try_recv().is_err());

        let state = wallet.connect().await.unwrap();
        assert_eq!(state.account(), Some(&account(2)));
    }

    #[tokio::test]
    async fn rejected_connect_leaves_wallet_disconnected() {
        let wallet = NullWallet::new(account(1), ChainId::LOCAL);
        wallet.reject_next_connect();
        assert!(matches!(wallet.connect().await, Err(WalletError::Rejected)));
        assert!(!wallet.state().is_connected());
        assert!(wallet.connect().await.is_ok());
    }
}
