//! Contract client over an Ethereum JSON-RPC provider.
//!
//! Amounts cross the ABI as `uint256` minor units. An expiration of `0` on chain
//! means the card never expires.

use crate::abi::{self, Token};
use crate::client::{ContractClient, ReceiptStatus, TransactionReceipt};
use crate::error::ContractError;
use async_trait::async_trait;
use giftcard_balance::{CardFlags, GiftCardBalance};
use giftcard_types::{AccountAddress, Money, Timestamp, TokenId};
use giftcard_wallet::{parse_quantity, JsonRpcTransport, WalletConnector, WalletError};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const GET_GIFT_CARD: &str = "getGiftCard(uint256)";
const BALANCE_OF_CARD: &str = "balanceOfCard(uint256)";
const OWNER_OF: &str = "ownerOf(uint256)";
const NEXT_TOKEN_ID: &str = "nextTokenId()";
const REDEEM: &str = "redeem(uint256,uint256)";
const RECHARGE: &str = "recharge(uint256,uint256)";
const MINT: &str = "mint(address,uint256,uint256,uint64,bool,bool)";

/// Words returned by `getGiftCard`:
/// `(totalValue, currentBalance, isRedeemable, isRechargeable, expiration)`.
const GIFT_CARD_WORDS: usize = 5;

#[derive(Clone, Debug)]
pub struct EthContractConfig {
    pub contract_address: AccountAddress,
    /// How many times to ask for a receipt before reporting the transaction as pending.
    pub receipt_poll_attempts: u32,
    pub receipt_poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: String,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

pub struct EthContractClient {
    transport: Arc<JsonRpcTransport>,
    wallet: Arc<dyn WalletConnector>,
    config: EthContractConfig,
}

impl EthContractClient {
    /// Writes are sent from whatever account `wallet` is connected as.
    pub fn new(
        transport: Arc<JsonRpcTransport>,
        wallet: Arc<dyn WalletConnector>,
        config: EthContractConfig,
    ) -> Self {
        Self {
            transport,
            wallet,
            config,
        }
    }

    async fn eth_call(&self, data: String) -> Result<String, ContractError> {
        let params = serde_json::json!([
            { "to": self.config.contract_address.as_str(), "data": data },
            "latest"
        ]);
        Ok(self.transport.call("eth_call", params).await?)
    }

    async fn send(&self, method: &str, data: String) -> Result<TransactionReceipt, ContractError> {
        let from = self
            .wallet
            .state()
            .account()
            .cloned()
            .ok_or(WalletError::NotConnected)?;
        let params = serde_json::json!([{
            "from": from.as_str(),
            "to": self.config.contract_address.as_str(),
            "data": data,
        }]);
        let tx_hash: String = self.transport.call("eth_sendTransaction", params).await?;
        tracing::debug!(method, %tx_hash, "transaction submitted");
        self.wait_for_receipt(tx_hash).await
    }

    async fn wait_for_receipt(&self, tx_hash: String) -> Result<TransactionReceipt, ContractError> {
        for attempt in 0..self.config.receipt_poll_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.config.receipt_poll_interval).await;
            }
            let raw: Option<RawReceipt> = self
                .transport
                .call("eth_getTransactionReceipt", serde_json::json!([tx_hash]))
                .await?;
            if raw.is_some() {
                return interpret_receipt(&tx_hash, raw);
            }
        }
        tracing::warn!(%tx_hash, attempts = self.config.receipt_poll_attempts, "no receipt yet");
        interpret_receipt(&tx_hash, None)
    }
}

/// Decode `getGiftCard` return data into a card.
fn decode_card(token_id: TokenId, data: &str, now: Timestamp) -> Result<GiftCardBalance, ContractError> {
    let words = abi::decode_words(data)?;
    if words.len() < GIFT_CARD_WORDS {
        return Err(ContractError::Decode(format!(
            "getGiftCard returned {} words, expected {GIFT_CARD_WORDS}",
            words.len()
        )));
    }
    let total = abi::decode_uint(&words[0])?;
    if total == 0 {
        return Err(ContractError::TokenNotFound(token_id));
    }
    let current = abi::decode_uint(&words[1])?;
    let flags = CardFlags {
        redeemable: abi::decode_bool(&words[2])?,
        rechargeable: abi::decode_bool(&words[3])?,
    };
    let expiration = match abi::decode_u64(&words[4])? {
        0 => Timestamp::NEVER,
        secs => Timestamp::new(secs),
    };
    GiftCardBalance::from_parts(
        token_id,
        Money::from_minor(total),
        Money::from_minor(current),
        flags,
        expiration,
        now,
    )
    .ok_or_else(|| ContractError::Decode(format!("card {token_id} balance exceeds its face value")))
}

/// Decode the single word returned by `balanceOfCard`.
fn decode_balance(data: &str) -> Result<Money, ContractError> {
    let words = abi::decode_words(data)?;
    let word = words
        .first()
        .ok_or_else(|| ContractError::Decode("balanceOfCard returned no data".into()))?;
    Ok(Money::from_minor(abi::decode_uint(word)?))
}

fn interpret_receipt(tx_hash: &str, raw: Option<RawReceipt>) -> Result<TransactionReceipt, ContractError> {
    let Some(raw) = raw else {
        return Ok(TransactionReceipt {
            tx_hash: tx_hash.to_string(),
            block_number: None,
            status: ReceiptStatus::Pending,
        });
    };
    if raw.status.as_deref() == Some("0x0") {
        return Err(ContractError::Reverted {
            tx_hash: raw.transaction_hash,
        });
    }
    let block_number = raw.block_number.as_deref().map(parse_quantity).transpose()?;
    Ok(TransactionReceipt {
        tx_hash: raw.transaction_hash,
        block_number,
        status: ReceiptStatus::Success,
    })
}

fn token_arg(token_id: TokenId) -> Token {
    Token::Uint(u128::from(token_id.value()))
}

fn expiration_arg(expiration: Timestamp) -> Token {
    if expiration == Timestamp::NEVER {
        Token::Uint(0)
    } else {
        Token::Uint(u128::from(expiration.as_secs()))
    }
}

#[async_trait]
impl ContractClient for EthContractClient {
    async fn get_card(&self, token_id: TokenId, now: Timestamp) -> Result<GiftCardBalance, ContractError> {
        let data = abi::encode_call(GET_GIFT_CARD, &[token_arg(token_id)]);
        let returned = self.eth_call(data).await?;
        decode_card(token_id, &returned, now)
    }

    async fn owner_of(&self, token_id: TokenId) -> Result<AccountAddress, ContractError> {
        let data = abi::encode_call(OWNER_OF, &[token_arg(token_id)]);
        let returned = self.eth_call(data).await?;
        let words = abi::decode_words(&returned)?;
        let word = words.first().ok_or(ContractError::TokenNotFound(token_id))?;
        abi::decode_address(word)
    }

    async fn next_token_id(&self) -> Result<TokenId, ContractError> {
        let returned = self.eth_call(abi::encode_call(NEXT_TOKEN_ID, &[])).await?;
        let words = abi::decode_words(&returned)?;
        let word = words
            .first()
            .ok_or_else(|| ContractError::Decode("nextTokenId returned no data".into()))?;
        Ok(TokenId::new(abi::decode_u64(word)?))
    }

    async fn get_balance(&self, token_id: TokenId) -> Result<Money, ContractError> {
        let data = abi::encode_call(BALANCE_OF_CARD, &[token_arg(token_id)]);
        let returned = self.eth_call(data).await?;
        decode_balance(&returned)
    }

    async fn commit_redemption(
        &self,
        token_id: TokenId,
        amount: Money,
    ) -> Result<TransactionReceipt, ContractError> {
        let data = abi::encode_call(REDEEM, &[token_arg(token_id), Token::Uint(amount.minor())]);
        self.send(REDEEM, data).await
    }

    async fn mint(
        &self,
        owner: &AccountAddress,
        card: &GiftCardBalance,
    ) -> Result<TransactionReceipt, ContractError> {
        let data = abi::encode_call(
            MINT,
            &[
                Token::Address(owner.clone()),
                token_arg(card.token_id),
                Token::Uint(card.total_value.minor()),
                expiration_arg(card.expiration),
                Token::Bool(card.is_redeemable),
                Token::Bool(card.is_rechargeable),
            ],
        );
        self.send(MINT, data).await
    }

    async fn recharge(&self, token_id: TokenId, amount: Money) -> Result<TransactionReceipt, ContractError> {
        let data = abi::encode_call(RECHARGE, &[token_arg(token_id), Token::Uint(amount.minor())]);
        self.send(RECHARGE, data).await
    }

    fn name(&self) -> &str {
        "eth-json-rpc"
    }
}
