//! Service configuration with TOML file support.

use giftcard_contract::EthContractConfig;
use giftcard_types::{AccountAddress, ChainId};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::logging::LogFormat;
use crate::ServiceError;

/// Which change policy redemptions run under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangePolicyKind {
    /// The remainder stays on the redeemed card.
    #[default]
    SameToken,
    /// The redeemed card is drained and the remainder is minted as a new card.
    NewToken,
}

/// Configuration for the redemption service.
///
/// Can be loaded from a TOML file via [`ServiceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// JSON-RPC endpoint of the Ethereum provider.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Chain the gift card contract lives on. Sessions on any other chain are refused.
    #[serde(default = "default_chain_id")]
    pub chain_id: ChainId,

    /// Address of the gift card contract. Required for any on-chain call.
    #[serde(default)]
    pub contract_address: Option<AccountAddress>,

    #[serde(default)]
    pub change_policy: ChangePolicyKind,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Per-request timeout for JSON-RPC calls, in seconds.
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,

    /// Receipt polls before a transaction is reported as pending.
    #[serde(default = "default_receipt_poll_attempts")]
    pub receipt_poll_attempts: u32,

    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_chain_id() -> ChainId {
    ChainId::LOCAL
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

fn default_receipt_poll_attempts() -> u32 {
    30
}

fn default_receipt_poll_interval_ms() -> u64 {
    1_000
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ServiceError> {
        toml::from_str(s).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ServiceError> {
        toml::to_string_pretty(self).map_err(|e| ServiceError::Config(e.to_string()))
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    /// Settings for the JSON-RPC contract client.
    pub fn contract_config(&self) -> Result<EthContractConfig, ServiceError> {
        let contract_address = self
            .contract_address
            .clone()
            .ok_or_else(|| ServiceError::Config("contract_address is not set".into()))?;
        Ok(EthContractConfig {
            contract_address,
            receipt_poll_attempts: self.receipt_poll_attempts,
            receipt_poll_interval: Duration::from_millis(self.receipt_poll_interval_ms),
        })
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            chain_id: default_chain_id(),
            contract_address: None,
            change_policy: ChangePolicyKind::default(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            rpc_timeout_secs: default_rpc_timeout_secs(),
            receipt_poll_attempts: default_receipt_poll_attempts(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ServiceConfig::from_toml_str("").unwrap();
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.chain_id, ChainId::LOCAL);
        assert_eq!(config.change_policy, ChangePolicyKind::SameToken);
        assert_eq!(config.log_format, LogFormat::Human);
        assert!(config.contract_address.is_none());
    }

    #[test]
    fn partial_toml_overrides_only_given_fields() {
        let config = ServiceConfig::from_toml_str(
            r#"
            chain_id = 11155111
            change_policy = "new_token"
            contract_address = "0x00000000000000000000000000000000000000AA"
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.chain_id, ChainId::SEPOLIA);
        assert_eq!(config.change_policy, ChangePolicyKind::NewToken);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.contract_address.unwrap().as_str(),
            "0x00000000000000000000000000000000000000aa"
        );
        assert_eq!(config.rpc_timeout_secs, 30);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        assert!(matches!(
            ServiceConfig::from_toml_str(r#"change_policy = "split""#),
            Err(ServiceError::Config(_))
        ));
        assert!(matches!(
            ServiceConfig::from_toml_str(r#"contract_address = "0x12""#),
            Err(ServiceError::Config(_))
        ));
    }

    #[test]
    fn toml_round_trip() {
        let mut config = ServiceConfig::default();
        config.contract_address = Some(AccountAddress::from_bytes([0x11; 20]));
        config.change_policy = ChangePolicyKind::NewToken;
        let text = config.to_toml_string().unwrap();
        let back = ServiceConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.contract_address, config.contract_address);
        assert_eq!(back.change_policy, ChangePolicyKind::NewToken);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rpc_url = \"http://node:8545\"\nreceipt_poll_attempts = 3").unwrap();
        let config = ServiceConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.rpc_url, "http://node:8545");
        assert_eq!(config.receipt_poll_attempts, 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            ServiceConfig::from_toml_file("/definitely/not/here.toml"),
            Err(ServiceError::Io(_))
        ));
    }

    #[test]
    fn contract_config_requires_address() {
        assert!(ServiceConfig::default().contract_config().is_err());

        let mut config = ServiceConfig::default();
        config.contract_address = Some(AccountAddress::from_bytes([0x22; 20]));
        config.receipt_poll_interval_ms = 250;
        let eth = config.contract_config().unwrap();
        assert_eq!(eth.receipt_poll_interval, Duration::from_millis(250));
    }
}
