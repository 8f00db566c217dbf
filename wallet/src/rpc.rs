//! Ethereum JSON-RPC 2.0 over HTTP.

use crate::error::RpcError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for an Ethereum JSON-RPC provider.
///
/// Wraps `reqwest::Client` with the provider URL and a request id counter.
pub struct JsonRpcTransport {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

impl JsonRpcTransport {
    /// Create a transport targeting `url` (e.g. `http://127.0.0.1:8545`).
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| RpcError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    /// The configured provider URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call `method` with positional `params` and decode the `result` field.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::trace!(method, id, "json-rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RpcError::Http(response.status().as_u16()));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RpcError::Decode(format!("invalid JSON response: {e}")))?;

        let result = decode_response(json)?;
        serde_json::from_value(result)
            .map_err(|e| RpcError::Decode(format!("unexpected result for {method}: {e}")))
    }
}

/// Extract `result` from a JSON-RPC response, surfacing the `error` object if present.
///
/// A missing `result` decodes as JSON `null` (e.g. a receipt that is not mined yet).
pub(crate) fn decode_response(json: serde_json::Value) -> Result<serde_json::Value, RpcError> {
    let envelope: Envelope = serde_json::from_value(json)
        .map_err(|e| RpcError::Decode(format!("not a JSON-RPC response: {e}")))?;
    if let Some(err) = envelope.error {
        return Err(RpcError::Provider {
            code: err.code,
            message: err.message,
        });
    }
    Ok(envelope.result.unwrap_or(serde_json::Value::Null))
}

/// Parse a hex quantity such as `"0x1a"`.
pub fn parse_quantity(raw: &str) -> Result<u64, RpcError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::Decode(format!("quantity without 0x prefix: {raw}")))?;
    if digits.is_empty() {
        return Err(RpcError::Decode("empty quantity".into()));
    }
    u64::from_str_radix(digits, 16).map_err(|e| RpcError::Decode(format!("bad quantity {raw}: {e}")))
}
