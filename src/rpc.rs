//! JSON-RPC client for the NEAR archival node
//!
//! Provides a typed interface to the three read queries the explorer
//! needs: receipt by id, transaction by id, and block by hash. An
//! `{"error": ...}` envelope from the node is surfaced as an explicit
//! `RpcError::CallFailed` instead of faulting on missing nested fields.

use crate::errors::RpcError;
use crate::types::{BlockView, ReceiptView, TransactionView};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

/// Attempts per call before a transport error is considered permanent.
const TRANSPORT_ATTEMPTS: u32 = 3;

/// Initial backoff between transport retries; doubles per attempt.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Read access to the remote ledger. The enricher depends on this trait
/// so tests can substitute a stub for the live node.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetch a receipt by id (`EXPERIMENTAL_receipt`).
    async fn get_receipt(&self, receipt_id: &str) -> Result<ReceiptView, RpcError>;

    /// Fetch a transaction with its receipt outcomes (`tx`).
    async fn get_transaction(&self, tx_id: &str) -> Result<TransactionView, RpcError>;

    /// Fetch a block by hash or height (`block`).
    async fn get_block(&self, block_id: &str) -> Result<BlockView, RpcError>;
}

/// JSON-RPC 2.0 client for a NEAR node.
pub struct NearRpcClient {
    client: reqwest::Client,
    url: String,
}

impl NearRpcClient {
    /// Create a new RPC client for the given endpoint URL.
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    /// Make a JSON-RPC call and deserialize the `result` payload.
    ///
    /// Transport failures are retried with doubling backoff; an error
    /// envelope is a semantic answer from the node (e.g. unknown
    /// transaction) and is returned immediately.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, RpcError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": "dontcare",
            "method": method,
            "params": params
        });

        let mut backoff = RETRY_BACKOFF;
        let mut attempt = 1;
        let envelope: Value = loop {
            match self.send(method, &request).await {
                Ok(envelope) => break envelope,
                Err(err) if attempt < TRANSPORT_ATTEMPTS => {
                    tracing::warn!(
                        "transport error calling `{}` (attempt {}/{}), retrying in {:?}: {}",
                        method,
                        attempt,
                        TRANSPORT_ATTEMPTS,
                        backoff,
                        err
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(source) => return Err(RpcError::Transport { method, source }),
            }
        };

        if let Some(error) = envelope.get("error") {
            return Err(RpcError::CallFailed {
                method,
                message: error.to_string(),
            });
        }

        let result = envelope
            .get("result")
            .cloned()
            .ok_or(RpcError::MissingResult { method })?;

        serde_json::from_value(result).map_err(|source| RpcError::Deserialize { method, source })
    }

    /// One POST round trip returning the raw response envelope.
    async fn send(&self, method: &str, request: &Value) -> Result<Value, reqwest::Error> {
        tracing::debug!("RPC call `{}`", method);
        let response = self.client.post(&self.url).json(request).send().await?;
        response.json().await
    }
}

#[async_trait]
impl LedgerClient for NearRpcClient {
    async fn get_receipt(&self, receipt_id: &str) -> Result<ReceiptView, RpcError> {
        self.call("EXPERIMENTAL_receipt", json!({ "receipt_id": receipt_id }))
            .await
    }

    async fn get_transaction(&self, tx_id: &str) -> Result<TransactionView, RpcError> {
        self.call("tx", json!([tx_id, "dontcare"])).await
    }

    async fn get_block(&self, block_id: &str) -> Result<BlockView, RpcError> {
        self.call("block", json!({ "block_id": block_id })).await
    }
}
