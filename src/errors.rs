//! Error types for the enrichment pipeline
//!
//! One enum per concern: binary decoding, remote RPC calls, the disk
//! cache, the indexer database, and the enrichment pipeline that ties
//! them together. The CLI wraps these in `anyhow` at the boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the RLP decoder and the method payload decoders.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Truncated, non-canonical, or otherwise inconsistent RLP input.
    #[error("malformed RLP encoding: {0}")]
    MalformedEncoding(&'static str),

    /// The "to" field of an Ethereum transaction must be 0 bytes
    /// (contract deployment) or 20 bytes (call).
    #[error("invalid recipient encoding: expected 0 or 20 bytes, got {0}")]
    InvalidRecipientEncoding(usize),

    /// No decoder is registered for this method name. The registry must
    /// be extended to match the deployed contract interface.
    #[error("no decoder registered for method `{0}`")]
    UnsupportedMethod(String),

    /// The base64 payload attached to the function call did not decode.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Errors from the remote JSON-RPC node.
#[derive(Debug, Error)]
pub enum RpcError {
    /// HTTP-level failure (connection, timeout, non-JSON body).
    #[error("transport error calling `{method}`: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The node answered with an `{"error": ...}` envelope.
    #[error("RPC call `{method}` failed: {message}")]
    CallFailed { method: &'static str, message: String },

    /// The response envelope had neither `result` nor `error`.
    #[error("RPC response for `{method}` missing `result` field")]
    MissingResult { method: &'static str },

    /// The `result` payload did not match the expected schema.
    #[error("failed to deserialize `{method}` response: {source}")]
    Deserialize {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from the on-disk result cache. All of these are fatal for the
/// batch; there is no partial-cache recovery.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to create cache directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored entry exists but no longer deserializes.
    #[error("corrupt cache entry at {path:?}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize cache key or value: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Errors from the indexer database query.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("failed to connect to indexer database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("indexer query failed: {0}")]
    Query(#[source] sqlx::Error),
}

/// Errors from the record enrichment pipeline. The batch is fail-fast:
/// the first of these aborts the whole run.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// The indexer returned an action kind that is neither enriched nor
    /// in the known ignore set. Every kind must be classified explicitly.
    #[error("unrecognized action kind `{0}`")]
    UnrecognizedActionKind(String),

    /// The `args` column of a FUNCTION_CALL row did not match the
    /// expected call-args shape.
    #[error("invalid call args for receipt {receipt_id}: {source}")]
    InvalidCallArgs {
        receipt_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// The transaction's outcome list contains no entry for this receipt.
    /// Indicates an indexer / ledger mismatch.
    #[error("no outcome matching receipt {receipt_id} in transaction {tx_id}")]
    OutcomeNotFound { receipt_id: String, tx_id: String },

    /// The detail page was asked for a receipt with no actions.
    #[error("receipt {0} contains no actions")]
    EmptyReceipt(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}
