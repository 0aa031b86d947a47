//! aurora-scan - read-only explorer for the Aurora bridge on NEAR
//!
//! This library enriches raw indexed action rows with transaction,
//! outcome, and block data fetched from a NEAR archival RPC node,
//! decodes method payloads (including RLP-encoded Ethereum transactions
//! submitted through the bridge), and renders the result for display.

pub mod cache;
pub mod cli;
pub mod config;
pub mod decode;
pub mod enrich;
pub mod errors;
pub mod indexer;
pub mod records;
pub mod render;
pub mod rlp;
pub mod rpc;
pub mod types;

// Re-export the main types for convenience
pub use cache::DiskCache;
pub use config::ExplorerConfig;
pub use decode::{decode_payload, DecodedInput, EthTransaction};
pub use enrich::RecordEnricher;
pub use errors::{CacheError, DecodeError, EnrichError, IndexerError, RpcError};
pub use records::{Record, RecordDetail};
pub use rpc::{LedgerClient, NearRpcClient};
