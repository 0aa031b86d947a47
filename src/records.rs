//! Enriched record types
//!
//! The assembled output of the enrichment pipeline: one `Record` per
//! contract invocation, fully populated and never mutated afterwards.
//! Serializable so the CLI can dump the batch as JSON.

use crate::decode::DecodedInput;
use serde::Serialize;

/// One enriched FUNCTION_CALL action against the bridge contract.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    /// Id of the action receipt.
    pub receipt_id: String,
    /// Hash of the originating transaction.
    pub tx_id: String,
    /// Hash of the block the receipt executed in.
    pub block_hash: String,

    /// Gas attached to the call.
    pub gas_attached: u64,
    /// Gas burnt executing the receipt.
    pub gas_burnt: u64,
    /// Deposit attached to the call, in yoctoNEAR.
    pub tokens_attached: u128,
    /// Tokens burnt executing the receipt, in yoctoNEAR.
    pub tokens_burnt: u128,

    /// Contract method name.
    pub method: String,
    /// Decoded argument payload.
    pub input: DecodedInput,

    /// Hex (`0x…`) of the returned value, when the outcome succeeded
    /// with a value.
    pub success_value: Option<String>,
    /// Receipt id the result was delegated to, when the outcome
    /// succeeded with a receipt.
    pub success_receipt_id: Option<String>,

    /// Block timestamp in nanoseconds since epoch.
    pub timestamp: u64,
    /// Block height.
    pub block_height: u64,
}

/// Data behind the per-record detail page: the enriched record plus the
/// raw action list of its receipt.
#[derive(Debug, Clone, Serialize)]
pub struct RecordDetail {
    pub receipt_id: String,
    pub tx_id: String,
    pub block_hash: String,
    pub block_height: u64,
    pub timestamp: u64,
    pub gas_burnt: u64,
    pub tokens_burnt: u128,
    /// Method name when the receipt's first action is a function call.
    pub method: Option<String>,
    /// Decoded payload of that function call.
    pub input: Option<DecodedInput>,
}
