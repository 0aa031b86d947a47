//! NEAR JSON-RPC types and raw indexer rows
//!
//! Typed views over the loosely-structured JSON returned by the NEAR RPC
//! node, plus the raw action rows read from the indexer database. Fields
//! we never look at are simply not modeled; fields we do look at fail
//! loudly when missing or renamed instead of decaying to an implicit
//! absence value.
//!
//! NEAR serializes token amounts as decimal strings. The same structs
//! round-trip through the disk cache as plain JSON, so the u128 helpers
//! keep the string form on the way back out.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One raw action row from the indexer database:
/// `(receipt_id, tx_id, action_kind, args)`.
#[derive(Debug, Clone)]
pub struct RawActionRow {
    pub receipt_id: String,
    pub tx_id: String,
    pub action_kind: String,
    pub args: serde_json::Value,
}

/// The action kinds this tool classifies. Everything else coming out of
/// the indexer is an error, forcing explicit classification of new kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    FunctionCall,
    CreateAccount,
    Transfer,
    AddKey,
    DeployContract,
}

impl ActionKind {
    /// Parse the indexer's SCREAMING_SNAKE kind string. `None` means the
    /// kind is unrecognized.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "FUNCTION_CALL" => Some(ActionKind::FunctionCall),
            "CREATE_ACCOUNT" => Some(ActionKind::CreateAccount),
            "TRANSFER" => Some(ActionKind::Transfer),
            "ADD_KEY" => Some(ActionKind::AddKey),
            "DEPLOY_CONTRACT" => Some(ActionKind::DeployContract),
            _ => None,
        }
    }
}

/// Arguments of a FUNCTION_CALL action as stored in the indexer's `args`
/// column.
#[derive(Debug, Clone, Deserialize)]
pub struct CallArgs {
    pub method_name: String,
    pub args_base64: String,
    /// Attached gas.
    pub gas: u64,
    /// Attached deposit in yoctoNEAR (decimal string in JSON).
    #[serde(deserialize_with = "deserialize_dec_u128")]
    pub deposit: u128,
}

/// Result of the `tx` RPC method. Only the outcome list is modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionView {
    pub receipts_outcome: Vec<ReceiptOutcomeView>,
}

/// Execution outcome of a single receipt within a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptOutcomeView {
    /// Receipt id this outcome belongs to.
    pub id: String,
    /// Hash of the block the receipt executed in.
    pub block_hash: String,
    pub outcome: OutcomeView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeView {
    pub gas_burnt: u64,
    /// Tokens burnt in yoctoNEAR (decimal string in JSON).
    #[serde(with = "dec_u128")]
    pub tokens_burnt: u128,
    pub status: ExecutionStatusView,
}

/// Tagged execution status. Exactly one variant is set per outcome;
/// absence of both success variants is a non-success outcome and the
/// display layer decides how to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatusView {
    /// Base64 of the returned value.
    SuccessValue(String),
    /// Id of the receipt the result was delegated to.
    SuccessReceiptId(String),
    Failure(serde_json::Value),
    Unknown,
}

/// Result of the `block` RPC method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockView {
    pub header: BlockHeaderView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeaderView {
    pub height: u64,
    /// Nanoseconds since epoch.
    pub timestamp: u64,
    pub hash: String,
}

/// Result of the `EXPERIMENTAL_receipt` RPC method, reduced to the action
/// list the detail page needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptView {
    pub receipt_id: String,
    pub receipt: ReceiptEnumView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReceiptEnumView {
    Action {
        actions: Vec<ActionView>,
    },
    /// Data receipts carry no actions; kept so a non-action receipt fails
    /// on access, not on parse.
    Data(serde_json::Value),
}

/// One action inside an action receipt, as the RPC serializes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActionView {
    CreateAccount,
    DeployContract {
        code: String,
    },
    FunctionCall {
        method_name: String,
        /// Base64 payload (the RPC names this `args`, the indexer
        /// `args_base64`).
        args: String,
        gas: u64,
        #[serde(with = "dec_u128")]
        deposit: u128,
    },
    Transfer {
        #[serde(with = "dec_u128")]
        deposit: u128,
    },
    Stake(serde_json::Value),
    AddKey(serde_json::Value),
    DeleteKey(serde_json::Value),
    DeleteAccount(serde_json::Value),
}

/// Deserialize a u128 from a decimal string.
fn deserialize_dec_u128<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    text.parse().map_err(serde::de::Error::custom)
}

/// Decimal-string form for u128 amounts, both directions, so cached JSON
/// reads back with the same shape the RPC sends.
mod dec_u128 {
    use super::*;

    pub fn serialize<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_dec_u128(deserializer)
    }
}
