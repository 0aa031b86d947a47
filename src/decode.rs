//! Method payload decoding
//!
//! Decodes the binary argument payload attached to Aurora contract calls.
//! `submit` carries an RLP-encoded Ethereum transaction and gets a full
//! structured decode; every other known method is passed through as raw
//! hex. Unknown method names fail loudly so the registry is kept in sync
//! with the deployed contract interface.

use crate::errors::DecodeError;
use crate::rlp::{decode_rlp, decode_uint, RlpItem};
use alloy_primitives::{Address, B256};
use serde::{Serialize, Serializer};

/// Known Aurora methods whose payloads we do not decode structurally.
/// Their raw bytes are rendered as hex.
const PASSTHROUGH_METHODS: &[&str] = &[
    "deposit",
    "finish_deposit",
    "ft_on_transfer",
    "ft_resolve_transfer",
    "get_nep141_from_erc20",
    "call",
    "deploy_erc20_token",
    "new",
    "ft_transfer",
    "ft_transfer_call",
    "withdraw",
    "new_eth_connector",
    "set_eth_connector_contract_data",
    "ft_balance_of_eth",
    "get_erc20_from_nep141",
    "storage_deposit",
];

/// ECDSA signature triple carried by a legacy Ethereum transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EcdsaSignature {
    pub v: u64,
    pub r: B256,
    pub s: B256,
}

/// A decoded Ethereum transaction from a `submit` payload.
///
/// `sender` is always `None`: recovering it requires ecrecover over the
/// signature, which this tool does not implement. The display layer
/// renders it as unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EthTransaction {
    pub sender: Option<Address>,
    pub nonce: u128,
    pub gas_price: u128,
    pub gas: u128,
    /// `None` marks a contract deployment.
    pub to: Option<Address>,
    pub value: u128,
    #[serde(serialize_with = "serialize_hex_bytes")]
    pub data: Vec<u8>,
    pub signature: EcdsaSignature,
}

/// Decoded form of a method's argument payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DecodedInput {
    EthTransaction(EthTransaction),
    RawHex(String),
}

/// Decoder capability bound to a method name.
///
/// A fixed enumeration rather than a lookup table: every method the
/// contract exposes is classified here, and a name with no entry is a
/// hard error instead of a dictionary miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodDecoder {
    /// Structured decode of an RLP-encoded Ethereum transaction.
    EthTransaction,
    /// Identity passthrough rendering the raw bytes as hex.
    RawHex,
}

impl MethodDecoder {
    /// Look up the decoder registered for a method name.
    pub fn for_method(name: &str) -> Option<Self> {
        match name {
            "submit" => Some(MethodDecoder::EthTransaction),
            m if PASSTHROUGH_METHODS.contains(&m) => Some(MethodDecoder::RawHex),
            _ => None,
        }
    }

    /// Run this decoder over a raw payload.
    pub fn decode(self, raw: &[u8]) -> Result<DecodedInput, DecodeError> {
        match self {
            MethodDecoder::EthTransaction => {
                Ok(DecodedInput::EthTransaction(decode_eth_transaction(raw)?))
            }
            MethodDecoder::RawHex => Ok(DecodedInput::RawHex(format!("0x{}", hex::encode(raw)))),
        }
    }
}

/// Decode a method payload, failing with `UnsupportedMethod` when no
/// decoder is registered for the name.
pub fn decode_payload(method: &str, raw: &[u8]) -> Result<DecodedInput, DecodeError> {
    MethodDecoder::for_method(method)
        .ok_or_else(|| DecodeError::UnsupportedMethod(method.to_string()))?
        .decode(raw)
}

/// Decode an RLP-encoded legacy Ethereum transaction.
///
/// The payload must be a list of exactly 9 byte strings:
/// `[nonce, gasPrice, gas, to, value, data, v, r, s]`. The `to` field is
/// 0 bytes for a contract deployment and 20 bytes for a call; any other
/// length is rejected.
pub fn decode_eth_transaction(raw: &[u8]) -> Result<EthTransaction, DecodeError> {
    let fields = match decode_rlp(raw)? {
        RlpItem::List(fields) => fields,
        RlpItem::Bytes(_) => {
            return Err(DecodeError::MalformedEncoding(
                "transaction payload is not a list",
            ))
        }
    };
    if fields.len() != 9 {
        return Err(DecodeError::MalformedEncoding(
            "transaction list must have exactly 9 fields",
        ));
    }

    let nonce = decode_uint(fields[0].as_bytes()?)?;
    let gas_price = decode_uint(fields[1].as_bytes()?)?;
    let gas = decode_uint(fields[2].as_bytes()?)?;

    let to_bytes = fields[3].as_bytes()?;
    let to = match to_bytes.len() {
        0 => None,
        20 => Some(Address::from_slice(to_bytes)),
        other => return Err(DecodeError::InvalidRecipientEncoding(other)),
    };

    let value = decode_uint(fields[4].as_bytes()?)?;
    let data = fields[5].as_bytes()?.to_vec();

    let v = u64::try_from(decode_uint(fields[6].as_bytes()?)?)
        .map_err(|_| DecodeError::MalformedEncoding("signature v does not fit 64 bits"))?;
    let r = signature_word(fields[7].as_bytes()?)?;
    let s = signature_word(fields[8].as_bytes()?)?;

    Ok(EthTransaction {
        // Sender recovery (ecrecover) is not implemented.
        sender: None,
        nonce,
        gas_price,
        gas,
        to,
        value,
        data,
        signature: EcdsaSignature { v, r, s },
    })
}

/// Left-pad a signature component to 32 bytes. RLP strips leading zeros,
/// so `r` and `s` arrive with variable length.
fn signature_word(bytes: &[u8]) -> Result<B256, DecodeError> {
    if bytes.len() > 32 {
        return Err(DecodeError::MalformedEncoding(
            "signature word wider than 32 bytes",
        ));
    }
    let mut padded = [0u8; 32];
    padded[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(B256::from(padded))
}

/// Serialize raw bytes as a `0x…` hex string.
fn serialize_hex_bytes<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
}
