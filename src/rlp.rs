//! RLP decoding primitives
//!
//! A self-contained decoder for the recursive-length-prefix encoding used
//! by Ethereum-style transaction payloads, plus big-endian unsigned
//! integer decoding. Inputs come from untrusted on-chain payloads, so
//! every length prefix is checked against the remaining buffer and
//! non-canonical encodings are rejected.

use crate::errors::DecodeError;

/// One node of a decoded RLP tree: either a raw byte string or a list of
/// further nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// Return the byte-string payload, or an error if this is a list.
    pub fn as_bytes(&self) -> Result<&[u8], DecodeError> {
        match self {
            RlpItem::Bytes(b) => Ok(b),
            RlpItem::List(_) => Err(DecodeError::MalformedEncoding(
                "expected a byte string, found a list",
            )),
        }
    }
}

/// Decode a big-endian unsigned integer of arbitrary length.
///
/// Empty input decodes to 0. Inputs wider than 16 bytes do not fit the
/// quantities this tool handles and are rejected rather than truncated.
pub fn decode_uint(bytes: &[u8]) -> Result<u128, DecodeError> {
    if bytes.len() > 16 {
        return Err(DecodeError::MalformedEncoding(
            "unsigned integer wider than 16 bytes",
        ));
    }
    let mut value: u128 = 0;
    for &byte in bytes {
        value = (value << 8) | u128::from(byte);
    }
    Ok(value)
}

/// Decode a complete RLP buffer into a single item.
///
/// The whole buffer must be consumed; trailing bytes after the top-level
/// item are an error.
pub fn decode_rlp(buf: &[u8]) -> Result<RlpItem, DecodeError> {
    let (item, consumed) = decode_item(buf)?;
    if consumed != buf.len() {
        return Err(DecodeError::MalformedEncoding(
            "trailing bytes after top-level item",
        ));
    }
    Ok(item)
}

/// Decode one item from the front of `buf`, returning it together with
/// the number of bytes consumed.
fn decode_item(buf: &[u8]) -> Result<(RlpItem, usize), DecodeError> {
    let prefix = *buf
        .first()
        .ok_or(DecodeError::MalformedEncoding("empty input"))?;

    match prefix {
        // Single byte in [0x00, 0x7f] encodes itself.
        0x00..=0x7f => Ok((RlpItem::Bytes(vec![prefix]), 1)),

        // Short string: length in the prefix.
        0x80..=0xb7 => {
            let len = (prefix - 0x80) as usize;
            let payload = take(buf, 1, len)?;
            if len == 1 && payload[0] < 0x80 {
                return Err(DecodeError::MalformedEncoding(
                    "non-canonical single-byte string",
                ));
            }
            Ok((RlpItem::Bytes(payload.to_vec()), 1 + len))
        }

        // Long string: length of the length in the prefix.
        0xb8..=0xbf => {
            let (len, header) = decode_long_length(buf, prefix - 0xb7)?;
            let payload = take(buf, header, len)?;
            Ok((RlpItem::Bytes(payload.to_vec()), header + len))
        }

        // Short list.
        0xc0..=0xf7 => {
            let len = (prefix - 0xc0) as usize;
            let payload = take(buf, 1, len)?;
            Ok((RlpItem::List(decode_list(payload)?), 1 + len))
        }

        // Long list.
        0xf8..=0xff => {
            let (len, header) = decode_long_length(buf, prefix - 0xf7)?;
            let payload = take(buf, header, len)?;
            Ok((RlpItem::List(decode_list(payload)?), header + len))
        }
    }
}

/// Decode the big-endian length that follows a long-form prefix.
/// Returns the payload length and the total header size (prefix plus
/// length bytes).
fn decode_long_length(buf: &[u8], len_of_len: u8) -> Result<(usize, usize), DecodeError> {
    let len_of_len = len_of_len as usize;
    let len_bytes = take(buf, 1, len_of_len)?;
    if len_bytes[0] == 0 {
        return Err(DecodeError::MalformedEncoding(
            "length has leading zero bytes",
        ));
    }
    if len_of_len > std::mem::size_of::<usize>() {
        return Err(DecodeError::MalformedEncoding("length prefix too wide"));
    }
    let mut len: usize = 0;
    for &byte in len_bytes {
        len = (len << 8) | byte as usize;
    }
    if len < 56 {
        return Err(DecodeError::MalformedEncoding(
            "long form used for a short length",
        ));
    }
    Ok((len, 1 + len_of_len))
}

/// Slice `len` payload bytes starting at `offset`, checking truncation.
fn take(buf: &[u8], offset: usize, len: usize) -> Result<&[u8], DecodeError> {
    let end = offset
        .checked_add(len)
        .ok_or(DecodeError::MalformedEncoding("length overflow"))?;
    buf.get(offset..end)
        .ok_or(DecodeError::MalformedEncoding("truncated payload"))
}

/// Decode the concatenated items inside a list payload.
fn decode_list(mut payload: &[u8]) -> Result<Vec<RlpItem>, DecodeError> {
    let mut items = Vec::new();
    while !payload.is_empty() {
        let (item, consumed) = decode_item(payload)?;
        items.push(item);
        payload = &payload[consumed..];
    }
    Ok(items)
}
