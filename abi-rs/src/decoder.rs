//! Call data and return data decoding.
//!
//! Offsets reported in errors are absolute positions in the buffer handed to
//! [`decode_params`]; for [`decode_call`] that is the parameter area after the
//! selector.

use crate::error::DecodingError;
use crate::types::{AbiParameter, AbiType, FunctionSignature};
use crate::value::AbiValue;
use crate::word::{
    decode_address, decode_bool, decode_fixed_bytes, decode_int, decode_uint, encode_hex,
    read_word, Word, WORD_SIZE,
};
use ethers::types::U256;
use serde_json::{Map, Value};

/// Decoded parameters in declaration order, keyed by name or `param{i}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedParams {
    entries: Vec<(String, AbiValue)>,
}

impl DecodedParams {
    pub fn get(&self, key: &str) -> Option<&AbiValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AbiValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_values(self) -> Vec<AbiValue> {
        self.entries.into_iter().map(|(_, v)| v).collect()
    }

    /// JSON object in declaration order.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Value::Object(map)
    }
}

/// Decode a function's inputs from full call data (selector included).
pub fn decode_call(
    signature: &FunctionSignature,
    call_data: &[u8],
) -> Result<DecodedParams, DecodingError> {
    let got = call_data.get(..4).ok_or(DecodingError::Truncated {
        param: "selector".to_string(),
        offset: 0,
        needed: 4,
        available: call_data.len(),
    })?;
    let expected = signature.selector();
    if got != &expected[..] {
        return Err(DecodingError::SelectorMismatch {
            expected: encode_hex(&expected),
            got: encode_hex(got),
        });
    }
    decode_params(&signature.inputs, &call_data[4..])
}

/// Decode `eth_call` return data against the function's outputs.
pub fn decode_output(
    signature: &FunctionSignature,
    data: &[u8],
) -> Result<DecodedParams, DecodingError> {
    decode_params(&signature.outputs, data)
}

pub fn decode_params(
    params: &[AbiParameter],
    data: &[u8],
) -> Result<DecodedParams, DecodingError> {
    // Fail on short input before touching any offsets.
    let mut pos = 0usize;
    for param in params {
        match pos.checked_add(param.kind.head_size()) {
            Some(end) if end <= data.len() => pos = end,
            _ => {
                return Err(DecodingError::Truncated {
                    param: param.key(),
                    offset: pos,
                    needed: params
                        .iter()
                        .fold(0usize, |acc, p| acc.saturating_add(p.kind.head_size())),
                    available: data.len(),
                })
            }
        }
    }

    let mut pos = 0usize;
    let mut entries = Vec::with_capacity(params.len());
    for param in params {
        let key = param.key();
        let value = read_value(&param.kind, data, 0, pos, &key)?;
        pos += param.kind.head_size();
        entries.push((key, value));
    }

    Ok(DecodedParams { entries })
}

// `base` is the start of the enclosing parameter area, `pos` the head slot.
fn read_value(
    ty: &AbiType,
    data: &[u8],
    base: usize,
    pos: usize,
    path: &str,
) -> Result<AbiValue, DecodingError> {
    if ty.is_dynamic() {
        let start = read_offset(data, base, pos, path)?;
        read_tail(ty, data, start, path)
    } else {
        read_static(ty, data, pos, path)
    }
}

fn read_static(
    ty: &AbiType,
    data: &[u8],
    pos: usize,
    path: &str,
) -> Result<AbiValue, DecodingError> {
    if let AbiType::FixedArray(inner, len) = ty {
        let size = inner.head_size();
        return (0..*len)
            .map(|i| {
                let slot = pos.saturating_add(i.saturating_mul(size));
                read_static(inner, data, slot, &format!("{path}[{i}]"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(AbiValue::Array);
    }

    let word = word_at(data, pos, path)?;
    let value = match ty {
        AbiType::Address => decode_address(&word).map(AbiValue::Address),
        AbiType::Bool => decode_bool(&word).map(AbiValue::Bool),
        AbiType::Uint(bits) => decode_uint(&word, *bits).map(AbiValue::Uint),
        AbiType::Int(bits) => decode_int(&word, *bits).map(AbiValue::Int),
        AbiType::FixedBytes(size) => decode_fixed_bytes(&word, *size).map(AbiValue::FixedBytes),
        AbiType::Bytes | AbiType::String | AbiType::Array(_) | AbiType::FixedArray(..) => None,
    };
    value.ok_or_else(|| DecodingError::InvalidValue {
        param: path.to_string(),
        offset: pos,
        ty: ty.to_string(),
    })
}

fn read_tail(
    ty: &AbiType,
    data: &[u8],
    start: usize,
    path: &str,
) -> Result<AbiValue, DecodingError> {
    match ty {
        AbiType::Bytes => read_byte_payload(data, start, path).map(AbiValue::Bytes),
        AbiType::String => {
            let bytes = read_byte_payload(data, start, path)?;
            String::from_utf8(bytes)
                .map(AbiValue::String)
                .map_err(|_| DecodingError::InvalidValue {
                    param: path.to_string(),
                    offset: start,
                    ty: ty.to_string(),
                })
        }
        AbiType::Array(inner) => {
            let count = read_length(data, start, path)?;
            let base = start + WORD_SIZE;
            // Every element needs at least its head slot.
            let needed = count
                .checked_mul(inner.head_size())
                .and_then(|n| n.checked_add(base));
            match needed {
                Some(needed) if needed <= data.len() => {}
                _ => {
                    return Err(DecodingError::Truncated {
                        param: path.to_string(),
                        offset: base,
                        needed: needed.unwrap_or(usize::MAX),
                        available: data.len(),
                    })
                }
            }
            read_sequence(inner, count, data, base, path)
        }
        AbiType::FixedArray(inner, len) => read_sequence(inner, *len, data, start, path),
        _ => read_static(ty, data, start, path),
    }
}

fn read_sequence(
    inner: &AbiType,
    count: usize,
    data: &[u8],
    base: usize,
    path: &str,
) -> Result<AbiValue, DecodingError> {
    let size = inner.head_size();
    (0..count)
        .map(|i| {
            let slot = base.saturating_add(i.saturating_mul(size));
            read_value(inner, data, base, slot, &format!("{path}[{i}]"))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(AbiValue::Array)
}

fn read_byte_payload(data: &[u8], start: usize, path: &str) -> Result<Vec<u8>, DecodingError> {
    let len = read_length(data, start, path)?;
    let begin = start + WORD_SIZE;
    let end = begin.saturating_add(len);
    data.get(begin..end)
        .map(<[u8]>::to_vec)
        .ok_or(DecodingError::Truncated {
            param: path.to_string(),
            offset: begin,
            needed: end,
            available: data.len(),
        })
}

fn read_length(data: &[u8], pos: usize, path: &str) -> Result<usize, DecodingError> {
    let raw = U256::from_big_endian(&word_at(data, pos, path)?);
    if raw > U256::from(data.len()) {
        return Err(DecodingError::Truncated {
            param: path.to_string(),
            offset: pos + WORD_SIZE,
            needed: saturating_usize(raw),
            available: data.len(),
        });
    }
    Ok(raw.as_usize())
}

fn read_offset(data: &[u8], base: usize, pos: usize, path: &str) -> Result<usize, DecodingError> {
    let raw = U256::from_big_endian(&word_at(data, pos, path)?);
    let invalid = || DecodingError::InvalidOffset {
        param: path.to_string(),
        offset: pos,
        target: raw.to_string(),
        len: data.len(),
    };
    if raw >= U256::from(data.len()) {
        return Err(invalid());
    }
    let start = base + raw.as_usize();
    if start >= data.len() {
        return Err(invalid());
    }
    Ok(start)
}

fn word_at(data: &[u8], pos: usize, path: &str) -> Result<Word, DecodingError> {
    read_word(data, pos).ok_or(DecodingError::Truncated {
        param: path.to_string(),
        offset: pos,
        needed: pos.saturating_add(WORD_SIZE),
        available: data.len(),
    })
}

fn saturating_usize(v: U256) -> usize {
    if v > U256::from(usize::MAX) {
        usize::MAX
    } else {
        v.as_usize()
    }
}
