//! Head/tail call data encoding.

use crate::error::EncodingError;
use crate::types::{AbiType, FunctionSignature};
use crate::value::AbiValue;
use crate::word::{
    address_word, bool_word, encode_fixed_bytes, encode_int, encode_uint, padded_len,
    uint256_word, WORD_SIZE,
};
use ethers::types::U256;

/// `selector ‖ encode_params(inputs, args)`.
pub fn encode_call(
    signature: &FunctionSignature,
    args: &[AbiValue],
) -> Result<Vec<u8>, EncodingError> {
    let types: Vec<AbiType> = signature.inputs.iter().map(|p| p.kind.clone()).collect();
    let params = encode_params(&types, args)?;

    let mut out = Vec::with_capacity(4 + params.len());
    out.extend_from_slice(&signature.selector());
    out.extend_from_slice(&params);

    tracing::trace!(
        function = %signature.canonical(),
        bytes = out.len(),
        "encoded call data"
    );
    Ok(out)
}

/// Encode a parameter list without a selector.
///
/// Static values are written straight into the head. Each dynamic value gets
/// a placeholder word in the head and its payload appended to the tail; once
/// the head length is final the placeholders are backfilled with offsets
/// measured from the start of this parameter area.
pub fn encode_params(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>, EncodingError> {
    if types.len() != values.len() {
        return Err(EncodingError::ArgumentCount {
            expected: types.len(),
            got: values.len(),
        });
    }

    let mut head = Vec::with_capacity(types.len() * WORD_SIZE);
    let mut tail = Vec::new();
    // (head slot, payload position within tail)
    let mut placeholders = Vec::new();

    for (ty, value) in types.iter().zip(values) {
        if ty.is_dynamic() {
            placeholders.push((head.len(), tail.len()));
            head.extend_from_slice(&[0u8; WORD_SIZE]);
            tail.extend_from_slice(&encode_tail(ty, value)?);
        } else {
            encode_static(ty, value, &mut head)?;
        }
    }

    let head_len = head.len();
    for (slot, tail_pos) in placeholders {
        let offset = uint256_word(U256::from(head_len + tail_pos));
        head[slot..slot + WORD_SIZE].copy_from_slice(&offset);
    }

    head.extend_from_slice(&tail);
    Ok(head)
}

fn encode_static(ty: &AbiType, value: &AbiValue, out: &mut Vec<u8>) -> Result<(), EncodingError> {
    match (ty, value) {
        (AbiType::Address, AbiValue::Address(addr)) => out.extend_from_slice(&address_word(*addr)),
        (AbiType::Bool, AbiValue::Bool(b)) => out.extend_from_slice(&bool_word(*b)),
        (AbiType::Uint(bits), AbiValue::Uint(v)) => out.extend_from_slice(&encode_uint(*v, *bits)?),
        (AbiType::Int(bits), AbiValue::Int(v)) => out.extend_from_slice(&encode_int(*v, *bits)?),
        (AbiType::FixedBytes(size), AbiValue::FixedBytes(bytes)) => {
            out.extend_from_slice(&encode_fixed_bytes(bytes, *size)?)
        }
        (AbiType::FixedArray(inner, len), AbiValue::Array(items)) => {
            check_len(ty, *len, items.len())?;
            for item in items {
                encode_static(inner, item, out)?;
            }
        }
        _ => return Err(mismatch(ty, value)),
    }
    Ok(())
}

fn encode_tail(ty: &AbiType, value: &AbiValue) -> Result<Vec<u8>, EncodingError> {
    match (ty, value) {
        (AbiType::Bytes, AbiValue::Bytes(bytes)) => Ok(length_prefixed(bytes)),
        (AbiType::String, AbiValue::String(s)) => Ok(length_prefixed(s.as_bytes())),
        (AbiType::Array(inner), AbiValue::Array(items)) => {
            let types = vec![(**inner).clone(); items.len()];
            let mut out = uint256_word(U256::from(items.len())).to_vec();
            out.extend_from_slice(&encode_params(&types, items)?);
            Ok(out)
        }
        (AbiType::FixedArray(inner, len), AbiValue::Array(items)) => {
            check_len(ty, *len, items.len())?;
            let types = vec![(**inner).clone(); items.len()];
            encode_params(&types, items)
        }
        _ => Err(mismatch(ty, value)),
    }
}

// Length word, then the data right-padded to a word boundary.
fn length_prefixed(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(WORD_SIZE + padded_len(data.len()));
    out.extend_from_slice(&uint256_word(U256::from(data.len())));
    out.extend_from_slice(data);
    out.resize(WORD_SIZE + padded_len(data.len()), 0);
    out
}

fn check_len(ty: &AbiType, expected: usize, got: usize) -> Result<(), EncodingError> {
    if expected != got {
        return Err(EncodingError::LengthMismatch {
            ty: ty.to_string(),
            expected,
            got,
        });
    }
    Ok(())
}

fn mismatch(ty: &AbiType, value: &AbiValue) -> EncodingError {
    EncodingError::TypeMismatch {
        ty: ty.to_string(),
        value: value.to_string(),
    }
}
