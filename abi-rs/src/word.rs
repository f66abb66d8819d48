//! Fixed 32-byte word primitives.
//!
//! Decoders return `None` for words that are not the canonical encoding of
//! the requested type; callers attach the parameter path and offset.

use crate::error::{DecodingError, EncodingError};
use ethers::types::{Address, I256, U256};

pub const WORD_SIZE: usize = 32;

/// One ABI word.
pub type Word = [u8; WORD_SIZE];

/// Parse `0x`-prefixed (or bare) hex, either case.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, DecodingError> {
    let s = s.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(s).map_err(|e| DecodingError::InvalidHex(format!("{e}")))
}

/// `0x` + lowercase hex.
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Round `len` up to a whole number of words.
pub fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD_SIZE) * WORD_SIZE
}

pub fn uint256_word(value: U256) -> Word {
    let mut word = [0u8; WORD_SIZE];
    value.to_big_endian(&mut word);
    word
}

pub fn address_word(addr: Address) -> Word {
    let mut word = [0u8; WORD_SIZE];
    word[12..].copy_from_slice(addr.as_bytes());
    word
}

pub fn bool_word(value: bool) -> Word {
    let mut word = [0u8; WORD_SIZE];
    word[WORD_SIZE - 1] = u8::from(value);
    word
}

pub fn encode_uint(value: U256, bits: usize) -> Result<Word, EncodingError> {
    if value.bits() > bits {
        return Err(EncodingError::Overflow {
            ty: format!("uint{bits}"),
            value: value.to_string(),
        });
    }
    Ok(uint256_word(value))
}

/// Two's complement, sign-extended to 32 bytes.
pub fn encode_int(value: I256, bits: usize) -> Result<Word, EncodingError> {
    let word = uint256_word(value.into_raw());
    if !is_sign_extended(&word, bits) {
        return Err(EncodingError::Overflow {
            ty: format!("int{bits}"),
            value: value.to_string(),
        });
    }
    Ok(word)
}

/// Left-aligned, zero padded on the right. `bytes` must be exactly `size` long.
pub fn encode_fixed_bytes(bytes: &[u8], size: usize) -> Result<Word, EncodingError> {
    if bytes.len() != size || size > WORD_SIZE {
        return Err(EncodingError::LengthMismatch {
            ty: format!("bytes{size}"),
            expected: size,
            got: bytes.len(),
        });
    }
    let mut word = [0u8; WORD_SIZE];
    word[..bytes.len()].copy_from_slice(bytes);
    Ok(word)
}

pub fn decode_uint(word: &Word, bits: usize) -> Option<U256> {
    let start = WORD_SIZE - bits / 8;
    if word[..start].iter().any(|b| *b != 0) {
        return None;
    }
    Some(U256::from_big_endian(word))
}

pub fn decode_int(word: &Word, bits: usize) -> Option<I256> {
    if !is_sign_extended(word, bits) {
        return None;
    }
    Some(I256::from_raw(U256::from_big_endian(word)))
}

pub fn decode_address(word: &Word) -> Option<Address> {
    if word[..12].iter().any(|b| *b != 0) {
        return None;
    }
    Some(Address::from_slice(&word[12..]))
}

pub fn decode_bool(word: &Word) -> Option<bool> {
    if word[..WORD_SIZE - 1].iter().any(|b| *b != 0) {
        return None;
    }
    match word[WORD_SIZE - 1] {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

pub fn decode_fixed_bytes(word: &Word, size: usize) -> Option<Vec<u8>> {
    if word[size..].iter().any(|b| *b != 0) {
        return None;
    }
    Some(word[..size].to_vec())
}

/// The word starting at `offset`, if the buffer holds all 32 bytes.
pub fn read_word(data: &[u8], offset: usize) -> Option<Word> {
    let end = offset.checked_add(WORD_SIZE)?;
    let mut word = [0u8; WORD_SIZE];
    word.copy_from_slice(data.get(offset..end)?);
    Some(word)
}

// Bits above `bits - 1` must all repeat the sign bit.
fn is_sign_extended(word: &Word, bits: usize) -> bool {
    let start = WORD_SIZE - bits / 8;
    if start == 0 {
        return true;
    }
    let fill = if word[start] & 0x80 != 0 { 0xff } else { 0x00 };
    word[..start].iter().all(|b| *b == fill)
}
