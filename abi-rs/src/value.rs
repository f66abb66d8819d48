use crate::error::EncodingError;
use crate::types::AbiType;
use crate::word::{decode_hex, encode_hex};
use ethers::types::{Address, I256, U256};
use serde_json::Value;
use std::fmt;

/// A typed ABI value.
///
/// `FixedBytes` holds exactly the declared number of bytes, both as encoder
/// input and as decoder output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Bool(bool),
    Uint(U256),
    Int(I256),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<AbiValue>),
}

impl AbiValue {
    /// Convert a JSON argument into a value of type `ty`.
    ///
    /// Integers accept JSON numbers, decimal strings and `0x` hex strings;
    /// addresses and byte types accept `0x` hex strings.
    pub fn from_json(ty: &AbiType, value: &Value) -> Result<Self, EncodingError> {
        let mismatch = || EncodingError::TypeMismatch {
            ty: ty.to_string(),
            value: value.to_string(),
        };

        match ty {
            AbiType::Address => {
                let bytes = hex_arg(value.as_str().ok_or_else(mismatch)?)?;
                if bytes.len() != 20 {
                    return Err(mismatch());
                }
                Ok(AbiValue::Address(Address::from_slice(&bytes)))
            }
            AbiType::Bool => match value {
                Value::Bool(b) => Ok(AbiValue::Bool(*b)),
                Value::String(s) if s == "true" => Ok(AbiValue::Bool(true)),
                Value::String(s) if s == "false" => Ok(AbiValue::Bool(false)),
                _ => Err(mismatch()),
            },
            AbiType::Uint(bits) => {
                let parsed = match value {
                    Value::Number(n) => n.as_u64().map(U256::from).ok_or_else(mismatch)?,
                    Value::String(s) => parse_uint(s, *bits).ok_or_else(mismatch)??,
                    _ => return Err(mismatch()),
                };
                Ok(AbiValue::Uint(parsed))
            }
            AbiType::Int(bits) => {
                let parsed = match value {
                    Value::Number(n) => n.as_i64().map(I256::from).ok_or_else(mismatch)?,
                    Value::String(s) => parse_int(s, *bits).ok_or_else(mismatch)??,
                    _ => return Err(mismatch()),
                };
                Ok(AbiValue::Int(parsed))
            }
            AbiType::FixedBytes(_) => Ok(AbiValue::FixedBytes(hex_arg(
                value.as_str().ok_or_else(mismatch)?,
            )?)),
            AbiType::Bytes => Ok(AbiValue::Bytes(hex_arg(
                value.as_str().ok_or_else(mismatch)?,
            )?)),
            AbiType::String => Ok(AbiValue::String(
                value.as_str().ok_or_else(mismatch)?.to_string(),
            )),
            AbiType::Array(inner) | AbiType::FixedArray(inner, _) => {
                let items = value.as_array().ok_or_else(mismatch)?;
                items
                    .iter()
                    .map(|item| AbiValue::from_json(inner, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(AbiValue::Array)
            }
        }
    }

    /// Integers as decimal strings, addresses and bytes as `0x` hex.
    pub fn to_json(&self) -> Value {
        match self {
            AbiValue::Address(addr) => Value::String(encode_hex(addr.as_bytes())),
            AbiValue::Bool(b) => Value::Bool(*b),
            AbiValue::Uint(v) => Value::String(v.to_string()),
            AbiValue::Int(v) => Value::String(v.to_string()),
            AbiValue::FixedBytes(b) | AbiValue::Bytes(b) => Value::String(encode_hex(b)),
            AbiValue::String(s) => Value::String(s.clone()),
            AbiValue::Array(items) => Value::Array(items.iter().map(AbiValue::to_json).collect()),
        }
    }

    /// Convert a JSON array of call arguments against declared types.
    pub fn from_json_args(types: &[AbiType], args: &Value) -> Result<Vec<Self>, EncodingError> {
        let items = match args {
            Value::Array(items) => items.as_slice(),
            Value::Null => &[],
            other => {
                return Err(EncodingError::TypeMismatch {
                    ty: "argument array".to_string(),
                    value: other.to_string(),
                })
            }
        };
        if items.len() != types.len() {
            return Err(EncodingError::ArgumentCount {
                expected: types.len(),
                got: items.len(),
            });
        }
        types
            .iter()
            .zip(items)
            .map(|(ty, item)| AbiValue::from_json(ty, item))
            .collect()
    }
}

impl fmt::Display for AbiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

fn hex_arg(s: &str) -> Result<Vec<u8>, EncodingError> {
    decode_hex(s).map_err(|e| EncodingError::InvalidHex(format!("{s}: {e}")))
}

// `None` means the string is not a number at all; `Some(Err)` means it is
// one but does not fit.
fn parse_uint(s: &str, bits: usize) -> Option<Result<U256, EncodingError>> {
    let overflow = || EncodingError::Overflow {
        ty: format!("uint{bits}"),
        value: s.to_string(),
    };
    if let Some(digits) = s.strip_prefix("0x") {
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        return Some(U256::from_str_radix(digits, 16).map_err(|_| overflow()));
    }
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(U256::from_dec_str(s).map_err(|_| overflow()))
}

fn parse_int(s: &str, bits: usize) -> Option<Result<I256, EncodingError>> {
    let overflow = || EncodingError::Overflow {
        ty: format!("int{bits}"),
        value: s.to_string(),
    };
    if s.starts_with("0x") {
        let magnitude = match parse_uint(s, 256)? {
            Ok(v) => v,
            Err(_) => return Some(Err(overflow())),
        };
        return Some(I256::try_from(magnitude).map_err(|_| overflow()));
    }
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(I256::from_dec_str(s).map_err(|_| overflow()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ADDR: &str = "0x1111111111111111111111111111111111111111";

    #[test]
    fn converts_scalars() {
        assert_eq!(
            AbiValue::from_json(&AbiType::Uint(256), &json!("1000000000000000000")).unwrap(),
            AbiValue::Uint(U256::exp10(18))
        );
        assert_eq!(
            AbiValue::from_json(&AbiType::Uint(8), &json!(7)).unwrap(),
            AbiValue::Uint(U256::from(7u64))
        );
        assert_eq!(
            AbiValue::from_json(&AbiType::Uint(256), &json!("0xff")).unwrap(),
            AbiValue::Uint(U256::from(255u64))
        );
        assert_eq!(
            AbiValue::from_json(&AbiType::Int(64), &json!("-42")).unwrap(),
            AbiValue::Int(I256::from(-42i64))
        );
        assert_eq!(
            AbiValue::from_json(&AbiType::Int(64), &json!(-5)).unwrap(),
            AbiValue::Int(I256::from(-5i64))
        );
        assert_eq!(
            AbiValue::from_json(&AbiType::Bool, &json!(true)).unwrap(),
            AbiValue::Bool(true)
        );
        assert_eq!(
            AbiValue::from_json(&AbiType::Address, &json!(ADDR)).unwrap(),
            AbiValue::Address(ADDR.parse().unwrap())
        );
    }

    #[test]
    fn rejects_wrong_kinds() {
        assert!(matches!(
            AbiValue::from_json(&AbiType::Uint(256), &json!(-1)),
            Err(EncodingError::TypeMismatch { .. })
        ));
        assert!(matches!(
            AbiValue::from_json(&AbiType::Uint(256), &json!("12abc")),
            Err(EncodingError::TypeMismatch { .. })
        ));
        assert!(matches!(
            AbiValue::from_json(&AbiType::Address, &json!("0x1234")),
            Err(EncodingError::TypeMismatch { .. })
        ));
        assert!(matches!(
            AbiValue::from_json(&AbiType::Bytes, &json!("0xzz")),
            Err(EncodingError::InvalidHex(_))
        ));
        assert!(matches!(
            AbiValue::from_json(&AbiType::String, &json!(1)),
            Err(EncodingError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn oversized_decimal_is_overflow() {
        let too_big = format!("1{}", "0".repeat(80));
        assert!(matches!(
            AbiValue::from_json(&AbiType::Uint(256), &json!(too_big)),
            Err(EncodingError::Overflow { .. })
        ));
    }

    #[test]
    fn converts_arrays() {
        let ty: AbiType = "address[]".parse().unwrap();
        let value = AbiValue::from_json(&ty, &json!([ADDR, ADDR])).unwrap();
        assert_eq!(
            value,
            AbiValue::Array(vec![
                AbiValue::Address(ADDR.parse().unwrap()),
                AbiValue::Address(ADDR.parse().unwrap()),
            ])
        );
    }

    #[test]
    fn renders_json() {
        let value = AbiValue::Array(vec![
            AbiValue::Uint(U256::from(10u64)),
            AbiValue::Int(I256::from(-3i64)),
            AbiValue::Bytes(vec![0xAB]),
            AbiValue::Bool(false),
        ]);
        assert_eq!(value.to_json(), json!(["10", "-3", "0xab", false]));
        assert_eq!(
            AbiValue::Address(ADDR.parse().unwrap()).to_json(),
            json!(ADDR)
        );
    }

    #[test]
    fn argument_count_is_checked() {
        let types = vec![AbiType::Address, AbiType::Uint(256)];
        let err = AbiValue::from_json_args(&types, &json!([ADDR])).unwrap_err();
        assert_eq!(err, EncodingError::ArgumentCount { expected: 2, got: 1 });
        assert!(AbiValue::from_json_args(&[], &Value::Null).unwrap().is_empty());
    }
}
