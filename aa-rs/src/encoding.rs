use crate::error::UserOpError;
use crate::types::{PackedUserOperation, UserOperation};
use ethers::types::{Address, Bytes, H256, U128, U256};
use serde_json::{Map, Value};

pub fn fmt_address(addr: Address) -> String {
    format!("0x{}", hex::encode(addr.as_bytes()))
}

pub fn fmt_h256(h: H256) -> String {
    format!("0x{}", hex::encode(h.as_bytes()))
}

/// JSON-RPC "quantity" encoding.
pub fn fmt_u256(v: U256) -> String {
    if v.is_zero() {
        "0x0".to_string()
    } else {
        format!("0x{:x}", v)
    }
}

pub fn fmt_u128(v: U128) -> String {
    fmt_u256(U256::from(v.as_u128()))
}

pub fn fmt_bytes(b: &Bytes) -> String {
    format!("0x{}", hex::encode(b.as_ref()))
}

/// ERC-4337 v0.7 RPC shape. Factory and paymaster keys are left out when
/// the operation has none, as bundlers expect.
pub fn user_op_to_json(op: &UserOperation) -> Value {
    let mut out = Map::new();
    out.insert("sender".into(), fmt_address(op.sender).into());
    out.insert("nonce".into(), fmt_u256(op.nonce).into());
    if let Some(factory) = op.factory {
        out.insert("factory".into(), fmt_address(factory).into());
        out.insert("factoryData".into(), fmt_bytes(&op.factory_data).into());
    }
    out.insert("callData".into(), fmt_bytes(&op.call_data).into());
    out.insert("callGasLimit".into(), fmt_u128(op.call_gas_limit).into());
    out.insert(
        "verificationGasLimit".into(),
        fmt_u128(op.verification_gas_limit).into(),
    );
    out.insert(
        "preVerificationGas".into(),
        fmt_u256(op.pre_verification_gas).into(),
    );
    out.insert("maxFeePerGas".into(), fmt_u128(op.max_fee_per_gas).into());
    out.insert(
        "maxPriorityFeePerGas".into(),
        fmt_u128(op.max_priority_fee_per_gas).into(),
    );
    if let Some(paymaster) = op.paymaster {
        out.insert("paymaster".into(), fmt_address(paymaster).into());
        out.insert(
            "paymasterVerificationGasLimit".into(),
            fmt_u128(op.paymaster_verification_gas_limit).into(),
        );
        out.insert(
            "paymasterPostOpGasLimit".into(),
            fmt_u128(op.paymaster_post_op_gas_limit).into(),
        );
        out.insert("paymasterData".into(), fmt_bytes(&op.paymaster_data).into());
    }
    out.insert("signature".into(), fmt_bytes(&op.signature).into());
    Value::Object(out)
}

pub fn packed_user_op_to_json(op: &PackedUserOperation) -> Value {
    serde_json::json!({
        "sender": fmt_address(op.sender),
        "nonce": fmt_u256(op.nonce),
        "initCode": fmt_bytes(&op.init_code),
        "callData": fmt_bytes(&op.call_data),
        "accountGasLimits": fmt_h256(op.account_gas_limits),
        "preVerificationGas": fmt_u256(op.pre_verification_gas),
        "gasFees": fmt_h256(op.gas_fees),
        "paymasterAndData": fmt_bytes(&op.paymaster_and_data),
        "signature": fmt_bytes(&op.signature),
    })
}

/// `0x` hex or plain decimal. An empty string or bare `0x` is zero.
pub fn parse_u256_quantity(field: &str, s: &str) -> Result<U256, UserOpError> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some("") => Ok(U256::zero()),
        Some(hex) => U256::from_str_radix(hex, 16).map_err(|e| e.to_string()),
        None if s.is_empty() => Ok(U256::zero()),
        None => U256::from_dec_str(s).map_err(|e| e.to_string()),
    };
    parsed.map_err(|reason| UserOpError::InvalidField {
        field: field.to_string(),
        reason: format!("{s:?} is not a quantity: {reason}"),
    })
}

/// Gas limits and fee caps occupy 16 bytes in the packed form.
pub fn parse_u128_quantity(field: &str, s: &str) -> Result<U128, UserOpError> {
    let v = parse_u256_quantity(field, s)?;
    if v.bits() > 128 {
        return Err(UserOpError::Overflow {
            field: field.to_string(),
            value: v.to_string(),
            bits: 128,
        });
    }
    Ok(U128::from(v.as_u128()))
}

pub fn parse_address(field: &str, s: &str) -> Result<Address, UserOpError> {
    let bytes = parse_hex(field, s)?;
    if bytes.len() != 20 {
        return Err(UserOpError::InvalidField {
            field: field.to_string(),
            reason: format!("expected 20-byte address, got {} bytes", bytes.len()),
        });
    }
    Ok(Address::from_slice(&bytes))
}

pub fn parse_bytes(field: &str, s: &str) -> Result<Bytes, UserOpError> {
    parse_hex(field, s).map(Bytes::from)
}

fn parse_hex(field: &str, s: &str) -> Result<Vec<u8>, UserOpError> {
    callkit_abi::decode_hex(s.trim()).map_err(|e| UserOpError::InvalidHex {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantities_accept_hex_and_decimal() {
        assert_eq!(parse_u256_quantity("nonce", "0x1f").unwrap(), U256::from(31u64));
        assert_eq!(parse_u256_quantity("nonce", "31").unwrap(), U256::from(31u64));
        assert_eq!(parse_u256_quantity("nonce", "0x").unwrap(), U256::zero());
        assert!(matches!(
            parse_u256_quantity("nonce", "0xzz"),
            Err(UserOpError::InvalidField { .. })
        ));
        assert!(parse_u256_quantity("nonce", "1.5").is_err());
    }

    #[test]
    fn gas_fields_are_bounded_to_128_bits() {
        let max = format!("0x{}", "ff".repeat(16));
        assert_eq!(parse_u128_quantity("callGasLimit", &max).unwrap(), U128::MAX);

        let over = format!("0x1{}", "00".repeat(16));
        assert_eq!(
            parse_u128_quantity("callGasLimit", &over),
            Err(UserOpError::Overflow {
                field: "callGasLimit".into(),
                value: (U256::one() << 128).to_string(),
                bits: 128,
            })
        );
    }

    #[test]
    fn addresses_check_length() {
        let addr = parse_address("sender", "0x00000000000000000000000000000000000000aA").unwrap();
        assert_eq!(fmt_address(addr), "0x00000000000000000000000000000000000000aa");
        assert!(parse_address("sender", "0x1234").is_err());
        assert!(matches!(
            parse_address("sender", "0xgg"),
            Err(UserOpError::InvalidHex { .. })
        ));
    }

    #[test]
    fn quantity_format() {
        assert_eq!(fmt_u256(U256::zero()), "0x0");
        assert_eq!(fmt_u128(U128::from(255u64)), "0xff");
        assert_eq!(fmt_bytes(&Bytes::new()), "0x");
    }

    #[test]
    fn rpc_json_omits_unset_factory_and_paymaster() {
        let op = UserOperation {
            sender: Address::repeat_byte(0x01),
            nonce: U256::from(1u64),
            ..Default::default()
        };
        let json = user_op_to_json(&op);
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("factory"));
        assert!(!obj.contains_key("paymaster"));
        assert_eq!(json["nonce"], "0x1");
        assert_eq!(json["signature"], "0x");

        let sponsored = UserOperation {
            paymaster: Some(Address::repeat_byte(0x02)),
            paymaster_post_op_gas_limit: U128::from(16u64),
            ..op
        };
        let json = user_op_to_json(&sponsored);
        assert_eq!(json["paymaster"], fmt_address(Address::repeat_byte(0x02)));
        assert_eq!(json["paymasterPostOpGasLimit"], "0x10");
        assert_eq!(json["paymasterData"], "0x");
    }

    #[test]
    fn packed_json_renders_words() {
        let op = UserOperation {
            call_gas_limit: U128::from(1u64),
            max_fee_per_gas: U128::from(2u64),
            ..Default::default()
        };
        let json = packed_user_op_to_json(&op.pack());
        assert_eq!(
            json["accountGasLimits"],
            format!("0x{}01", "00".repeat(31))
        );
        assert_eq!(json["gasFees"], format!("0x{}02", "00".repeat(31)));
        assert_eq!(json["paymasterAndData"], "0x");
    }
}
