//! Find which ABI function a call data blob invokes.

use crate::decoder::{decode_call, DecodedParams};
use crate::error::AbiError;
use crate::json::{Abi, RawAbiEntry};
use crate::types::FunctionSignature;
use crate::word::{decode_hex, encode_hex};

/// First function entry, in ABI order, whose selector equals the first four
/// bytes of `call_data`.
pub fn find_function<'a>(abi: &'a [RawAbiEntry], call_data: &[u8]) -> Option<&'a RawAbiEntry> {
    let selector = call_data.get(..4)?;
    abi.iter()
        .filter(|entry| entry.is_function())
        .find(|entry| entry.selector()[..] == *selector)
}

/// `Ok(None)` when no entry matches; an error only when the matching entry
/// declares a type the codec does not support.
pub fn resolve(
    abi: &[RawAbiEntry],
    call_data: &[u8],
) -> Result<Option<FunctionSignature>, AbiError> {
    match find_function(abi, call_data) {
        Some(entry) => {
            tracing::debug!(
                function = %entry.canonical_signature(),
                "resolved call data selector"
            );
            entry.to_signature().map(Some)
        }
        None => {
            tracing::debug!(
                selector = %encode_hex(call_data.get(..4).unwrap_or(call_data)),
                "no ABI function matches selector"
            );
            Ok(None)
        }
    }
}

/// [`resolve`] on `0x` hex call data.
pub fn resolve_hex(
    abi: &[RawAbiEntry],
    call_data: &str,
) -> Result<Option<FunctionSignature>, AbiError> {
    resolve(abi, &decode_hex(call_data)?)
}

/// Resolve and decode in one step; an unmatched selector is `FunctionNotFound`.
pub fn decode_with_abi(
    abi: &Abi,
    call_data: &[u8],
) -> Result<(FunctionSignature, DecodedParams), AbiError> {
    let signature = resolve(abi.entries(), call_data)?.ok_or_else(|| {
        AbiError::FunctionNotFound(encode_hex(call_data.get(..4).unwrap_or(call_data)))
    })?;
    let params = decode_call(&signature, call_data)?;
    Ok((signature, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode_call;
    use crate::value::AbiValue;
    use ethers::types::{Address, U256};

    const ABI: &str = r#"[
        {"type":"constructor","inputs":[{"name":"owner","type":"address"}]},
        {"type":"function","name":"balanceOf",
         "inputs":[{"name":"owner","type":"address"}],
         "outputs":[{"name":"","type":"uint256"}]},
        {"type":"function","name":"transfer",
         "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
         "outputs":[{"name":"","type":"bool"}]},
        {"type":"function","name":"transfer",
         "inputs":[{"name":"recipient","type":"address"},{"name":"value","type":"uint256"}],
         "outputs":[]}
    ]"#;

    fn abi() -> Abi {
        Abi::from_json(ABI).unwrap()
    }

    #[test]
    fn resolves_by_selector() {
        let call = hex::decode(
            "70a08231000000000000000000000000000000000000000000000000000000000000dead",
        )
        .unwrap();
        let sig = resolve(abi().entries(), &call).unwrap().unwrap();
        assert_eq!(sig.name, "balanceOf");
    }

    #[test]
    fn hex_compare_ignores_case() {
        let sig = resolve_hex(abi().entries(), "0x70A08231").unwrap().unwrap();
        assert_eq!(sig.canonical(), "balanceOf(address)");
    }

    #[test]
    fn colliding_selectors_resolve_to_first_entry() {
        let call = hex::decode("a9059cbb").unwrap();
        let sig = resolve(abi().entries(), &call).unwrap().unwrap();
        assert_eq!(sig.inputs[0].name, "to");
        assert_eq!(sig.inputs[1].name, "amount");

        let mut reversed = abi().entries().to_vec();
        reversed.reverse();
        let sig = resolve(&reversed, &call).unwrap().unwrap();
        assert_eq!(sig.inputs[0].name, "recipient");
    }

    #[test]
    fn unknown_or_short_call_data_is_none() {
        assert_eq!(resolve(abi().entries(), &[0xde, 0xad, 0xbe, 0xef]).unwrap(), None);
        assert_eq!(resolve(abi().entries(), &[0x70, 0xa0]).unwrap(), None);
        assert!(matches!(
            resolve_hex(abi().entries(), "0xnothex"),
            Err(AbiError::Decoding(_))
        ));
    }

    #[test]
    fn non_function_entries_are_ignored() {
        // selector of the constructor's would-be signature `(address)`
        let ctor = crate::types::selector("(address)");
        assert_eq!(resolve(abi().entries(), &ctor).unwrap(), None);
    }

    #[test]
    fn unsupported_match_is_an_error() {
        let abi = Abi::from_json(
            r#"[{"type":"function","name":"submit","inputs":[
                {"name":"order","type":"tuple","components":[{"name":"id","type":"uint256"}]}]}]"#,
        )
        .unwrap();
        let call = crate::types::selector("submit((uint256))");
        assert_eq!(
            resolve(abi.entries(), &call),
            Err(AbiError::UnsupportedType("tuple".into()))
        );
    }

    #[test]
    fn decode_with_abi_round_trip() {
        let abi = abi();
        let sig = abi.function("transfer").unwrap();
        let to = Address::repeat_byte(0x11);
        let call = encode_call(
            &sig,
            &[AbiValue::Address(to), AbiValue::Uint(U256::from(250u64))],
        )
        .unwrap();

        let (resolved, params) = decode_with_abi(&abi, &call).unwrap();
        assert_eq!(resolved, sig);
        assert_eq!(params.get("to"), Some(&AbiValue::Address(to)));
        assert_eq!(params.get("amount"), Some(&AbiValue::Uint(U256::from(250u64))));

        assert_eq!(
            decode_with_abi(&abi, &[1, 2, 3, 4]).unwrap_err(),
            AbiError::FunctionNotFound("0x01020304".into())
        );
    }
}
