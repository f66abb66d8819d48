//! JSON ABI model (`[{ "type": "function", "name": ..., "inputs": [...] }]`).

use crate::error::AbiError;
use crate::types::{selector, AbiParameter, AbiType, FunctionSignature};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<RawAbiParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_type: Option<String>,
}

impl RawAbiParam {
    /// Canonical type text as used in selectors. Tuples expand to
    /// `(t1,t2)` so entries the codec cannot encode still hash correctly.
    pub fn canonical_type(&self) -> String {
        if let Some(suffix) = self.kind.strip_prefix("tuple") {
            let inner: Vec<String> = self.components.iter().map(Self::canonical_type).collect();
            return format!("({}){}", inner.join(","), suffix);
        }
        match self.kind.parse::<AbiType>() {
            Ok(ty) => ty.to_string(),
            Err(_) => self.kind.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAbiEntry {
    // Solidity allows `type` to be omitted for functions.
    #[serde(rename = "type", default = "default_entry_type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<RawAbiParam>,
    #[serde(default)]
    pub outputs: Vec<RawAbiParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<String>,
}

fn default_entry_type() -> String {
    "function".to_string()
}

impl RawAbiEntry {
    pub fn is_function(&self) -> bool {
        self.kind == "function"
    }

    /// `name(type1,...)`; parameter names are ignored.
    pub fn canonical_signature(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(RawAbiParam::canonical_type).collect();
        format!("{}({})", self.name, types.join(","))
    }

    pub fn selector(&self) -> [u8; 4] {
        selector(&self.canonical_signature())
    }

    /// Typed signature; fails with `UnsupportedType` on tuples and other
    /// types the codec does not implement.
    pub fn to_signature(&self) -> Result<FunctionSignature, AbiError> {
        Ok(FunctionSignature {
            name: self.name.clone(),
            inputs: to_parameters(&self.inputs)?,
            outputs: to_parameters(&self.outputs)?,
        })
    }
}

fn to_parameters(raw: &[RawAbiParam]) -> Result<Vec<AbiParameter>, AbiError> {
    raw.iter()
        .enumerate()
        .map(|(index, p)| {
            Ok(AbiParameter {
                name: p.name.clone(),
                kind: p.kind.parse()?,
                index,
            })
        })
        .collect()
}

/// A parsed JSON ABI, entries kept in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Abi {
    entries: Vec<RawAbiEntry>,
}

impl Abi {
    pub fn new(entries: Vec<RawAbiEntry>) -> Self {
        Self { entries }
    }

    /// Accepts a bare ABI array or a build artifact object with an `abi` field.
    pub fn from_json(s: &str) -> Result<Self, AbiError> {
        let value: Value =
            serde_json::from_str(s).map_err(|e| AbiError::InvalidAbi(e.to_string()))?;
        let array = match value {
            Value::Object(mut obj) => obj
                .remove("abi")
                .ok_or_else(|| AbiError::InvalidAbi("expected an array or an `abi` field".into()))?,
            other => other,
        };
        let entries: Vec<RawAbiEntry> =
            serde_json::from_value(array).map_err(|e| AbiError::InvalidAbi(e.to_string()))?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RawAbiEntry] {
        &self.entries
    }

    pub fn functions(&self) -> impl Iterator<Item = &RawAbiEntry> {
        self.entries.iter().filter(|e| e.is_function())
    }

    /// First function (in ABI order) named `name`. A full signature such as
    /// `transfer(address,uint256)` selects a specific overload.
    pub fn function(&self, name: &str) -> Result<FunctionSignature, AbiError> {
        let name = name.trim();
        let entry = if name.contains('(') {
            let wanted = FunctionSignature::parse(name)?.canonical();
            self.functions().find(|e| e.canonical_signature() == wanted)
        } else {
            self.functions().find(|e| e.name == name)
        };
        entry
            .ok_or_else(|| AbiError::FunctionNotFound(name.to_string()))?
            .to_signature()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERC20_ABI: &str = r#"[
        {"type":"function","name":"transfer","stateMutability":"nonpayable",
         "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
         "outputs":[{"name":"","type":"bool"}]},
        {"type":"event","name":"Transfer","inputs":[
         {"name":"from","type":"address","indexed":true},
         {"name":"to","type":"address","indexed":true},
         {"name":"value","type":"uint256","indexed":false}]},
        {"name":"balanceOf","stateMutability":"view",
         "inputs":[{"name":"owner","type":"address"}],
         "outputs":[{"name":"","type":"uint"}]}
    ]"#;

    #[test]
    fn parses_array_and_defaults_type() {
        let abi = Abi::from_json(ERC20_ABI).unwrap();
        assert_eq!(abi.entries().len(), 3);
        assert_eq!(abi.functions().count(), 2);

        let balance_of = abi.function("balanceOf").unwrap();
        assert_eq!(balance_of.canonical(), "balanceOf(address)");
        assert_eq!(balance_of.outputs[0].kind, AbiType::Uint(256));
    }

    #[test]
    fn parses_artifact_object() {
        let artifact = format!(r#"{{"contractName":"Token","abi":{ERC20_ABI}}}"#);
        let abi = Abi::from_json(&artifact).unwrap();
        assert_eq!(abi.functions().count(), 2);
        assert!(Abi::from_json(r#"{"bytecode":"0x"}"#).is_err());
        assert!(Abi::from_json("not json").is_err());
    }

    #[test]
    fn tuple_signature_expands_components() {
        let entry: RawAbiEntry = serde_json::from_str(
            r#"{"type":"function","name":"handleOps","inputs":[
                {"name":"ops","type":"tuple[]","components":[
                    {"name":"sender","type":"address"},
                    {"name":"nonce","type":"uint256"}]},
                {"name":"beneficiary","type":"address"}]}"#,
        )
        .unwrap();
        assert_eq!(entry.canonical_signature(), "handleOps((address,uint256)[],address)");
        assert_eq!(
            entry.to_signature(),
            Err(AbiError::UnsupportedType("tuple[]".into()))
        );
    }

    #[test]
    fn function_by_signature_picks_overload() {
        let abi = Abi::from_json(
            r#"[
                {"type":"function","name":"safeTransferFrom","inputs":[
                    {"name":"from","type":"address"},{"name":"to","type":"address"},
                    {"name":"id","type":"uint256"}]},
                {"type":"function","name":"safeTransferFrom","inputs":[
                    {"name":"from","type":"address"},{"name":"to","type":"address"},
                    {"name":"id","type":"uint256"},{"name":"data","type":"bytes"}]}
            ]"#,
        )
        .unwrap();
        assert_eq!(abi.function("safeTransferFrom").unwrap().inputs.len(), 3);
        assert_eq!(
            abi.function("safeTransferFrom(address,address,uint256,bytes)")
                .unwrap()
                .inputs
                .len(),
            4
        );
        assert!(matches!(
            abi.function("mint"),
            Err(AbiError::FunctionNotFound(_))
        ));
    }
}
