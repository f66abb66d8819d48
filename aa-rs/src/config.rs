use crate::encoding::{
    parse_address, parse_bytes, parse_u128_quantity, parse_u256_quantity,
};
use crate::error::UserOpError;
use crate::types::UserOperation;
use anyhow::{anyhow, Context, Result};
use ethers::types::{Address, Bytes, U128};
use serde::Deserialize;
use std::{fs, path::Path};

/// Operation file as written by hand or by another tool. Every value is a
/// string so quantities can be given in hex or decimal.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationRaw {
    pub sender: Option<String>,
    pub nonce: Option<String>,
    #[serde(default)]
    pub factory: Option<String>,
    #[serde(default)]
    pub factory_data: Option<String>,
    pub call_data: Option<String>,
    pub call_gas_limit: Option<String>,
    pub verification_gas_limit: Option<String>,
    pub pre_verification_gas: Option<String>,
    pub max_fee_per_gas: Option<String>,
    pub max_priority_fee_per_gas: Option<String>,
    #[serde(default)]
    pub paymaster: Option<String>,
    #[serde(default)]
    pub paymaster_verification_gas_limit: Option<String>,
    #[serde(default)]
    pub paymaster_post_op_gas_limit: Option<String>,
    #[serde(default)]
    pub paymaster_data: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,

    #[serde(default)]
    pub entry_point: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct OperationFile {
    pub entry_point: Option<Address>,
    pub chain_id: Option<u64>,
    pub op: UserOperation,
}

/// Where the hash is bound: which EntryPoint on which chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashTarget {
    pub entry_point: Address,
    pub chain_id: u64,
}

pub fn load_operation(path: &Path) -> Result<OperationFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read operation json at {}", path.display()))?;
    let raw: UserOperationRaw = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse operation json at {}", path.display()))?;
    raw.into_operation_file()
        .with_context(|| format!("invalid user operation in {}", path.display()))
}

impl UserOperationRaw {
    pub fn into_operation_file(self) -> Result<OperationFile, UserOpError> {
        let entry_point = opt(&self.entry_point)
            .map(|s| parse_address("entryPoint", s))
            .transpose()?;
        let chain_id = self.chain_id;
        Ok(OperationFile {
            entry_point,
            chain_id,
            op: self.into_user_operation()?,
        })
    }

    pub fn into_user_operation(self) -> Result<UserOperation, UserOpError> {
        let factory = opt(&self.factory)
            .map(|s| parse_address("factory", s))
            .transpose()?;
        let paymaster = opt(&self.paymaster)
            .map(|s| parse_address("paymaster", s))
            .transpose()?;

        Ok(UserOperation {
            sender: parse_address("sender", required(&self.sender, "sender")?)?,
            nonce: parse_u256_quantity("nonce", required(&self.nonce, "nonce")?)?,
            factory,
            factory_data: bytes_or_empty("factoryData", &self.factory_data)?,
            call_data: parse_bytes("callData", required(&self.call_data, "callData")?)?,
            call_gas_limit: gas("callGasLimit", &self.call_gas_limit)?,
            verification_gas_limit: gas("verificationGasLimit", &self.verification_gas_limit)?,
            pre_verification_gas: parse_u256_quantity(
                "preVerificationGas",
                required(&self.pre_verification_gas, "preVerificationGas")?,
            )?,
            max_fee_per_gas: gas("maxFeePerGas", &self.max_fee_per_gas)?,
            max_priority_fee_per_gas: gas("maxPriorityFeePerGas", &self.max_priority_fee_per_gas)?,
            paymaster,
            paymaster_verification_gas_limit: opt(&self.paymaster_verification_gas_limit)
                .map(|s| parse_u128_quantity("paymasterVerificationGasLimit", s))
                .transpose()?
                .unwrap_or_default(),
            paymaster_post_op_gas_limit: opt(&self.paymaster_post_op_gas_limit)
                .map(|s| parse_u128_quantity("paymasterPostOpGasLimit", s))
                .transpose()?
                .unwrap_or_default(),
            paymaster_data: bytes_or_empty("paymasterData", &self.paymaster_data)?,
            signature: bytes_or_empty("signature", &self.signature)?,
        })
    }
}

impl OperationFile {
    /// CLI flags win over file values; both missing is an error.
    pub fn hash_target(
        &self,
        entry_point: Option<&str>,
        chain_id: Option<u64>,
    ) -> Result<HashTarget> {
        let entry_point = match entry_point {
            Some(s) => parse_address("entryPoint", s).context("invalid --entrypoint address")?,
            None => self.entry_point.ok_or_else(|| {
                anyhow!("missing entryPoint (set it in the operation file or pass --entrypoint)")
            })?,
        };
        let chain_id = chain_id.or(self.chain_id).ok_or_else(|| {
            anyhow!("missing chainId (set it in the operation file or pass --chain-id)")
        })?;
        Ok(HashTarget {
            entry_point,
            chain_id,
        })
    }
}

// Empty strings and `null` both count as "not set".
fn opt(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn required<'a>(v: &'a Option<String>, field: &'static str) -> Result<&'a str, UserOpError> {
    opt(v).ok_or(UserOpError::MissingField(field))
}

fn gas(field: &'static str, v: &Option<String>) -> Result<U128, UserOpError> {
    parse_u128_quantity(field, required(v, field)?)
}

fn bytes_or_empty(field: &str, v: &Option<String>) -> Result<Bytes, UserOpError> {
    opt(v)
        .map(|s| parse_bytes(field, s))
        .transpose()
        .map(Option::unwrap_or_default)
}
