use crate::packer;
use ethers::types::{Address, Bytes, H256, U128, U256};

/// ERC-4337 UserOperation (EntryPoint v0.7 layout).
///
/// This is the logical, unpacked form. The on-chain `PackedUserOperation` is
/// derived from it with [`UserOperation::pack`] and never stored separately.
///
/// Once a signature is attached the operation is treated as frozen: use
/// [`UserOperation::with_signature`] to get a new value instead of editing
/// fields, otherwise the signed hash and the fields drift apart.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub factory: Option<Address>,
    pub factory_data: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U128,
    pub verification_gas_limit: U128,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U128,
    pub max_priority_fee_per_gas: U128,
    pub paymaster: Option<Address>,
    pub paymaster_verification_gas_limit: U128,
    pub paymaster_post_op_gas_limit: U128,
    pub paymaster_data: Bytes,
    pub signature: Bytes,
}

impl UserOperation {
    /// `factory ‖ factoryData`, empty when the account is already deployed.
    pub fn init_code(&self) -> Bytes {
        match self.factory {
            Some(factory) => {
                let mut v = Vec::with_capacity(20 + self.factory_data.len());
                v.extend_from_slice(factory.as_bytes());
                v.extend_from_slice(&self.factory_data);
                Bytes::from(v)
            }
            None => Bytes::new(),
        }
    }

    /// A copy carrying `signature`.
    pub fn with_signature(&self, signature: Bytes) -> Self {
        Self {
            signature,
            ..self.clone()
        }
    }

    pub fn pack(&self) -> PackedUserOperation {
        packer::pack(self)
    }

    /// The hash the account signs (`EntryPoint.getUserOpHash`).
    pub fn hash(&self, entry_point: Address, chain_id: u64) -> H256 {
        packer::hash(&self.pack(), entry_point, chain_id)
    }
}

/// The compact struct `EntryPoint.handleOps` consumes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackedUserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    /// `verificationGasLimit (16 bytes) ‖ callGasLimit (16 bytes)`
    pub account_gas_limits: H256,
    pub pre_verification_gas: U256,
    /// `maxPriorityFeePerGas (16 bytes) ‖ maxFeePerGas (16 bytes)`
    pub gas_fees: H256,
    /// Empty without a paymaster.
    pub paymaster_and_data: Bytes,
    pub signature: Bytes,
}
