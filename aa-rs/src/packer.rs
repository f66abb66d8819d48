//! UserOperation packing and `getUserOpHash` reproduction (EntryPoint v0.7).

use crate::error::UserOpError;
use crate::types::{PackedUserOperation, UserOperation};
use callkit_abi::word::{address_word, uint256_word, Word};
use ethers::types::{Address, Bytes, H256, U128, U256};
use ethers::utils::keccak256;

const ADDRESS_LEN: usize = 20;
const GAS_LEN: usize = 16;
const PAYMASTER_FIELDS_LEN: usize = ADDRESS_LEN + 2 * GAS_LEN;

pub fn pack(op: &UserOperation) -> PackedUserOperation {
    let paymaster_and_data = match op.paymaster {
        Some(paymaster) => {
            let mut v = Vec::with_capacity(PAYMASTER_FIELDS_LEN + op.paymaster_data.len());
            v.extend_from_slice(paymaster.as_bytes());
            v.extend_from_slice(&u128_bytes(op.paymaster_verification_gas_limit));
            v.extend_from_slice(&u128_bytes(op.paymaster_post_op_gas_limit));
            v.extend_from_slice(&op.paymaster_data);
            Bytes::from(v)
        }
        None => Bytes::new(),
    };

    PackedUserOperation {
        sender: op.sender,
        nonce: op.nonce,
        init_code: op.init_code(),
        call_data: op.call_data.clone(),
        account_gas_limits: concat_128(op.verification_gas_limit, op.call_gas_limit),
        pre_verification_gas: op.pre_verification_gas,
        gas_fees: concat_128(op.max_priority_fee_per_gas, op.max_fee_per_gas),
        paymaster_and_data,
        signature: op.signature.clone(),
    }
}

/// `keccak256(abi.encode(keccak256(abi.encode(inner)), entryPoint, chainId))`
///
/// `inner` is the packed struct without its signature, with `initCode`,
/// `callData` and `paymasterAndData` replaced by their keccak256 digests.
pub fn hash(packed: &PackedUserOperation, entry_point: Address, chain_id: u64) -> H256 {
    let inner: [Word; 8] = [
        address_word(packed.sender),
        uint256_word(packed.nonce),
        keccak256(&packed.init_code),
        keccak256(&packed.call_data),
        packed.account_gas_limits.0,
        uint256_word(packed.pre_verification_gas),
        packed.gas_fees.0,
        keccak256(&packed.paymaster_and_data),
    ];
    let inner_hash = keccak256(inner.concat());

    let outer: [Word; 3] = [
        inner_hash,
        address_word(entry_point),
        uint256_word(U256::from(chain_id)),
    ];
    let hash = H256(keccak256(outer.concat()));

    tracing::debug!(
        sender = ?packed.sender,
        nonce = %packed.nonce,
        ?entry_point,
        chain_id,
        user_op_hash = ?hash,
        "computed userOpHash"
    );
    hash
}

pub fn user_op_hash(op: &UserOperation, entry_point: Address, chain_id: u64) -> H256 {
    hash(&pack(op), entry_point, chain_id)
}

impl PackedUserOperation {
    /// Inverse of [`pack`].
    pub fn unpack(&self) -> Result<UserOperation, UserOpError> {
        let (factory, factory_data) = match self.init_code.len() {
            0 => (None, Bytes::new()),
            n if n < ADDRESS_LEN => {
                return Err(UserOpError::InvalidPackedField {
                    field: "initCode",
                    reason: format!("{n} bytes is shorter than a factory address"),
                })
            }
            _ => (
                Some(Address::from_slice(&self.init_code[..ADDRESS_LEN])),
                Bytes::from(self.init_code[ADDRESS_LEN..].to_vec()),
            ),
        };

        let pm = &self.paymaster_and_data;
        let (paymaster, pm_verification, pm_post_op, paymaster_data) = match pm.len() {
            0 => (None, U128::zero(), U128::zero(), Bytes::new()),
            n if n < PAYMASTER_FIELDS_LEN => {
                return Err(UserOpError::InvalidPackedField {
                    field: "paymasterAndData",
                    reason: format!("{n} bytes is shorter than {PAYMASTER_FIELDS_LEN}"),
                })
            }
            _ => (
                Some(Address::from_slice(&pm[..ADDRESS_LEN])),
                U128::from_big_endian(&pm[ADDRESS_LEN..ADDRESS_LEN + GAS_LEN]),
                U128::from_big_endian(&pm[ADDRESS_LEN + GAS_LEN..PAYMASTER_FIELDS_LEN]),
                Bytes::from(pm[PAYMASTER_FIELDS_LEN..].to_vec()),
            ),
        };

        let (verification_gas_limit, call_gas_limit) = split_128(self.account_gas_limits);
        let (max_priority_fee_per_gas, max_fee_per_gas) = split_128(self.gas_fees);

        Ok(UserOperation {
            sender: self.sender,
            nonce: self.nonce,
            factory,
            factory_data,
            call_data: self.call_data.clone(),
            call_gas_limit,
            verification_gas_limit,
            pre_verification_gas: self.pre_verification_gas,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            paymaster,
            paymaster_verification_gas_limit: pm_verification,
            paymaster_post_op_gas_limit: pm_post_op,
            paymaster_data,
            signature: self.signature.clone(),
        })
    }
}

fn u128_bytes(v: U128) -> [u8; GAS_LEN] {
    let mut out = [0u8; GAS_LEN];
    v.to_big_endian(&mut out);
    out
}

fn concat_128(high: U128, low: U128) -> H256 {
    let mut word = [0u8; 32];
    word[..GAS_LEN].copy_from_slice(&u128_bytes(high));
    word[GAS_LEN..].copy_from_slice(&u128_bytes(low));
    H256(word)
}

fn split_128(word: H256) -> (U128, U128) {
    (
        U128::from_big_endian(&word.0[..GAS_LEN]),
        U128::from_big_endian(&word.0[GAS_LEN..]),
    )
}
