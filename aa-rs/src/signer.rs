use crate::error::UserOpError;
use crate::types::UserOperation;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, Signature, H256};
use std::str::FromStr;

/// Owner key for a `SimpleAccount`-style smart account.
pub fn wallet_from_private_key(private_key: &str) -> Result<LocalWallet, UserOpError> {
    LocalWallet::from_str(private_key.trim()).map_err(|e| UserOpError::InvalidField {
        field: "privateKey".into(),
        reason: e.to_string(),
    })
}

/// Sign the userOp hash and return a new operation carrying the signature.
///
/// The hash is signed as an EIP-191 personal message, which is what
/// `SimpleAccount._validateSignature` recovers against.
pub async fn sign_user_operation(
    op: &UserOperation,
    entry_point: Address,
    chain_id: u64,
    wallet: &LocalWallet,
) -> Result<(UserOperation, H256), UserOpError> {
    let user_op_hash = op.hash(entry_point, chain_id);

    let sig = wallet
        .sign_message(user_op_hash.as_bytes())
        .await
        .map_err(|e| UserOpError::Signing(e.to_string()))?;

    tracing::debug!(
        signer = ?wallet.address(),
        user_op_hash = ?user_op_hash,
        "signed user operation"
    );

    Ok((op.with_signature(Bytes::from(sig.to_vec())), user_op_hash))
}

/// Address that produced `op.signature` over the userOp hash.
pub fn recover_signer(
    op: &UserOperation,
    entry_point: Address,
    chain_id: u64,
) -> Result<Address, UserOpError> {
    let sig = Signature::try_from(&op.signature[..])
        .map_err(|e| UserOpError::InvalidSignature(e.to_string()))?;
    let user_op_hash = op.hash(entry_point, chain_id);
    sig.recover(user_op_hash.as_bytes())
        .map_err(|e| UserOpError::InvalidSignature(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::{U128, U256};

    // anvil's first dev account
    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const OWNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn op() -> UserOperation {
        UserOperation {
            sender: Address::repeat_byte(0x42),
            nonce: U256::from(7u64),
            call_data: Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
            call_gas_limit: U128::from(80_000u64),
            verification_gas_limit: U128::from(150_000u64),
            pre_verification_gas: U256::from(45_000u64),
            max_fee_per_gas: U128::from(3_000_000_000u64),
            max_priority_fee_per_gas: U128::from(1_500_000_000u64),
            ..Default::default()
        }
    }

    fn entry_point() -> Address {
        "0x0000000071727De22E5E9d8BAf0edAc6f37da032".parse().unwrap()
    }

    #[test]
    fn wallet_parses_hex_key() {
        let wallet = wallet_from_private_key(KEY).unwrap();
        assert_eq!(wallet.address(), OWNER.parse::<Address>().unwrap());
        assert!(wallet_from_private_key("0x1234").is_err());
    }

    #[tokio::test]
    async fn signature_recovers_to_owner() {
        let wallet = wallet_from_private_key(KEY).unwrap();
        let unsigned = op();

        let (signed, hash) = sign_user_operation(&unsigned, entry_point(), 8453, &wallet)
            .await
            .unwrap();

        assert!(unsigned.signature.is_empty());
        assert_eq!(signed.signature.len(), 65);
        assert_eq!(hash, unsigned.hash(entry_point(), 8453));
        assert_eq!(signed.hash(entry_point(), 8453), hash);
        assert_eq!(
            recover_signer(&signed, entry_point(), 8453).unwrap(),
            wallet.address()
        );
    }

    #[tokio::test]
    async fn recovery_under_other_chain_differs() {
        let wallet = wallet_from_private_key(KEY).unwrap();
        let (signed, _) = sign_user_operation(&op(), entry_point(), 1, &wallet)
            .await
            .unwrap();
        let other = recover_signer(&signed, entry_point(), 10).unwrap();
        assert_ne!(other, wallet.address());
    }

    #[test]
    fn malformed_signature_is_rejected() {
        let bad = op().with_signature(Bytes::from(vec![1u8; 12]));
        assert!(matches!(
            recover_signer(&bad, entry_point(), 1),
            Err(UserOpError::InvalidSignature(_))
        ));
    }
}
