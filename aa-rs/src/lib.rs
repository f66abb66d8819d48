//! ERC-4337 (EntryPoint v0.7) user operations: packing, hashing and signing.

pub mod config;
pub mod encoding;
pub mod error;
pub mod packer;
pub mod signer;
pub mod types;

pub use config::{load_operation, HashTarget, OperationFile, UserOperationRaw};
pub use error::UserOpError;
pub use packer::{hash, pack, user_op_hash};
pub use signer::{recover_signer, sign_user_operation, wallet_from_private_key};
pub use types::{PackedUserOperation, UserOperation};
