//! Solidity ABI call data codec.
//!
//! Encodes function calls against a JSON ABI, decodes call data and return
//! data back into named values, and resolves which function a call data blob
//! targets by its selector. Everything here is pure and synchronous.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod json;
pub mod resolver;
pub mod types;
pub mod value;
pub mod word;

pub use decoder::{decode_call, decode_output, decode_params, DecodedParams};
pub use encoder::{encode_call, encode_params};
pub use error::{AbiError, DecodingError, EncodingError};
pub use json::{Abi, RawAbiEntry, RawAbiParam};
pub use resolver::{decode_with_abi, find_function, resolve, resolve_hex};
pub use types::{parameters, selector, AbiParameter, AbiType, FunctionSignature};
pub use value::AbiValue;
pub use word::{decode_hex, encode_hex, Word};
