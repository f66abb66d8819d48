use crate::error::AbiError;
use crate::word::WORD_SIZE;
use ethers::utils::keccak256;
use std::fmt;
use std::str::FromStr;

/// A Solidity type the codec knows how to encode.
///
/// `tuple`, `fixed`/`ufixed` and `function` are rejected at parse time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbiType {
    Address,
    Bool,
    Uint(usize),
    Int(usize),
    FixedBytes(usize),
    Bytes,
    String,
    Array(Box<AbiType>),
    FixedArray(Box<AbiType>, usize),
}

impl AbiType {
    /// Dynamic types live in the tail and are referenced from the head by offset.
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Address
            | AbiType::Bool
            | AbiType::Uint(_)
            | AbiType::Int(_)
            | AbiType::FixedBytes(_) => false,
            AbiType::Bytes | AbiType::String | AbiType::Array(_) => true,
            AbiType::FixedArray(inner, _) => inner.is_dynamic(),
        }
    }

    /// Bytes this type occupies in the head region.
    pub fn head_size(&self) -> usize {
        match self {
            AbiType::FixedArray(inner, len) if !inner.is_dynamic() => {
                inner.head_size().saturating_mul(*len)
            }
            _ => WORD_SIZE,
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiType::Address => f.write_str("address"),
            AbiType::Bool => f.write_str("bool"),
            AbiType::Uint(bits) => write!(f, "uint{bits}"),
            AbiType::Int(bits) => write!(f, "int{bits}"),
            AbiType::FixedBytes(size) => write!(f, "bytes{size}"),
            AbiType::Bytes => f.write_str("bytes"),
            AbiType::String => f.write_str("string"),
            AbiType::Array(inner) => write!(f, "{inner}[]"),
            AbiType::FixedArray(inner, len) => write!(f, "{inner}[{len}]"),
        }
    }
}

impl FromStr for AbiType {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || AbiError::UnsupportedType(s.to_string());
        let s = s.trim();

        if let Some(rest) = s.strip_suffix(']') {
            let open = rest.rfind('[').ok_or_else(unsupported)?;
            let inner: AbiType = rest[..open].parse().map_err(|_| unsupported())?;
            let dim = &rest[open + 1..];
            if dim.is_empty() {
                return Ok(AbiType::Array(Box::new(inner)));
            }
            let len = parse_decimal(dim).filter(|n| *n > 0).ok_or_else(unsupported)?;
            // The head of a static array must stay addressable.
            if !inner.is_dynamic() && inner.head_size().checked_mul(len).is_none() {
                return Err(unsupported());
            }
            return Ok(AbiType::FixedArray(Box::new(inner), len));
        }

        match s {
            "address" => return Ok(AbiType::Address),
            "bool" => return Ok(AbiType::Bool),
            "string" => return Ok(AbiType::String),
            "bytes" => return Ok(AbiType::Bytes),
            "uint" => return Ok(AbiType::Uint(256)),
            "int" => return Ok(AbiType::Int(256)),
            _ => {}
        }

        if let Some(bits) = s.strip_prefix("uint") {
            return parse_bits(bits).map(AbiType::Uint).ok_or_else(unsupported);
        }
        if let Some(bits) = s.strip_prefix("int") {
            return parse_bits(bits).map(AbiType::Int).ok_or_else(unsupported);
        }
        if let Some(size) = s.strip_prefix("bytes") {
            return parse_decimal(size)
                .filter(|n| (1..=32).contains(n))
                .map(AbiType::FixedBytes)
                .ok_or_else(unsupported);
        }

        Err(unsupported())
    }
}

fn parse_bits(s: &str) -> Option<usize> {
    parse_decimal(s).filter(|bits| bits % 8 == 0 && (8..=256).contains(bits))
}

// Plain ASCII digits without sign or leading zero.
fn parse_decimal(s: &str) -> Option<usize> {
    if s.is_empty() || s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// A positional parameter; `name` may be empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbiParameter {
    pub name: String,
    pub kind: AbiType,
    pub index: usize,
}

impl AbiParameter {
    /// Declared name, or `param{index}` when the ABI leaves it blank.
    pub fn key(&self) -> String {
        if self.name.is_empty() {
            format!("param{}", self.index)
        } else {
            self.name.clone()
        }
    }
}

/// Build ordered parameters from `(name, type)` pairs.
pub fn parameters<'a, I>(pairs: I) -> Result<Vec<AbiParameter>, AbiError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .enumerate()
        .map(|(index, (name, ty))| {
            Ok(AbiParameter {
                name: name.to_string(),
                kind: ty.parse()?,
                index,
            })
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub inputs: Vec<AbiParameter>,
    pub outputs: Vec<AbiParameter>,
}

impl FunctionSignature {
    /// Parse a human-readable `name(type1,type2)` signature. Parameter names
    /// are not part of this form, so inputs get synthetic keys.
    pub fn parse(signature: &str) -> Result<Self, AbiError> {
        let invalid = || AbiError::InvalidAbi(format!("malformed signature `{signature}`"));
        let signature = signature.trim();
        let open = signature.find('(').ok_or_else(invalid)?;
        let body = signature[open + 1..].strip_suffix(')').ok_or_else(invalid)?;
        let name = signature[..open].trim();
        if name.is_empty() {
            return Err(invalid());
        }

        let types: Vec<&str> = if body.trim().is_empty() {
            Vec::new()
        } else {
            body.split(',').map(str::trim).collect()
        };

        Ok(Self {
            name: name.to_string(),
            inputs: parameters(types.into_iter().map(|ty| ("", ty)))?,
            outputs: Vec::new(),
        })
    }

    /// `name(type1,type2,...)` with canonical type names.
    pub fn canonical(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(|p| p.kind.to_string()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    pub fn selector(&self) -> [u8; 4] {
        selector(&self.canonical())
    }
}

/// First four bytes of keccak256 over the signature text.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}
