//! Tensor element types as they appear in config files

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Element type of a tensor
///
/// Serializes to the engine's qualified name (`torch.float16`). Parses from the
/// qualified name, the bare name, or a common alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit float
    Float32,
    /// IEEE half precision
    Float16,
    /// Brain float
    BFloat16,
    /// 64-bit float
    Float64,
    /// Signed 8-bit integer
    Int8,
    /// Unsigned 8-bit integer
    UInt8,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// Boolean
    Bool,
}

impl DType {
    /// All supported types
    pub const ALL: [DType; 9] = [
        Self::Float32,
        Self::Float16,
        Self::BFloat16,
        Self::Float64,
        Self::Int8,
        Self::UInt8,
        Self::Int32,
        Self::Int64,
        Self::Bool,
    ];

    /// Bare type name
    #[must_use]
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Float16 => "float16",
            Self::BFloat16 => "bfloat16",
            Self::Float64 => "float64",
            Self::Int8 => "int8",
            Self::UInt8 => "uint8",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Bool => "bool",
        }
    }

    /// Qualified name written to config dumps
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Float32 => "torch.float32",
            Self::Float16 => "torch.float16",
            Self::BFloat16 => "torch.bfloat16",
            Self::Float64 => "torch.float64",
            Self::Int8 => "torch.int8",
            Self::UInt8 => "torch.uint8",
            Self::Int32 => "torch.int32",
            Self::Int64 => "torch.int64",
            Self::Bool => "torch.bool",
        }
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognized data type name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown data type '{0}'")]
pub struct DTypeError(pub String);

impl FromStr for DType {
    type Err = DTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s.trim();
        let bare = bare.strip_prefix("torch.").unwrap_or(bare);
        let dtype = match bare.to_ascii_lowercase().as_str() {
            "float32" | "fp32" | "float" => Self::Float32,
            "float16" | "fp16" | "half" => Self::Float16,
            "bfloat16" | "bf16" => Self::BFloat16,
            "float64" | "fp64" | "double" => Self::Float64,
            "int8" => Self::Int8,
            "uint8" => Self::UInt8,
            "int32" | "int" => Self::Int32,
            "int64" | "long" => Self::Int64,
            "bool" => Self::Bool,
            _ => return Err(DTypeError(s.to_string())),
        };
        Ok(dtype)
    }
}

impl Serialize for DType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for DType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
