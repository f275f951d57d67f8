use serde::{Deserialize, Serialize};
use std::fmt;

/// Value types a parameter, local or result may have.
///
/// The discriminant is the type's byte in the binary encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ValueType {
    I32 = 0x7f,
    F32 = 0x7d,
}

impl ValueType {
    /// The byte this type is encoded as.
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Decode a value type byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x7f => Some(Self::I32),
            0x7d => Some(Self::F32),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I32 => write!(f, "i32"),
            Self::F32 => write!(f, "f32"),
        }
    }
}
