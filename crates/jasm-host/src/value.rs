//! Values crossing the host boundary.

use jasm_types::ValueType;
use wasmi::Val;

/// An argument or result of a host function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I32(i32),
    F32(f32),
}

impl Value {
    pub fn ty(self) -> ValueType {
        match self {
            Self::I32(_) => ValueType::I32,
            Self::F32(_) => ValueType::F32,
        }
    }

    pub fn as_f32(self) -> Option<f32> {
        match self {
            Self::F32(x) => Some(x),
            Self::I32(_) => None,
        }
    }

    pub fn as_i32(self) -> Option<i32> {
        match self {
            Self::I32(n) => Some(n),
            Self::F32(_) => None,
        }
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Self::F32(x)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::I32(n)
    }
}

impl TryFrom<&Val> for Value {
    type Error = String;

    fn try_from(val: &Val) -> Result<Self, Self::Error> {
        match val {
            Val::I32(n) => Ok(Self::I32(*n)),
            Val::F32(x) => Ok(Self::F32(f32::from(*x))),
            other => Err(format!("unsupported host value {other:?}")),
        }
    }
}

impl From<Value> for Val {
    fn from(value: Value) -> Self {
        match value {
            Value::I32(n) => Val::I32(n),
            Value::F32(x) => Val::F32(x.into()),
        }
    }
}
