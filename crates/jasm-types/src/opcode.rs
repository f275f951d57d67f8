//! Instruction opcodes.
//!
//! Only a subset is reachable from the function builder; the rest are kept
//! so the table matches the instruction encoding it was taken from.

/// Single-byte instruction opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Block = 0x02,
    Loop = 0x03,
    Br = 0x0c,
    BrIf = 0x0d,
    End = 0x0b,
    Call = 0x10,
    LocalGet = 0x20,
    LocalSet = 0x21,
    I32Store8 = 0x3a,
    I32Const = 0x41,
    F32Const = 0x43,
    I32Eqz = 0x45,
    I32Eq = 0x46,
    F32Eq = 0x5b,
    F32Lt = 0x5d,
    F32Gt = 0x5e,
    I32And = 0x71,
    F32Add = 0x92,
    F32Sub = 0x93,
    F32Mul = 0x94,
    F32Div = 0x95,
    I32TruncF32S = 0xa8,
}

impl Opcode {
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Mnemonic in the text format.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Loop => "loop",
            Self::Br => "br",
            Self::BrIf => "br_if",
            Self::End => "end",
            Self::Call => "call",
            Self::LocalGet => "local.get",
            Self::LocalSet => "local.set",
            Self::I32Store8 => "i32.store8",
            Self::I32Const => "i32.const",
            Self::F32Const => "f32.const",
            Self::I32Eqz => "i32.eqz",
            Self::I32Eq => "i32.eq",
            Self::F32Eq => "f32.eq",
            Self::F32Lt => "f32.lt",
            Self::F32Gt => "f32.gt",
            Self::I32And => "i32.and",
            Self::F32Add => "f32.add",
            Self::F32Sub => "f32.sub",
            Self::F32Mul => "f32.mul",
            Self::F32Div => "f32.div",
            Self::I32TruncF32S => "i32.trunc_f32_s",
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op.byte()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_bytes() {
        assert_eq!(Opcode::End.byte(), 0x0b);
        assert_eq!(Opcode::Call.byte(), 0x10);
        assert_eq!(Opcode::LocalGet.byte(), 0x20);
        assert_eq!(Opcode::F32Const.byte(), 0x43);
        assert_eq!(Opcode::F32Add.byte(), 0x92);
        assert_eq!(Opcode::F32Mul.byte(), 0x94);
        assert_eq!(u8::from(Opcode::I32TruncF32S), 0xa8);
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(Opcode::LocalGet.mnemonic(), "local.get");
        assert_eq!(Opcode::BrIf.mnemonic(), "br_if");
    }
}
