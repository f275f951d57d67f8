//! Shared types for the JASM assembler.
//!
//! This crate holds the pieces of WebAssembly binary-format knowledge that
//! every other crate needs: value types, instruction opcodes, section ids,
//! export kinds and the fixed module preamble.

mod opcode;
mod section;
mod valtype;

pub use opcode::Opcode;
pub use section::{ExportKind, SectionId};
pub use valtype::ValueType;

/// `\0asm`: first four bytes of every module.
pub const MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6d];

/// Binary format version 1, little-endian.
pub const VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// Leading byte of a function type record in the type section.
pub const FUNC_TYPE_FORM: u8 = 0x60;

/// Block type of a block that produces no value.
pub const BLOCKTYPE_VOID: u8 = 0x40;

/// Longest import/export name accepted by the assembler.
pub const MAX_NAME_LEN: usize = 255;
