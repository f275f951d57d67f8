//! Low-level binary encoding.
//!
//! [`WasmBuffer`] is a growable byte buffer with one `write_*` operation per
//! primitive of the binary format: LEB128 integers, little-endian floats,
//! names, vectors and sections.  Everything the assembler produces is built
//! through it.  The free `encode_*` functions are one-shot conveniences over
//! the same writers.

use jasm_types::{SectionId, ValueType, MAX_NAME_LEN};

use crate::error::{CodegenError, CodegenResult};

/// Growable output buffer for binary-format data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WasmBuffer {
    bytes: Vec<u8>,
}

impl WasmBuffer {
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn write_u8(&mut self, byte: u8) -> &mut Self {
        self.bytes.push(byte);
        self
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Unsigned LEB128: 7 bits per byte, high bit set on all but the last.
    pub fn write_unsigned(&mut self, mut value: u64) -> &mut Self {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.bytes.push(byte);
                return self;
            }
            self.bytes.push(byte | 0x80);
        }
    }

    /// Signed LEB128.
    ///
    /// Stops once the remaining bits are pure sign extension of the last
    /// byte's bit 6, so `-64` takes one byte and `-65` takes two.
    pub fn write_signed(&mut self, mut value: i64) -> &mut Self {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            let sign_bit = byte & 0x40 != 0;
            if (value == 0 && !sign_bit) || (value == -1 && sign_bit) {
                self.bytes.push(byte);
                return self;
            }
            self.bytes.push(byte | 0x80);
        }
    }

    pub fn write_f32(&mut self, value: f32) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Length-prefixed name, one byte per character.
    pub fn write_name(&mut self, name: &str) -> CodegenResult<&mut Self> {
        if !name.is_ascii() {
            return Err(CodegenError::InvalidName(name.to_string()));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(CodegenError::LimitExceeded(format!(
                "name is {} characters long, at most {MAX_NAME_LEN} are allowed",
                name.len()
            )));
        }
        self.write_unsigned(name.len() as u64);
        self.write_bytes(name.as_bytes());
        Ok(self)
    }

    /// Item count followed by the already-encoded items.
    pub fn write_vector<I, T>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
        T: AsRef<[u8]>,
    {
        let items = items.into_iter();
        self.write_unsigned(items.len() as u64);
        for item in items {
            self.write_bytes(item.as_ref());
        }
        self
    }

    /// A vector whose elements are single bytes.
    pub fn write_byte_vector(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_unsigned(bytes.len() as u64);
        self.write_bytes(bytes)
    }

    /// Section id followed by the byte-length-prefixed payload.
    pub fn write_section(&mut self, id: SectionId, payload: &[u8]) -> &mut Self {
        self.write_u8(id.byte());
        self.write_byte_vector(payload)
    }

    /// One `(count, type)` entry of a code body's locals declaration.
    pub fn write_locals_decl(&mut self, count: u32, ty: ValueType) -> &mut Self {
        self.write_unsigned(u64::from(count));
        self.write_u8(ty.byte())
    }
}

impl AsRef<[u8]> for WasmBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<WasmBuffer> for Vec<u8> {
    fn from(buf: WasmBuffer) -> Vec<u8> {
        buf.bytes
    }
}

pub fn encode_unsigned(value: u64) -> Vec<u8> {
    let mut buf = WasmBuffer::new();
    buf.write_unsigned(value);
    buf.into_bytes()
}

pub fn encode_signed(value: i64) -> Vec<u8> {
    let mut buf = WasmBuffer::new();
    buf.write_signed(value);
    buf.into_bytes()
}

pub fn encode_f32(value: f32) -> [u8; 4] {
    value.to_le_bytes()
}

pub fn encode_name(name: &str) -> CodegenResult<Vec<u8>> {
    let mut buf = WasmBuffer::new();
    buf.write_name(name)?;
    Ok(buf.into_bytes())
}

pub fn encode_vector<T: AsRef<[u8]>>(items: &[T]) -> Vec<u8> {
    let mut buf = WasmBuffer::new();
    buf.write_vector(items);
    buf.into_bytes()
}

pub fn encode_section(id: SectionId, payload: &[u8]) -> Vec<u8> {
    let mut buf = WasmBuffer::new();
    buf.write_section(id, payload);
    buf.into_bytes()
}

pub fn encode_locals_decl(count: u32, ty: ValueType) -> Vec<u8> {
    let mut buf = WasmBuffer::new();
    buf.write_locals_decl(count, ty);
    buf.into_bytes()
}
