//! Function descriptors and the instruction builder.
//!
//! A [`Function`] owns an append-only instruction stream.  Every emission
//! method writes the opcode and its immediates straight into the stream, so
//! the body is always a well-formed instruction sequence; [`Function::encode`]
//! only has to add the locals declaration, the final `end` and the size
//! prefix required by the code section.

use jasm_types::{Opcode, ValueType};

use crate::encoding::WasmBuffer;
use crate::error::{CodegenError, CodegenResult};

/// Identity of the assembler a function was registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssemblerId(pub(crate) u32);

/// A stable reference to a registered function.
///
/// Carries the global function index plus the identity of the assembler
/// that assigned it, so a reference cannot be resolved against the wrong
/// module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncRef {
    pub(crate) owner: AssemblerId,
    pub(crate) index: u32,
}

impl FuncRef {
    /// Global function index (imports first, then defined functions).
    pub fn index(self) -> u32 {
        self.index
    }
}

/// Anything a `call` instruction can target.
pub trait Callable {
    fn func_ref(&self) -> FuncRef;
}

impl Callable for FuncRef {
    fn func_ref(&self) -> FuncRef {
        *self
    }
}

impl Callable for &Function {
    fn func_ref(&self) -> FuncRef {
        FuncRef {
            owner: self.owner,
            index: self.func_index,
        }
    }
}

impl Callable for &ImportFunction {
    fn func_ref(&self) -> FuncRef {
        FuncRef {
            owner: self.owner,
            index: self.func_index,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Arg
// ══════════════════════════════════════════════════════════════════════════════

/// One parameter of a function or import.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub ty: ValueType,
    pub name: String,
    local_index: Option<u32>,
}

impl Arg {
    pub fn new(ty: ValueType, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
            local_index: None,
        }
    }

    pub fn f32(name: impl Into<String>) -> Self {
        Self::new(ValueType::F32, name)
    }

    pub fn i32(name: impl Into<String>) -> Self {
        Self::new(ValueType::I32, name)
    }

    /// Position within the owning parameter list, once the owner exists.
    pub fn local_index(&self) -> Option<u32> {
        self.local_index
    }
}

/// Assign each argument its positional slot.
fn bind_args(mut args: Vec<Arg>) -> CodegenResult<Vec<Arg>> {
    for (i, arg) in args.iter_mut().enumerate() {
        let slot = u32::try_from(i)
            .map_err(|_| CodegenError::LimitExceeded("too many parameters".into()))?;
        arg.local_index = Some(slot);
    }
    Ok(args)
}

// ══════════════════════════════════════════════════════════════════════════════
// ImportFunction
// ══════════════════════════════════════════════════════════════════════════════

/// A function implemented by the host, identified by `module.field`.
#[derive(Debug, Clone)]
pub struct ImportFunction {
    owner: AssemblerId,
    func_index: u32,
    module: String,
    field: String,
    args: Vec<Arg>,
    result: Option<ValueType>,
}

impl ImportFunction {
    pub(crate) fn new(
        owner: AssemblerId,
        func_index: u32,
        module: String,
        field: String,
        args: Vec<Arg>,
        result: Option<ValueType>,
    ) -> CodegenResult<Self> {
        Ok(Self {
            owner,
            func_index,
            module,
            field,
            args: bind_args(args)?,
            result,
        })
    }

    pub fn func_index(&self) -> u32 {
        self.func_index
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn result(&self) -> Option<ValueType> {
        self.result
    }

    pub fn params(&self) -> impl ExactSizeIterator<Item = ValueType> + '_ {
        self.args.iter().map(|a| a.ty)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Function
// ══════════════════════════════════════════════════════════════════════════════

/// A function defined by the module.
#[derive(Debug, Clone)]
pub struct Function {
    owner: AssemblerId,
    func_index: u32,
    name: String,
    args: Vec<Arg>,
    /// Declared locals beyond the parameters, in index order.
    locals: Vec<Arg>,
    result: Option<ValueType>,
    code: WasmBuffer,
}

impl Function {
    pub(crate) fn new(
        owner: AssemblerId,
        func_index: u32,
        name: String,
        args: Vec<Arg>,
        result: Option<ValueType>,
    ) -> CodegenResult<Self> {
        Ok(Self {
            owner,
            func_index,
            name,
            args: bind_args(args)?,
            locals: Vec::new(),
            result,
            code: WasmBuffer::new(),
        })
    }

    pub fn func_index(&self) -> u32 {
        self.func_index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn locals(&self) -> &[Arg] {
        &self.locals
    }

    pub fn result(&self) -> Option<ValueType> {
        self.result
    }

    pub fn params(&self) -> impl ExactSizeIterator<Item = ValueType> + '_ {
        self.args.iter().map(|a| a.ty)
    }

    /// Raw instruction bytes emitted so far (no locals, no trailing `end`).
    pub fn code(&self) -> &[u8] {
        self.code.as_slice()
    }

    /// Declare an extra local after the parameters.
    pub fn declare_local(
        &mut self,
        ty: ValueType,
        name: impl Into<String>,
    ) -> CodegenResult<&mut Self> {
        let slot = u32::try_from(self.args.len() + self.locals.len())
            .map_err(|_| CodegenError::LimitExceeded("too many locals".into()))?;
        let mut local = Arg::new(ty, name);
        local.local_index = Some(slot);
        self.locals.push(local);
        Ok(self)
    }

    // ── Constants ────────────────────────────────────────────────────────

    /// `f32.const value`
    pub fn push_constant(&mut self, value: f32) -> &mut Self {
        self.op(Opcode::F32Const).code.write_f32(value);
        self
    }

    /// `i32.const value`
    pub fn push_i32(&mut self, value: i32) -> &mut Self {
        self.op(Opcode::I32Const).code.write_signed(i64::from(value));
        self
    }

    // ── Arithmetic and comparison ────────────────────────────────────────

    pub fn add(&mut self) -> &mut Self {
        self.op(Opcode::F32Add)
    }

    pub fn subtract(&mut self) -> &mut Self {
        self.op(Opcode::F32Sub)
    }

    pub fn multiply(&mut self) -> &mut Self {
        self.op(Opcode::F32Mul)
    }

    pub fn divide(&mut self) -> &mut Self {
        self.op(Opcode::F32Div)
    }

    pub fn equal(&mut self) -> &mut Self {
        self.op(Opcode::F32Eq)
    }

    pub fn less_than(&mut self) -> &mut Self {
        self.op(Opcode::F32Lt)
    }

    pub fn greater_than(&mut self) -> &mut Self {
        self.op(Opcode::F32Gt)
    }

    /// `i32.and`: logical and of two comparison results.
    pub fn and(&mut self) -> &mut Self {
        self.op(Opcode::I32And)
    }

    /// `i32.trunc_f32_s`
    pub fn truncate_to_i32(&mut self) -> &mut Self {
        self.op(Opcode::I32TruncF32S)
    }

    // ── Calls and locals ─────────────────────────────────────────────────

    /// `call target`
    ///
    /// The target must have been registered with the same assembler.
    pub fn call(&mut self, target: impl Callable) -> CodegenResult<&mut Self> {
        let target = target.func_ref();
        if target.owner != self.owner {
            return Err(CodegenError::ForeignFunction {
                index: target.index,
            });
        }
        self.op(Opcode::Call).code.write_unsigned(u64::from(target.index));
        Ok(self)
    }

    /// `local.get` of the parameter or local called `name`.
    pub fn get_local(&mut self, name: &str) -> CodegenResult<&mut Self> {
        let index = self.resolve_local(name)?;
        self.op(Opcode::LocalGet).code.write_unsigned(u64::from(index));
        Ok(self)
    }

    /// `local.set` of the parameter or local called `name`.
    pub fn set_local(&mut self, name: &str) -> CodegenResult<&mut Self> {
        let index = self.resolve_local(name)?;
        self.op(Opcode::LocalSet).code.write_unsigned(u64::from(index));
        Ok(self)
    }

    /// Index of the first parameter, then declared local, named `name`.
    fn resolve_local(&self, name: &str) -> CodegenResult<u32> {
        self.args
            .iter()
            .chain(&self.locals)
            .find(|a| a.name == name)
            .and_then(|a| a.local_index)
            .ok_or_else(|| CodegenError::UnknownLocal {
                function: self.name.clone(),
                name: name.to_string(),
            })
    }

    fn op(&mut self, opcode: Opcode) -> &mut Self {
        self.code.write_u8(opcode.byte());
        self
    }

    // ── Encoding ─────────────────────────────────────────────────────────

    /// Final code-section entry: size prefix, locals vector, code, `end`.
    pub fn encode(&self) -> Vec<u8> {
        let mut body = WasmBuffer::new();

        // Runs of same-typed locals share one (count, type) entry.
        let mut groups: Vec<(u32, ValueType)> = Vec::new();
        for local in &self.locals {
            match groups.last_mut() {
                Some((count, ty)) if *ty == local.ty => *count += 1,
                _ => groups.push((1, local.ty)),
            }
        }
        body.write_unsigned(groups.len() as u64);
        for (count, ty) in groups {
            body.write_locals_decl(count, ty);
        }

        body.write_bytes(self.code.as_slice());
        body.write_u8(Opcode::End.byte());

        let mut entry = WasmBuffer::new();
        entry.write_byte_vector(body.as_slice());
        entry.into_bytes()
    }
}
