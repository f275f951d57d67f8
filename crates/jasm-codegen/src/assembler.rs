//! Main WASM module assembler.
//!
//! Building a module is a two-phase process:
//! 1. Register host imports on an [`ImportBuilder`]
//! 2. [`ImportBuilder::finish`] freezes them and yields a [`Jasm`], which
//!    registers defined functions and gives access to their builders
//!
//! Imports therefore always occupy the first function indices, which is
//! what the function section's index arithmetic relies on.
//!
//! [`Jasm::emit`] then writes, in order: magic, version, type section,
//! import section, function section, export section, code section.

use std::sync::atomic::{AtomicU32, Ordering};

use jasm_types::{ExportKind, SectionId, ValueType, FUNC_TYPE_FORM, MAGIC, VERSION};

use crate::config::EmitConfig;
use crate::encoding::WasmBuffer;
use crate::error::{CodegenError, CodegenResult};
use crate::function::{Arg, AssemblerId, FuncRef, Function, ImportFunction};
use crate::function_map::{FunctionMap, FUNCTION_MAP_SECTION};

static NEXT_ASSEMBLER_ID: AtomicU32 = AtomicU32::new(0);

fn next_index(taken: usize) -> CodegenResult<u32> {
    u32::try_from(taken)
        .map_err(|_| CodegenError::LimitExceeded(format!("more than {} functions", u32::MAX)))
}

// ══════════════════════════════════════════════════════════════════════════════
// Import phase
// ══════════════════════════════════════════════════════════════════════════════

/// First build phase: collects the host imports.
#[derive(Debug)]
pub struct ImportBuilder {
    id: AssemblerId,
    imports: Vec<ImportFunction>,
}

impl Default for ImportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportBuilder {
    pub fn new() -> Self {
        Self {
            id: AssemblerId(NEXT_ASSEMBLER_ID.fetch_add(1, Ordering::Relaxed)),
            imports: Vec::new(),
        }
    }

    /// Register `module.field` as a host function with no result.
    pub fn import(
        &mut self,
        module: &str,
        field: &str,
        args: Vec<Arg>,
    ) -> CodegenResult<FuncRef> {
        self.register(module, field, args, None)
    }

    /// Register `module.field` as a host function returning `result`.
    pub fn import_returning(
        &mut self,
        module: &str,
        field: &str,
        args: Vec<Arg>,
        result: ValueType,
    ) -> CodegenResult<FuncRef> {
        self.register(module, field, args, Some(result))
    }

    fn register(
        &mut self,
        module: &str,
        field: &str,
        args: Vec<Arg>,
        result: Option<ValueType>,
    ) -> CodegenResult<FuncRef> {
        // Reject unencodable names here rather than at emit time.
        let mut names = WasmBuffer::new();
        names.write_name(module)?.write_name(field)?;
        if self
            .imports
            .iter()
            .any(|i| i.module() == module && i.field() == field)
        {
            return Err(CodegenError::DuplicateImport {
                module: module.to_string(),
                field: field.to_string(),
            });
        }

        let index = next_index(self.imports.len())?;
        let import = ImportFunction::new(
            self.id,
            index,
            module.to_string(),
            field.to_string(),
            args,
            result,
        )?;
        log::trace!("import {module}.{field} registered as function {index}");
        self.imports.push(import);
        Ok(FuncRef {
            owner: self.id,
            index,
        })
    }

    pub fn imports(&self) -> &[ImportFunction] {
        &self.imports
    }

    /// Freeze the imports and move on to defining functions.
    pub fn finish(self) -> Jasm {
        log::debug!("{} imports frozen", self.imports.len());
        Jasm {
            id: self.id,
            imports: self.imports,
            functions: Vec::new(),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Jasm
// ══════════════════════════════════════════════════════════════════════════════

/// Second build phase: defined functions and module emission.
#[derive(Debug)]
pub struct Jasm {
    id: AssemblerId,
    imports: Vec<ImportFunction>,
    functions: Vec<Function>,
}

impl Default for Jasm {
    fn default() -> Self {
        Self::new()
    }
}

impl Jasm {
    /// An assembler for a module without imports.
    pub fn new() -> Self {
        ImportBuilder::new().finish()
    }

    /// Register a defined function with no result.
    pub fn function(&mut self, name: &str, args: Vec<Arg>) -> CodegenResult<FuncRef> {
        self.register(name, args, None)
    }

    /// Register a defined function returning `result`.
    pub fn function_returning(
        &mut self,
        name: &str,
        args: Vec<Arg>,
        result: ValueType,
    ) -> CodegenResult<FuncRef> {
        self.register(name, args, Some(result))
    }

    fn register(
        &mut self,
        name: &str,
        args: Vec<Arg>,
        result: Option<ValueType>,
    ) -> CodegenResult<FuncRef> {
        let index = next_index(self.imports.len() + self.functions.len())?;
        let function = Function::new(self.id, index, name.to_string(), args, result)?;
        log::trace!("function {name} registered as function {index}");
        self.functions.push(function);
        Ok(FuncRef {
            owner: self.id,
            index,
        })
    }

    /// Builder of a defined function, for appending instructions.
    pub fn body(&mut self, func: FuncRef) -> CodegenResult<&mut Function> {
        if func.owner != self.id {
            return Err(CodegenError::ForeignFunction { index: func.index });
        }
        let position = (func.index as usize)
            .checked_sub(self.imports.len())
            .ok_or(CodegenError::NotDefined(func.index))?;
        self.functions
            .get_mut(position)
            .ok_or(CodegenError::NotDefined(func.index))
    }

    pub fn imports(&self) -> &[ImportFunction] {
        &self.imports
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// Index and origin of every function, imports first.
    pub fn function_map(&self) -> FunctionMap {
        let mut map = FunctionMap::new();
        for import in &self.imports {
            map.push_import(import.func_index(), import.module(), import.field());
        }
        for function in &self.functions {
            map.push_defined(function.func_index(), function.name());
        }
        map
    }

    /// Emit the module with the default [`EmitConfig`].
    pub fn emit(&self) -> CodegenResult<Vec<u8>> {
        self.emit_with(&EmitConfig::default())
    }

    /// Emit the module bytes.
    ///
    /// Pure function of the registered state: emitting twice yields the same
    /// bytes, and nothing is mutated.
    pub fn emit_with(&self, config: &EmitConfig) -> CodegenResult<Vec<u8>> {
        let mut module = WasmBuffer::new();
        module.write_bytes(&MAGIC).write_bytes(&VERSION);

        // 1. Type section
        module.write_section(SectionId::Type, self.emit_types().as_slice());

        // 2. Import section
        module.write_section(SectionId::Import, self.emit_imports()?.as_slice());

        // 3. Function section
        module.write_section(SectionId::Function, self.emit_function_indices().as_slice());

        // 4. Export section
        module.write_section(SectionId::Export, self.emit_exports(config)?.as_slice());

        // 5. Code section
        module.write_section(SectionId::Code, self.emit_code().as_slice());

        // 6. Custom section (function map)
        if config.embed_function_map {
            let mut custom = WasmBuffer::new();
            custom.write_name(FUNCTION_MAP_SECTION)?;
            custom.write_bytes(&self.function_map().to_json());
            module.write_section(SectionId::Custom, custom.as_slice());
        }

        let wasm = module.into_bytes();
        log::debug!(
            "emitted module: {} imports, {} functions, {} bytes",
            self.imports.len(),
            self.functions.len(),
            wasm.len()
        );

        // 7. Validate
        if config.validate {
            wasmparser::validate(&wasm)
                .map_err(|e| CodegenError::ValidationFailed(format!("{e}")))?;
        }

        Ok(wasm)
    }

    // ── Type section ─────────────────────────────────────────────────────

    /// One signature per function, imports first, in registration order.
    /// A function's type index is therefore its function index.
    fn emit_types(&self) -> WasmBuffer {
        let mut records = Vec::with_capacity(self.imports.len() + self.functions.len());
        for f in &self.imports {
            records.push(func_type(f.params(), f.result()));
        }
        for f in &self.functions {
            records.push(func_type(f.params(), f.result()));
        }

        let mut section = WasmBuffer::new();
        section.write_vector(records);
        section
    }

    // ── Import section ───────────────────────────────────────────────────

    fn emit_imports(&self) -> CodegenResult<WasmBuffer> {
        let mut entries = Vec::with_capacity(self.imports.len());
        for (type_index, import) in self.imports.iter().enumerate() {
            debug_assert_eq!(type_index as u32, import.func_index());
            let mut entry = WasmBuffer::new();
            entry
                .write_name(import.module())?
                .write_name(import.field())?
                .write_u8(ExportKind::Func.byte())
                .write_unsigned(type_index as u64);
            entries.push(entry);
        }

        let mut section = WasmBuffer::new();
        section.write_vector(entries);
        Ok(section)
    }

    // ── Function section ─────────────────────────────────────────────────

    fn emit_function_indices(&self) -> WasmBuffer {
        let import_count = self.imports.len() as u64;
        let mut section = WasmBuffer::new();
        section.write_unsigned(self.functions.len() as u64);
        for position in 0..self.functions.len() {
            section.write_unsigned(position as u64 + import_count);
        }
        section
    }

    // ── Export section ───────────────────────────────────────────────────

    fn emit_exports(&self, config: &EmitConfig) -> CodegenResult<WasmBuffer> {
        let entry = self
            .functions
            .iter()
            .find(|f| f.name() == config.entry_function)
            .ok_or_else(|| CodegenError::MissingEntryPoint(config.entry_function.clone()))?;
        if !entry.args().is_empty() || entry.result().is_some() {
            return Err(CodegenError::InvalidEntryPoint(entry.name().to_string()));
        }

        let mut section = WasmBuffer::new();
        section
            .write_unsigned(1)
            .write_name(&config.export_name)?
            .write_u8(ExportKind::Func.byte())
            .write_unsigned(u64::from(entry.func_index()));
        Ok(section)
    }

    // ── Code section ─────────────────────────────────────────────────────

    fn emit_code(&self) -> WasmBuffer {
        let mut section = WasmBuffer::new();
        section.write_vector(self.functions.iter().map(Function::encode));
        section
    }
}

/// `0x60 ++ vec(params) ++ vec(results)`
fn func_type(
    params: impl ExactSizeIterator<Item = ValueType>,
    result: Option<ValueType>,
) -> WasmBuffer {
    let params: Vec<u8> = params.map(ValueType::byte).collect();
    let results: Vec<u8> = result.map(ValueType::byte).into_iter().collect();
    let mut record = WasmBuffer::new();
    record
        .write_u8(FUNC_TYPE_FORM)
        .write_byte_vector(&params)
        .write_byte_vector(&results);
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_shared_across_phases() {
        let mut imports = ImportBuilder::new();
        let a = imports.import("env", "a", vec![]).unwrap();
        let b = imports.import("env", "b", vec![]).unwrap();
        let mut jasm = imports.finish();
        let main = jasm.function("main", vec![]).unwrap();
        let other = jasm.function("other", vec![]).unwrap();
        assert_eq!(
            [a.index(), b.index(), main.index(), other.index()],
            [0, 1, 2, 3]
        );
    }

    #[test]
    fn test_function_section_offsets_by_import_count() {
        let mut imports = ImportBuilder::new();
        for field in ["a", "b", "c"] {
            imports.import("env", field, vec![]).unwrap();
        }
        let mut jasm = imports.finish();
        jasm.function("main", vec![]).unwrap();
        jasm.function("f", vec![]).unwrap();
        assert_eq!(jasm.emit_function_indices().as_slice(), &[2, 3, 4]);
    }

    #[test]
    fn test_func_type_record() {
        let rec = func_type([ValueType::F32, ValueType::I32].into_iter(), None);
        assert_eq!(rec.as_slice(), &[0x60, 0x02, 0x7d, 0x7f, 0x00]);
        let rec = func_type(std::iter::empty(), Some(ValueType::F32));
        assert_eq!(rec.as_slice(), &[0x60, 0x00, 0x01, 0x7d]);
    }

    #[test]
    fn test_body_rejects_import_ref() {
        let mut imports = ImportBuilder::new();
        let print = imports.import("env", "print", vec![Arg::f32("i")]).unwrap();
        let mut jasm = imports.finish();
        assert!(matches!(jasm.body(print), Err(CodegenError::NotDefined(0))));
    }

    #[test]
    fn test_body_rejects_foreign_ref() {
        let mut first = Jasm::new();
        let mut second = Jasm::new();
        let f = first.function("main", vec![]).unwrap();
        assert!(matches!(
            second.body(f),
            Err(CodegenError::ForeignFunction { index: 0 })
        ));
    }

    #[test]
    fn test_import_name_checked_at_registration() {
        let mut imports = ImportBuilder::new();
        let err = imports.import("énv", "print", vec![]).unwrap_err();
        assert!(matches!(err, CodegenError::InvalidName(_)));
        assert!(imports.imports().is_empty());
    }

    #[test]
    fn test_duplicate_import_is_rejected() {
        let mut imports = ImportBuilder::new();
        imports.import("env", "print", vec![Arg::f32("i")]).unwrap();
        imports.import("debug", "print", vec![Arg::f32("i")]).unwrap();
        let err = imports.import("env", "print", vec![]).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::DuplicateImport { ref module, ref field } if module == "env" && field == "print"
        ));
        assert_eq!(imports.imports().len(), 2);
    }

    #[test]
    fn test_missing_main() {
        let mut jasm = Jasm::new();
        jasm.function("helper", vec![]).unwrap();
        match jasm.emit() {
            Err(CodegenError::MissingEntryPoint(name)) => assert_eq!(name, "main"),
            other => panic!("expected MissingEntryPoint, got {other:?}"),
        }
    }
}
