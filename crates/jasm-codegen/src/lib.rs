//! JASM module assembler: builds a `.wasm` binary straight from in-memory
//! functions and instruction streams, with no text format in between.
//!
//! # Architecture
//!
//! - [`encoding`]: LEB128 integers, `f32`, names, vectors and sections,
//!   written through [`WasmBuffer`]
//! - [`function`]: [`Arg`], [`ImportFunction`] and the [`Function`]
//!   instruction builder
//! - [`assembler`]: index assignment and section composition
//! - [`function_map`]: index → name table for hosts and tooling
//!
//! ## Module layout
//!
//! ```text
//! magic, version,
//! type (1), import (2), function (3), export (7), code (10)
//! [custom "jasm.functions"]
//! ```
//!
//! The single export is `run`, bound to the defined function `main`
//! (both configurable through [`EmitConfig`]).
//!
//! # Example
//!
//! ```
//! use jasm_codegen::{Arg, ImportBuilder};
//!
//! let mut imports = ImportBuilder::new();
//! let print = imports.import("env", "print", vec![Arg::f32("i")]).unwrap();
//! let mut jasm = imports.finish();
//!
//! let main = jasm.function("main", vec![]).unwrap();
//! jasm.body(main).unwrap().push_constant(42.0).call(print).unwrap();
//!
//! let wasm = jasm.emit().unwrap();
//! assert_eq!(&wasm[..4], b"\0asm");
//! ```
//!
//! Imports are frozen before the first function exists, so registering an
//! import after a function does not compile:
//!
//! ```compile_fail
//! use jasm_codegen::{Arg, ImportBuilder};
//!
//! let mut jasm = ImportBuilder::new().finish();
//! jasm.function("main", vec![]).unwrap();
//! jasm.import("env", "print", vec![Arg::f32("i")]).unwrap();
//! ```

pub mod assembler;
pub mod config;
pub mod encoding;
pub mod error;
pub mod function;
pub mod function_map;

pub use assembler::{ImportBuilder, Jasm};
pub use config::EmitConfig;
pub use encoding::WasmBuffer;
pub use error::{CodegenError, CodegenResult};
pub use function::{Arg, Callable, FuncRef, Function, ImportFunction};
pub use function_map::{FuncKind, FunctionMap, FunctionMapEntry};
pub use jasm_types::{Opcode, ValueType};
