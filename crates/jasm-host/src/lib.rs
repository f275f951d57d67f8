//! JASM host bridge.
//!
//! Supplies native Rust implementations for the imports declared on a
//! [`jasm_codegen::ImportBuilder`], loads the emitted module with `wasmi`
//! and calls its entry point.
//!
//! ```
//! use jasm_codegen::{Arg, ImportBuilder};
//! use jasm_host::HostBridge;
//!
//! let mut imports = ImportBuilder::new();
//! let print = imports.import("env", "print", vec![Arg::f32("i")]).unwrap();
//! let mut jasm = imports.finish();
//! let main = jasm.function("main", vec![]).unwrap();
//! jasm.body(main).unwrap().push_constant(42.0).call(print).unwrap();
//! let wasm = jasm.emit().unwrap();
//!
//! let mut bridge = HostBridge::<Vec<f32>>::new(jasm.imports());
//! bridge
//!     .provide("env", "print", |printed, args| {
//!         printed.extend(args.iter().filter_map(|v| v.as_f32()));
//!         None
//!     })
//!     .unwrap();
//!
//! let mut loaded = bridge.instantiate(&wasm, Vec::new()).unwrap();
//! loaded.run().unwrap();
//! assert_eq!(loaded.into_data(), vec![42.0]);
//! ```

pub mod bridge;
pub mod error;
pub mod value;

pub use bridge::{HostBridge, HostFn, ImportSignature, LoadedModule};
pub use error::{HostError, HostResult};
pub use value::Value;
