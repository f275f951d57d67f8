//! Binding native Rust callables to a module's imports.
//!
//! The assembler only knows each import as `(module, field, params,
//! result)`.  [`HostBridge`] pairs those descriptors with closures supplied
//! by the embedder, keyed by module name and then field name, and uses the
//! table to link the emitted bytes into a runnable `wasmi` instance.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use jasm_codegen::{EmitConfig, ImportFunction};
use jasm_types::ValueType;
use wasmi::{Caller, Engine, ExternType, Func, Instance, Linker, Module, Store, Val};

use crate::error::{HostError, HostResult};
use crate::value::Value;

/// A native implementation of one import.
///
/// Receives the store's host data and the call arguments; returns the
/// result value for imports that declare one.
pub type HostFn<T> = Arc<dyn Fn(&mut T, &[Value]) -> Option<Value> + Send + Sync + 'static>;

/// What the bridge needs to know about one import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSignature {
    pub module: String,
    pub field: String,
    pub params: Vec<ValueType>,
    pub result: Option<ValueType>,
}

impl From<&ImportFunction> for ImportSignature {
    fn from(import: &ImportFunction) -> Self {
        Self {
            module: import.module().to_string(),
            field: import.field().to_string(),
            params: import.params().collect(),
            result: import.result(),
        }
    }
}

/// Import table: module name → field name → implementation.
pub struct HostBridge<T> {
    signatures: Vec<ImportSignature>,
    table: HashMap<String, HashMap<String, HostFn<T>>>,
    export_name: String,
}

impl<T: 'static> HostBridge<T> {
    /// A bridge for the given import descriptors, with no implementations yet.
    pub fn new(imports: &[ImportFunction]) -> Self {
        Self {
            signatures: imports.iter().map(ImportSignature::from).collect(),
            table: HashMap::new(),
            export_name: EmitConfig::default().export_name,
        }
    }

    /// Invoke the export named in `config` instead of the default.
    pub fn with_config(mut self, config: &EmitConfig) -> Self {
        self.export_name = config.export_name.clone();
        self
    }

    pub fn signatures(&self) -> &[ImportSignature] {
        &self.signatures
    }

    /// Supply the implementation of `module.field`.
    pub fn provide<F>(&mut self, module: &str, field: &str, func: F) -> HostResult<&mut Self>
    where
        F: Fn(&mut T, &[Value]) -> Option<Value> + Send + Sync + 'static,
    {
        if self.signature(module, field).is_none() {
            return Err(HostError::UnknownImport {
                module: module.to_string(),
                field: field.to_string(),
            });
        }
        log::trace!("host implementation provided for {module}.{field}");
        self.table
            .entry(module.to_string())
            .or_default()
            .insert(field.to_string(), Arc::new(func));
        Ok(self)
    }

    /// The implementation registered for `module.field`, if any.
    pub fn resolve(&self, module: &str, field: &str) -> Option<&HostFn<T>> {
        self.table.get(module).and_then(|fields| fields.get(field))
    }

    fn signature(&self, module: &str, field: &str) -> Option<&ImportSignature> {
        self.signatures
            .iter()
            .find(|s| s.module == module && s.field == field)
    }

    /// Load `wasm`, link every import and run the start function.
    pub fn instantiate(&self, wasm: &[u8], data: T) -> HostResult<LoadedModule<T>> {
        for sig in &self.signatures {
            if self.resolve(&sig.module, &sig.field).is_none() {
                return Err(HostError::MissingImport {
                    module: sig.module.clone(),
                    field: sig.field.clone(),
                });
            }
        }

        let engine = Engine::default();
        let module = Module::new(&engine, wasm).map_err(|e| HostError::Load(e.to_string()))?;
        let mut store = Store::new(&engine, data);
        let mut linker = <Linker<T>>::new(&engine);
        let mut defined = HashSet::new();

        for import in module.imports() {
            let module_name = import.module();
            let field = import.name();
            // A module may import the same name more than once.
            if !defined.insert((module_name, field)) {
                continue;
            }
            let ExternType::Func(func_ty) = import.ty() else {
                return Err(HostError::Link(format!(
                    "import {module_name}.{field} is not a function"
                )));
            };
            let host = self.resolve(module_name, field).cloned().ok_or_else(|| {
                HostError::MissingImport {
                    module: module_name.to_string(),
                    field: field.to_string(),
                }
            })?;
            let expected = self
                .signature(module_name, field)
                .and_then(|sig| sig.result);
            let name = format!("{module_name}.{field}");

            let func = Func::new(
                &mut store,
                func_ty.clone(),
                move |mut caller: Caller<'_, T>, params: &[Val], results: &mut [Val]| {
                    let args = params
                        .iter()
                        .map(Value::try_from)
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(wasmi::Error::new)?;
                    let returned = (*host)(caller.data_mut(), &args);
                    match (results.first_mut(), returned, expected) {
                        (None, None, _) => Ok(()),
                        (Some(slot), Some(value), Some(ty)) if value.ty() == ty => {
                            *slot = value.into();
                            Ok(())
                        }
                        (_, returned, _) => Err(wasmi::Error::new(format!(
                            "host function {name} returned {returned:?}, expected {expected:?}"
                        ))),
                    }
                },
            );
            linker
                .define(module_name, field, func)
                .map_err(|e| HostError::Link(e.to_string()))?;
        }

        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| HostError::Instantiate(e.to_string()))?
            .start(&mut store)
            .map_err(|e| HostError::Instantiate(e.to_string()))?;
        log::debug!(
            "instantiated module with {} linked imports",
            self.signatures.len()
        );

        Ok(LoadedModule {
            store,
            instance,
            export_name: self.export_name.clone(),
        })
    }
}

/// An instantiated module together with its host data.
pub struct LoadedModule<T> {
    store: Store<T>,
    instance: Instance,
    export_name: String,
}

impl<T> LoadedModule<T> {
    /// Call the exported entry point: no arguments, no results.
    pub fn run(&mut self) -> HostResult<()> {
        let entry = self
            .instance
            .get_func(&self.store, &self.export_name)
            .ok_or_else(|| HostError::MissingExport(self.export_name.clone()))?
            .typed::<(), ()>(&self.store)
            .map_err(|e| HostError::ExportSignature {
                name: self.export_name.clone(),
                reason: e.to_string(),
            })?;
        log::debug!("running export {}", self.export_name);
        entry
            .call(&mut self.store, ())
            .map_err(|e| HostError::Call(e.to_string()))
    }

    pub fn data(&self) -> &T {
        self.store.data()
    }

    pub fn data_mut(&mut self) -> &mut T {
        self.store.data_mut()
    }

    pub fn into_data(self) -> T {
        self.store.into_data()
    }
}
