//! Function map: global function index → name and origin.
//!
//! Lets a host turn a function index (from a trap, a call trace or a
//! disassembly) back into the name it was registered under.  The map can
//! be embedded into the module as a custom section and read back with
//! [`FunctionMap::from_wasm`].

use serde::{Deserialize, Serialize};
use wasmparser::{Parser, Payload};

/// Name of the custom section carrying the JSON-encoded map.
pub const FUNCTION_MAP_SECTION: &str = "jasm.functions";

/// All functions of one module, in index order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionMap {
    pub entries: Vec<FunctionMapEntry>,
}

/// One function of the module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionMapEntry {
    /// Global function index (imports first).
    pub func_index: u32,
    /// `module.field` for imports, the function name otherwise.
    pub name: String,
    pub kind: FuncKind,
}

/// Where a function's implementation lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum FuncKind {
    /// Supplied by the host under `module.field`.
    Import { module: String, field: String },
    /// Defined by the module's code section.
    Defined,
}

impl FunctionMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push_import(&mut self, func_index: u32, module: &str, field: &str) {
        self.entries.push(FunctionMapEntry {
            func_index,
            name: format!("{module}.{field}"),
            kind: FuncKind::Import {
                module: module.to_string(),
                field: field.to_string(),
            },
        });
    }

    pub fn push_defined(&mut self, func_index: u32, name: impl Into<String>) {
        self.entries.push(FunctionMapEntry {
            func_index,
            name: name.into(),
            kind: FuncKind::Defined,
        });
    }

    /// Look up the entry whose function index matches.
    pub fn find_by_func_index(&self, idx: u32) -> Option<&FunctionMapEntry> {
        self.entries.iter().find(|e| e.func_index == idx)
    }

    /// Look up a defined function by name.
    pub fn find_defined(&self, name: &str) -> Option<&FunctionMapEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == FuncKind::Defined && e.name == name)
    }

    /// Serialize to JSON bytes for embedding in a custom section.
    pub fn to_json(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Deserialize from JSON bytes.
    pub fn from_json(data: &[u8]) -> Option<Self> {
        serde_json::from_slice(data).ok()
    }

    /// Extract the map from a module's `jasm.functions` custom section.
    pub fn from_wasm(wasm: &[u8]) -> Option<Self> {
        for payload in Parser::new(0).parse_all(wasm) {
            if let Ok(Payload::CustomSection(reader)) = payload {
                if reader.name() == FUNCTION_MAP_SECTION {
                    return Self::from_json(reader.data());
                }
            }
        }
        None
    }
}
