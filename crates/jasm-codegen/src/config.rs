//! Emit configuration.

use serde::{Deserialize, Serialize};

use crate::error::{CodegenError, CodegenResult};

/// Knobs for [`Jasm::emit_with`](crate::Jasm::emit_with).
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use jasm_codegen::EmitConfig;
///
/// let config = EmitConfig::from_json(r#"{ "entry_function": "start" }"#).unwrap();
/// assert_eq!(config.entry_function, "start");
/// assert_eq!(config.export_name, "run");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitConfig {
    /// Defined function to export.
    pub entry_function: String,
    /// Name the entry function is exported under.
    pub export_name: String,
    /// Run the binary validator over the emitted module.
    pub validate: bool,
    /// Append the function map as a `jasm.functions` custom section.
    pub embed_function_map: bool,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            entry_function: "main".to_string(),
            export_name: "run".to_string(),
            validate: true,
            embed_function_map: false,
        }
    }
}

impl EmitConfig {
    pub fn from_json(json: &str) -> CodegenResult<Self> {
        serde_json::from_str(json).map_err(|e| CodegenError::InvalidConfig(e.to_string()))
    }
}
