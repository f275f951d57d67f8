//! Codegen error types.

use thiserror::Error;

/// Errors that can occur while building or emitting a module.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// A `local.get`/`local.set` named a local the function does not have.
    #[error("unknown local `{name}` in function `{function}`")]
    UnknownLocal { function: String, name: String },

    /// No defined function carries the entry point name.
    #[error("missing entry point: no function named `{0}`")]
    MissingEntryPoint(String),

    /// The entry point must take no parameters and return nothing.
    #[error("entry point `{0}` must take no parameters and return nothing")]
    InvalidEntryPoint(String),

    /// The same `module.field` pair was imported twice.
    #[error("import `{module}.{field}` is already registered")]
    DuplicateImport { module: String, field: String },

    /// A function reference was created by a different assembler.
    #[error("function {index} belongs to a different assembler")]
    ForeignFunction { index: u32 },

    /// The function index refers to an import, not a defined function.
    #[error("function {0} is not defined in this module")]
    NotDefined(u32),

    /// A name cannot be encoded one byte per character.
    #[error("invalid name {0:?}: only ASCII characters are supported")]
    InvalidName(String),

    /// Too many functions or locals, or a name that is too long.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// The emitted module failed validation.
    #[error("WASM validation failed: {0}")]
    ValidationFailed(String),

    /// The emit configuration could not be parsed.
    #[error("invalid emit config: {0}")]
    InvalidConfig(String),
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
