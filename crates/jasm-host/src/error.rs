//! Host bridge error types.

use thiserror::Error;

/// Errors raised while binding imports or loading and running a module.
#[derive(Debug, Error)]
pub enum HostError {
    /// An implementation was provided for an import nobody declared.
    #[error("no import `{module}.{field}` is declared")]
    UnknownImport { module: String, field: String },

    /// A declared import has no implementation.
    #[error("import `{module}.{field}` has no host implementation")]
    MissingImport { module: String, field: String },

    /// The bytes could not be parsed as a module.
    #[error("failed to load module: {0}")]
    Load(String),

    /// An import could not be defined on the linker.
    #[error("failed to link imports: {0}")]
    Link(String),

    /// Instantiation or the start function failed.
    #[error("failed to instantiate module: {0}")]
    Instantiate(String),

    /// The entry point is not exported.
    #[error("export `{0}` not found")]
    MissingExport(String),

    /// The entry point is exported but takes arguments or returns results.
    #[error("export `{name}` has the wrong signature: {reason}")]
    ExportSignature { name: String, reason: String },

    /// The entry point trapped.
    #[error("call trapped: {0}")]
    Call(String),
}

/// Host bridge result type alias.
pub type HostResult<T> = Result<T, HostError>;
