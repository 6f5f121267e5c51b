//! Error types for untimed-module elaboration

use thiserror::Error;

/// Result type for elaboration passes
pub type Result<T> = std::result::Result<T, ElabError>;

/// Structural violations detected during elaboration.
///
/// Elaboration fails fast: the first violation aborts the pass and no
/// partial output is returned.
#[derive(Debug, Clone, Error)]
pub enum ElabError {
    /// Register, memory or instance declared inside a method body
    #[error("cannot create a {kind} `{name}` in method {method} of {module}")]
    InvalidDeclInMethod {
        kind: &'static str,
        name: String,
        method: String,
        module: String,
    },

    /// More than one call to methods of a stateful submodule within a
    /// single method
    #[error("[{module}.{method}] cannot call more than one method of stateful submodule {submodule}. Detected calls: {calls}")]
    StatefulCallNonDeterminism {
        module: String,
        method: String,
        submodule: String,
        calls: String,
    },

    /// Call annotation references something that is not a method of a
    /// direct child submodule
    #[error("[{module}] call to unknown callee {callee}")]
    UnknownCallee { module: String, callee: String },

    /// Call annotation whose callee parent is the caller module itself
    #[error("currently, only calls to submodules are supported")]
    IntraModuleCall { module: String },

    /// A cycle exists in the inter-method call graph
    #[error("recursive calls are not allowed")]
    RecursiveCall,

    /// A non-empty set of submodules was requested to be abstracted
    #[error("TODO: allow submodules to be abstracted")]
    UnsupportedAbstraction,
}
