//! Annotations carried alongside the circuit IR
//!
//! The front-end communicates method metadata to the elaboration passes
//! through two annotation kinds (method IO and method call). Everything
//! else is opaque to the passes and flows through unchanged.

use serde::{Deserialize, Serialize};

/// An annotation attached to the circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Annotation {
    /// Binds a port of a module to one of the module's methods
    MethodIo(MethodIoAnnotation),
    /// Binds a caller-side call port to a callee method
    MethodCall(MethodCallAnnotation),
    /// Requests zero-initialization of a memory; emitted by the front-end
    /// and consumed by the downstream compiler
    MemZeroInit(MemZeroInitAnnotation),
    /// Opaque passthrough annotation
    Opaque { key: String, value: String },
}

/// Method-IO annotation: `(module, method)` is unique, `port` exists in
/// `module` and is a bundle with `enabled`/`guard`/`arg`/`ret` sub-fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodIoAnnotation {
    pub module: String,
    pub port: String,
    pub method: String,
}

/// Method-call annotation: the caller-side port through which `caller_module`
/// invokes `callee_parent.callee_method`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCallAnnotation {
    pub caller_module: String,
    pub caller_port: String,
    pub callee_parent: String,
    pub callee_method: String,
    /// Distinguishes repeated call ports for the same callee method within
    /// one caller module
    pub call_site: u32,
    pub role: CallRole,
}

/// Whether a method-call annotation describes the argument or the return
/// side of the call port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallRole {
    Arg,
    Ret,
}

/// Memory zero-init annotation targeting `memory` in `module`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemZeroInitAnnotation {
    pub module: String,
    pub memory: String,
}

impl Annotation {
    /// Whether this annotation is method metadata consumed by elaboration
    pub fn is_method_meta(&self) -> bool {
        matches!(self, Annotation::MethodIo(_) | Annotation::MethodCall(_))
    }
}
