//! veru CIR - Circuit Intermediate Representation
//!
//! This crate provides:
//! - The circuit IR consumed and produced by elaboration (modules, ports,
//!   statement trees, expressions)
//! - The annotation stream the front-end attaches to a circuit
//! - Collision-free name generation within a module
//! - A deterministic text rendering for logs and tests

pub mod annotations;
pub mod cir;
pub mod namespace;
pub mod serialize;

// Re-export main types
pub use annotations::{
    Annotation, CallRole, MemZeroInitAnnotation, MethodCallAnnotation, MethodIoAnnotation,
};
pub use cir::{BinaryOp, Circuit, Direction, Expr, Field, Module, Port, Stmt, Type};
pub use namespace::Namespace;
