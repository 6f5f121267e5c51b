//! veru elaboration - untimed-module call-graph lowering
//!
//! This crate handles:
//! - State scanning and method extraction over the circuit IR
//! - Structural validation of the untimed module hierarchy
//! - Instance planning (duplication of stateless submodules)
//! - The CollectCalls rewrite: instances, defaults and call wiring

pub mod error;
pub mod extract;
pub mod pass;
pub mod plan;
pub mod rewrite;
pub mod scan;
pub mod summary;
pub mod validate;

// Re-export main types
pub use error::{ElabError, Result};
pub use extract::{CallTarget, MethodExtractor};
pub use pass::{CollectCalls, ElabResult};
pub use plan::{ChildPlan, InstancePlan};
pub use scan::scan_state;
pub use summary::{CallInfo, MethodInfo, MethodIoShape, StateRef, UntimedModuleInfo};
