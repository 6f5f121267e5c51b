//! Per-module summaries produced by elaboration
//!
//! Summaries are built bottom-up, one per untimed module, and are never
//! mutated after construction. The parent consumes its children's summaries
//! to drive validation and instance planning; downstream verification
//! tooling consumes them to know which state a method touches.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use veru_cir::cir::Type;

/// Summary of one untimed module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UntimedModuleInfo {
    /// Module name
    pub name: String,
    /// Registers and memories declared directly in the module body
    pub local_state: Vec<StateRef>,
    /// One entry per method, in body order
    pub methods: Vec<MethodInfo>,
    /// Summaries of the direct untimed submodules, in declaration order
    pub submodules: Vec<UntimedModuleInfo>,
}

/// A register or memory declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRef {
    /// Declared name
    pub name: String,
    /// State type; a memory of depth `d` over elements of type `t` is
    /// recorded as `t[d]`
    pub ty: Type,
}

/// Summary of one method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodInfo {
    /// Method name
    pub name: String,
    /// Name of the method's IO bundle port
    pub io_port: String,
    /// Top-level names of non-local signals the method body connects to
    pub writes: IndexSet<String>,
    /// Submodule method invocations, in first-occurrence order
    pub calls: Vec<CallInfo>,
}

/// One submodule method invocation within a method body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallInfo {
    /// Module name of the callee's parent (a direct submodule)
    pub callee_parent: String,
    /// Name of the invoked method
    pub callee_method: String,
    /// The caller-side call port carrying the invocation
    pub caller_port: String,
}

/// The four IO shapes a method can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodIoShape {
    NoArgNoRet,
    ArgOnly,
    RetOnly,
    ArgAndRet,
}

impl UntimedModuleInfo {
    /// Whether this module carries state, directly or through any submodule
    pub fn has_state(&self) -> bool {
        !self.local_state.is_empty() || self.submodules.iter().any(|s| s.has_state())
    }

    /// Look up a method by name
    pub fn find_method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Look up a direct submodule summary by module name
    pub fn find_submodule(&self, name: &str) -> Option<&UntimedModuleInfo> {
        self.submodules.iter().find(|s| s.name == name)
    }
}

impl MethodIoShape {
    /// Derive the shape from a method IO bundle type: `arg`/`ret` count as
    /// present when the sub-field exists with a nonzero width
    pub fn of_port(ty: &Type) -> Self {
        let has_arg = ty.field("arg").map(|f| !f.ty.is_zero_width()).unwrap_or(false);
        let has_ret = ty.field("ret").map(|f| !f.ty.is_zero_width()).unwrap_or(false);
        match (has_arg, has_ret) {
            (false, false) => MethodIoShape::NoArgNoRet,
            (true, false) => MethodIoShape::ArgOnly,
            (false, true) => MethodIoShape::RetOnly,
            (true, true) => MethodIoShape::ArgAndRet,
        }
    }

    pub fn has_arg(&self) -> bool {
        matches!(self, MethodIoShape::ArgOnly | MethodIoShape::ArgAndRet)
    }

    pub fn has_ret(&self) -> bool {
        matches!(self, MethodIoShape::RetOnly | MethodIoShape::ArgAndRet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veru_cir::cir::Field;

    fn io_bundle(arg_width: u32, ret_width: u32) -> Type {
        Type::Bundle(vec![
            Field {
                name: "enabled".to_string(),
                flip: false,
                ty: Type::Bits(1),
            },
            Field {
                name: "guard".to_string(),
                flip: true,
                ty: Type::Bits(1),
            },
            Field {
                name: "arg".to_string(),
                flip: false,
                ty: Type::Bits(arg_width),
            },
            Field {
                name: "ret".to_string(),
                flip: true,
                ty: Type::Bits(ret_width),
            },
        ])
    }

    #[test]
    fn shapes_from_port_types() {
        assert_eq!(MethodIoShape::of_port(&io_bundle(0, 0)), MethodIoShape::NoArgNoRet);
        assert_eq!(MethodIoShape::of_port(&io_bundle(8, 0)), MethodIoShape::ArgOnly);
        assert_eq!(MethodIoShape::of_port(&io_bundle(0, 8)), MethodIoShape::RetOnly);
        assert_eq!(MethodIoShape::of_port(&io_bundle(8, 8)), MethodIoShape::ArgAndRet);
    }

    #[test]
    fn has_state_is_transitive() {
        let leaf = UntimedModuleInfo {
            name: "Leaf".to_string(),
            local_state: vec![StateRef {
                name: "value".to_string(),
                ty: Type::Bits(4),
            }],
            methods: vec![],
            submodules: vec![],
        };
        let mid = UntimedModuleInfo {
            name: "Mid".to_string(),
            local_state: vec![],
            methods: vec![],
            submodules: vec![leaf],
        };
        let top = UntimedModuleInfo {
            name: "Top".to_string(),
            local_state: vec![],
            methods: vec![],
            submodules: vec![mid],
        };
        assert!(top.has_state());

        let stateless = UntimedModuleInfo {
            name: "Pure".to_string(),
            local_state: vec![],
            methods: vec![],
            submodules: vec![],
        };
        assert!(!stateless.has_state());
    }
}
