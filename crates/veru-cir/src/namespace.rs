//! Collision-free name generation within a module
//!
//! Compiler-generated names (duplicated instances, temporaries) must never
//! collide with user-declared ones. A `Namespace` is seeded with every name
//! a module declares and hands out unused names derived from a hint.

use indexmap::IndexSet;

use crate::cir::{Module, Stmt};

/// Tracks the names in use within one module
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    used: IndexSet<String>,
}

impl Namespace {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a namespace with all names declared by a module: its ports and
    /// every declaration anywhere in its body
    pub fn from_module(module: &Module) -> Self {
        let mut ns = Self::new();
        for port in &module.ports {
            ns.used.insert(port.name.clone());
        }
        collect_declared(&module.body, &mut ns.used);
        ns
    }

    /// Whether a name is already taken
    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// Produce an unused name derived from `hint` and register it.
    /// Returns `hint` itself when it is free, otherwise `hint_0`, `hint_1`,
    /// ... until an unused candidate is found.
    pub fn fresh(&mut self, hint: &str) -> String {
        if self.used.insert(hint.to_string()) {
            return hint.to_string();
        }
        let mut i = 0u64;
        loop {
            let candidate = format!("{}_{}", hint, i);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            i += 1;
        }
    }
}

fn collect_declared(stmts: &[Stmt], used: &mut IndexSet<String>) {
    for stmt in stmts {
        if let Some(name) = stmt.declared_name() {
            used.insert(name.to_string());
        }
        if let Stmt::When {
            then_body,
            else_body,
            ..
        } = stmt
        {
            collect_declared(then_body, used);
            collect_declared(else_body, used);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cir::{Direction, Expr, Port, Type};

    #[test]
    fn fresh_returns_hint_when_free() {
        let mut ns = Namespace::new();
        assert_eq!(ns.fresh("ii"), "ii");
        assert!(ns.contains("ii"));
    }

    #[test]
    fn fresh_appends_counter_on_collision() {
        let mut ns = Namespace::new();
        assert_eq!(ns.fresh("ii"), "ii");
        assert_eq!(ns.fresh("ii"), "ii_0");
        assert_eq!(ns.fresh("ii"), "ii_1");
    }

    #[test]
    fn seeded_from_module_declarations() {
        let mut module = Module::new("M");
        module.ports.push(Port {
            name: "clock".to_string(),
            direction: Direction::Input,
            ty: Type::Clock,
            info: None,
        });
        module.body.push(Stmt::Wire {
            name: "tmp".to_string(),
            ty: Type::Bits(1),
        });
        module.body.push(Stmt::When {
            cond: Expr::reference("clock"),
            then_body: vec![Stmt::Node {
                name: "inner".to_string(),
                value: Expr::zero(1),
            }],
            else_body: vec![],
        });

        let mut ns = Namespace::from_module(&module);
        assert!(ns.contains("clock"));
        assert!(ns.contains("tmp"));
        assert!(ns.contains("inner"));
        assert_eq!(ns.fresh("tmp"), "tmp_0");
    }
}
