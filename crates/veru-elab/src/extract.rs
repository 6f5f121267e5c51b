//! Method extractor
//!
//! Locates the method regions of a module body and produces one
//! `MethodInfo` per method. A method region is a conditional region whose
//! predicate is `ref(P).enabled` for a port `P` bound by a Method-IO
//! annotation and whose else-block is empty. Other gating is permitted
//! elsewhere and is walked through without being recognized as a method.

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use veru_cir::cir::{Expr, Module, Stmt};

use crate::error::{ElabError, Result};
use crate::summary::{CallInfo, MethodInfo, StateRef};

/// Callee of a caller-side call port, resolved from a Method-Call annotation
#[derive(Debug, Clone, PartialEq)]
pub struct CallTarget {
    /// Module name of the callee's parent
    pub parent: String,
    /// Name of the invoked method
    pub method: String,
}

/// Extracts method summaries from one module body
pub struct MethodExtractor<'a> {
    module: &'a Module,
    /// Method-IO map of this module: port name -> method name
    io_ports: &'a IndexMap<String, String>,
    /// Call ports of this module: port name -> callee
    call_ports: &'a IndexMap<String, CallTarget>,
    /// Local state names, for diagnostics on out-of-region updates
    state_names: IndexSet<String>,
}

impl<'a> MethodExtractor<'a> {
    pub fn new(
        module: &'a Module,
        io_ports: &'a IndexMap<String, String>,
        call_ports: &'a IndexMap<String, CallTarget>,
        state: &[StateRef],
    ) -> Self {
        Self {
            module,
            io_ports,
            call_ports,
            state_names: state.iter().map(|s| s.name.clone()).collect(),
        }
    }

    /// Extract all method regions, in body order
    pub fn extract(&self) -> Result<Vec<MethodInfo>> {
        let mut methods = Vec::new();
        self.collect_regions(&self.module.body, &mut methods)?;
        Ok(methods)
    }

    fn collect_regions(&self, stmts: &[Stmt], out: &mut Vec<MethodInfo>) -> Result<()> {
        for stmt in stmts {
            match stmt {
                Stmt::When {
                    cond,
                    then_body,
                    else_body,
                } => {
                    if let Some((port, method)) = self.method_region(cond, else_body) {
                        out.push(self.extract_region(port, method, then_body)?);
                    } else {
                        self.collect_regions(then_body, out)?;
                        self.collect_regions(else_body, out)?;
                    }
                }
                Stmt::Connect { loc, .. } | Stmt::Invalidate { loc } => {
                    // State updates outside any method region are ignored.
                    if let Some(root) = loc.root_ref() {
                        if self.state_names.contains(root) {
                            debug!(
                                module = %self.module.name,
                                signal = %root,
                                "ignoring state update outside any method region"
                            );
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Match `when ref(P).enabled :` with an empty else-block, where `P` is
    /// a method IO port of this module
    fn method_region<'b>(&'b self, cond: &'b Expr, else_body: &[Stmt]) -> Option<(&'b str, &'b str)> {
        if !else_body.is_empty() {
            return None;
        }
        let (port, field) = cond.field_of_ref()?;
        if field != "enabled" {
            return None;
        }
        let method = self.io_ports.get(port)?;
        Some((port, method.as_str()))
    }

    fn extract_region(&self, port: &str, method: &str, body: &[Stmt]) -> Result<MethodInfo> {
        let mut locals: IndexSet<String> = IndexSet::new();
        let mut writes: IndexSet<String> = IndexSet::new();
        let mut calls: IndexMap<String, CallInfo> = IndexMap::new();
        self.walk_region(body, port, method, &mut locals, &mut writes, &mut calls)?;
        Ok(MethodInfo {
            name: method.to_string(),
            io_port: port.to_string(),
            writes,
            calls: calls.into_values().collect(),
        })
    }

    fn walk_region(
        &self,
        stmts: &[Stmt],
        io_port: &str,
        method: &str,
        locals: &mut IndexSet<String>,
        writes: &mut IndexSet<String>,
        calls: &mut IndexMap<String, CallInfo>,
    ) -> Result<()> {
        for stmt in stmts {
            match stmt {
                Stmt::Wire { name, .. } | Stmt::Node { name, .. } => {
                    locals.insert(name.clone());
                }
                Stmt::Register { name, .. } => {
                    return Err(self.invalid_decl("register", name, method));
                }
                Stmt::Memory { name, .. } => {
                    return Err(self.invalid_decl("memory", name, method));
                }
                Stmt::Instance { name, .. } => {
                    return Err(self.invalid_decl("instance", name, method));
                }
                Stmt::Connect { loc, .. } => {
                    if let Some((port, field)) = loc.field_of_ref() {
                        if field == "enabled" {
                            if let Some(target) = self.call_ports.get(port) {
                                // De-duplicated, first-occurrence order.
                                calls.entry(port.to_string()).or_insert_with(|| CallInfo {
                                    callee_parent: target.parent.clone(),
                                    callee_method: target.method.clone(),
                                    caller_port: port.to_string(),
                                });
                                continue;
                            }
                        }
                    }
                    self.record_write(loc, io_port, locals, writes);
                }
                Stmt::Invalidate { loc } => {
                    self.record_write(loc, io_port, locals, writes);
                }
                Stmt::When {
                    then_body,
                    else_body,
                    ..
                } => {
                    self.walk_region(then_body, io_port, method, locals, writes, calls)?;
                    self.walk_region(else_body, io_port, method, locals, writes, calls)?;
                }
            }
        }
        Ok(())
    }

    fn record_write(
        &self,
        loc: &Expr,
        io_port: &str,
        locals: &IndexSet<String>,
        writes: &mut IndexSet<String>,
    ) {
        if let Some(root) = loc.root_ref() {
            if !locals.contains(root) && root != io_port && !self.call_ports.contains_key(root) {
                writes.insert(root.to_string());
            }
        }
    }

    fn invalid_decl(&self, kind: &'static str, name: &str, method: &str) -> ElabError {
        ElabError::InvalidDeclInMethod {
            kind,
            name: name.to_string(),
            method: method.to_string(),
            module: self.module.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veru_cir::cir::Type;

    fn io_map(entries: &[(&str, &str)]) -> IndexMap<String, String> {
        entries
            .iter()
            .map(|(p, m)| (p.to_string(), m.to_string()))
            .collect()
    }

    fn call_map(entries: &[(&str, &str, &str)]) -> IndexMap<String, CallTarget> {
        entries
            .iter()
            .map(|(port, parent, method)| {
                (
                    port.to_string(),
                    CallTarget {
                        parent: parent.to_string(),
                        method: method.to_string(),
                    },
                )
            })
            .collect()
    }

    fn enabled_region(port: &str, body: Vec<Stmt>) -> Stmt {
        Stmt::When {
            cond: Expr::path(&[port, "enabled"]),
            then_body: body,
            else_body: vec![],
        }
    }

    #[test]
    fn region_with_nonempty_else_is_not_a_method() {
        let mut module = Module::new("M");
        module.body.push(Stmt::When {
            cond: Expr::path(&["inc", "enabled"]),
            then_body: vec![],
            else_body: vec![Stmt::Connect {
                loc: Expr::reference("x"),
                expr: Expr::zero(1),
            }],
        });
        let io = io_map(&[("inc", "inc")]);
        let calls = call_map(&[]);
        let methods = MethodExtractor::new(&module, &io, &calls, &[])
            .extract()
            .unwrap();
        assert!(methods.is_empty());
    }

    #[test]
    fn writes_exclude_locals_io_port_and_call_ports() {
        let mut module = Module::new("M");
        module.body.push(enabled_region(
            "inc",
            vec![
                Stmt::Wire {
                    name: "tmp".to_string(),
                    ty: Type::Bits(4),
                },
                Stmt::Connect {
                    loc: Expr::reference("tmp"),
                    expr: Expr::zero(4),
                },
                Stmt::Connect {
                    loc: Expr::reference("value"),
                    expr: Expr::reference("tmp"),
                },
                Stmt::Connect {
                    loc: Expr::path(&["inc", "ret"]),
                    expr: Expr::reference("tmp"),
                },
                Stmt::Connect {
                    loc: Expr::path(&["call0", "arg"]),
                    expr: Expr::reference("tmp"),
                },
                Stmt::Connect {
                    loc: Expr::path(&["call0", "enabled"]),
                    expr: Expr::Literal { width: 1, value: 1 },
                },
            ],
        ));
        let io = io_map(&[("inc", "inc")]);
        let calls = call_map(&[("call0", "Inc", "inc")]);
        let methods = MethodExtractor::new(&module, &io, &calls, &[])
            .extract()
            .unwrap();

        assert_eq!(methods.len(), 1);
        let m = &methods[0];
        assert_eq!(m.name, "inc");
        let writes: Vec<&str> = m.writes.iter().map(String::as_str).collect();
        assert_eq!(writes, vec!["value"]);
        assert_eq!(m.calls.len(), 1);
        assert_eq!(m.calls[0].callee_parent, "Inc");
        assert_eq!(m.calls[0].caller_port, "call0");
    }

    #[test]
    fn repeated_enable_writes_to_one_call_port_are_deduplicated() {
        let enable = Stmt::Connect {
            loc: Expr::path(&["call0", "enabled"]),
            expr: Expr::Literal { width: 1, value: 1 },
        };
        let mut module = Module::new("M");
        module
            .body
            .push(enabled_region("foo", vec![enable.clone(), enable]));
        let io = io_map(&[("foo", "foo")]);
        let calls = call_map(&[("call0", "Inc", "inc")]);
        let methods = MethodExtractor::new(&module, &io, &calls, &[])
            .extract()
            .unwrap();
        assert_eq!(methods[0].calls.len(), 1);
    }

    #[test]
    fn register_in_method_is_an_error() {
        let mut module = Module::new("RegInMethodModule");
        module.body.push(enabled_region(
            "foo",
            vec![Stmt::Register {
                name: "r".to_string(),
                ty: Type::Bits(1),
                init: None,
            }],
        ));
        let io = io_map(&[("foo", "foo")]);
        let calls = call_map(&[]);
        let err = MethodExtractor::new(&module, &io, &calls, &[])
            .extract()
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("create a register"));
        assert!(msg.contains("in method foo of RegInMethodModule"));
    }
}
