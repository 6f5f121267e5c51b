//! Rewriter
//!
//! Emits the rewritten module body: instance declarations first, then
//! per-instance and per-call-port default connections, then the wiring of
//! each call site to its bound instance, then the original body. Defaults
//! precede the original statements so that the connections inside a method
//! region override them under last-connect semantics.

use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use tracing::trace;

use veru_cir::cir::{Circuit, Expr, Module, Stmt};

use crate::extract::CallTarget;
use crate::plan::InstancePlan;
use crate::summary::{MethodIoShape, UntimedModuleInfo};

/// Rewrite one module according to its summary and instance plan.
///
/// `call_ports` are this module's caller-side ports; `untimed` is the set of
/// module names bound by Method-IO annotations (their front-end instance
/// declarations are replaced by the plan's declarations).
pub fn rewrite_module(
    module: &Module,
    info: &UntimedModuleInfo,
    plan: &InstancePlan,
    call_ports: &IndexMap<String, CallTarget>,
    circuit: &Circuit,
    untimed: &IndexSet<String>,
) -> Module {
    let mut body = Vec::new();

    // Instance declarations and their default connections.
    for (child_module, child_plan) in &plan.children {
        let child_info = info
            .find_submodule(child_module)
            .expect("planned submodule has a summary");
        let child_def = circuit
            .find_module(child_module)
            .expect("planned submodule exists in the circuit");
        for instance in &child_plan.instances {
            body.push(Stmt::Instance {
                name: instance.clone(),
                module: child_module.clone(),
            });
            body.push(connect(
                Expr::path(&[instance, "clock"]),
                Expr::reference("clock"),
            ));
            body.push(connect(
                Expr::path(&[instance, "reset"]),
                Expr::reference("reset"),
            ));
            for method in &child_info.methods {
                body.push(connect(
                    Expr::path(&[instance, &method.io_port, "enabled"]),
                    Expr::zero(1),
                ));
                if io_shape(child_def, &method.io_port).has_arg() {
                    body.push(Stmt::Invalidate {
                        loc: Expr::path(&[instance, &method.io_port, "arg"]),
                    });
                }
            }
        }
    }

    // Default connections for this module's call ports, in port order.
    for port in &module.ports {
        if !call_ports.contains_key(&port.name) {
            continue;
        }
        body.push(connect(
            Expr::path(&[&port.name, "enabled"]),
            Expr::zero(1),
        ));
        let has_arg = port
            .ty
            .field("arg")
            .map(|f| !f.ty.is_zero_width())
            .unwrap_or(false);
        if has_arg {
            body.push(Stmt::Invalidate {
                loc: Expr::path(&[&port.name, "arg"]),
            });
        }
    }

    // Call-site wiring. The k-th textual occurrence of a callee within a
    // method binds to the k-th allocated copy.
    for method in &info.methods {
        let mut occurrences: HashMap<(&str, &str), usize> = HashMap::new();
        for call in &method.calls {
            let occurrence = occurrences
                .entry((call.callee_parent.as_str(), call.callee_method.as_str()))
                .or_insert(0);
            let copy = *occurrence;
            *occurrence += 1;

            let instance = plan
                .instance_for(&call.callee_parent, copy)
                .expect("call site bound to an allocated instance");
            let child_info = info
                .find_submodule(&call.callee_parent)
                .expect("callee parent has a summary");
            let callee = child_info
                .find_method(&call.callee_method)
                .expect("callee method exists in the child summary");
            let child_def = circuit
                .find_module(&call.callee_parent)
                .expect("callee parent exists in the circuit");
            let shape = io_shape(child_def, &callee.io_port);

            trace!(
                module = %module.name,
                method = %method.name,
                port = %call.caller_port,
                instance = %instance,
                "binding call site"
            );
            body.push(connect(
                Expr::path(&[instance, &callee.io_port, "enabled"]),
                Expr::path(&[&call.caller_port, "enabled"]),
            ));
            if shape.has_arg() {
                body.push(connect(
                    Expr::path(&[instance, &callee.io_port, "arg"]),
                    Expr::path(&[&call.caller_port, "arg"]),
                ));
            }
            if shape.has_ret() {
                body.push(connect(
                    Expr::path(&[&call.caller_port, "ret"]),
                    Expr::path(&[instance, &callee.io_port, "ret"]),
                ));
            }
        }
    }

    // The original body, minus the front-end's untimed-child instance
    // declarations (re-declared above).
    for stmt in &module.body {
        match stmt {
            Stmt::Instance { module: child, .. } if untimed.contains(child) => {}
            _ => body.push(stmt.clone()),
        }
    }

    Module {
        name: module.name.clone(),
        ports: module.ports.clone(),
        body,
    }
}

fn connect(loc: Expr, expr: Expr) -> Stmt {
    Stmt::Connect { loc, expr }
}

fn io_shape(module: &Module, port: &str) -> MethodIoShape {
    module
        .find_port(port)
        .map(|p| MethodIoShape::of_port(&p.ty))
        .unwrap_or(MethodIoShape::NoArgNoRet)
}
