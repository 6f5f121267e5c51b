//! Instance planner
//!
//! Decides, per direct untimed submodule, how many physical instances the
//! rewritten parent declares. A stateful submodule gets exactly one copy so
//! its state evolves coherently; a stateless submodule is semantically pure
//! and is duplicated to allow multiple concurrent invocations.

use indexmap::IndexMap;
use tracing::trace;

use veru_cir::namespace::Namespace;

use crate::summary::{MethodInfo, UntimedModuleInfo};

/// Materialization plan for one submodule
#[derive(Debug, Clone, PartialEq)]
pub struct ChildPlan {
    /// Instance names, in allocation order; the first is the front-end's
    /// chosen name
    pub instances: Vec<String>,
}

/// Materialization plan for one module's submodules
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstancePlan {
    /// Child module name -> plan, in parent-body declaration order.
    /// Submodules that are never called (and are stateless) are absent.
    pub children: IndexMap<String, ChildPlan>,
}

impl InstancePlan {
    /// Instance bound to the given occurrence of a call to `child`
    pub fn instance_for(&self, child: &str, occurrence: usize) -> Option<&str> {
        self.children
            .get(child)
            .and_then(|p| p.instances.get(occurrence))
            .map(String::as_str)
    }
}

/// Compute the plan for `info`'s submodules.
///
/// `declared` maps each direct untimed child module to the front-end's
/// instance name, in declaration order. Fresh names for duplicated copies
/// are drawn from `ns`.
pub fn plan_instances(
    info: &UntimedModuleInfo,
    declared: &IndexMap<String, String>,
    ns: &mut Namespace,
) -> InstancePlan {
    let mut children = IndexMap::new();
    for (child_module, fe_name) in declared {
        let Some(child) = info.find_submodule(child_module) else {
            continue;
        };
        let instances = if child.has_state() {
            vec![fe_name.clone()]
        } else {
            let k = info
                .methods
                .iter()
                .map(|m| max_call_count(m, child_module))
                .max()
                .unwrap_or(0);
            if k == 0 {
                trace!(
                    module = %info.name,
                    child = %child_module,
                    "stateless submodule is never called; not materialized"
                );
                continue;
            }
            let mut names = vec![fe_name.clone()];
            for _ in 1..k {
                names.push(ns.fresh(fe_name));
            }
            names
        };
        children.insert(child_module.clone(), ChildPlan { instances });
    }
    InstancePlan { children }
}

/// Largest per-callee-method call count from `method` into `child`
fn max_call_count(method: &MethodInfo, child: &str) -> usize {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for call in method.calls.iter().filter(|c| c.callee_parent == child) {
        *counts.entry(call.callee_method.as_str()).or_insert(0) += 1;
    }
    counts.values().copied().max().unwrap_or(0)
}
