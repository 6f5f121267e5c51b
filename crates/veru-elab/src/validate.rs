//! Structural validator
//!
//! Per-module rules (run after the module's children are fully summarized):
//! every callee must be a method of a direct submodule, and a single method
//! may invoke at most one method of any stateful submodule. Program-wide
//! rules (run once at the pass entry, where the complete method set is
//! visible): no call may target the enclosing module itself, and the
//! inter-method call graph must be acyclic.

use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use veru_cir::annotations::Annotation;

use crate::error::{ElabError, Result};
use crate::summary::{CallInfo, MethodInfo, UntimedModuleInfo};

/// Enforce the per-module rules on a freshly built summary
pub fn validate_module(info: &UntimedModuleInfo) -> Result<()> {
    for method in &info.methods {
        let mut groups: IndexMap<&str, Vec<&CallInfo>> = IndexMap::new();
        for call in &method.calls {
            groups
                .entry(call.callee_parent.as_str())
                .or_default()
                .push(call);
        }
        for (parent, calls) in &groups {
            let child = info.find_submodule(parent).ok_or_else(|| ElabError::UnknownCallee {
                module: info.name.clone(),
                callee: (*parent).to_string(),
            })?;
            for call in calls {
                if child.find_method(&call.callee_method).is_none() {
                    return Err(ElabError::UnknownCallee {
                        module: info.name.clone(),
                        callee: format!("{}.{}", parent, call.callee_method),
                    });
                }
            }
            if child.has_state() && calls.len() > 1 {
                let detected = calls
                    .iter()
                    .map(|c| c.callee_method.clone())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(ElabError::StatefulCallNonDeterminism {
                    module: info.name.clone(),
                    method: method.name.clone(),
                    submodule: (*parent).to_string(),
                    calls: detected,
                });
            }
        }
    }
    Ok(())
}

/// Reject any cycle in the inter-method call graph, self-calls included
pub fn check_no_recursion(methods: &IndexMap<String, Vec<MethodInfo>>) -> Result<()> {
    let mut graph: DiGraph<(), ()> = DiGraph::new();
    let mut nodes: IndexMap<(String, String), NodeIndex> = IndexMap::new();

    for (module, module_methods) in methods {
        for method in module_methods {
            intern(&mut graph, &mut nodes, module, &method.name);
        }
    }
    for (module, module_methods) in methods {
        for method in module_methods {
            let src = intern(&mut graph, &mut nodes, module, &method.name);
            for call in &method.calls {
                let dst = intern(&mut graph, &mut nodes, &call.callee_parent, &call.callee_method);
                graph.add_edge(src, dst, ());
            }
        }
    }

    toposort(&graph, None)
        .map(|_| ())
        .map_err(|_| ElabError::RecursiveCall)
}

fn intern(
    graph: &mut DiGraph<(), ()>,
    nodes: &mut IndexMap<(String, String), NodeIndex>,
    module: &str,
    method: &str,
) -> NodeIndex {
    let key = (module.to_string(), method.to_string());
    if let Some(&ix) = nodes.get(&key) {
        return ix;
    }
    let ix = graph.add_node(());
    nodes.insert(key, ix);
    ix
}

/// Reject call annotations whose callee parent is the caller module itself
pub fn check_only_submodule_calls(annotations: &[Annotation]) -> Result<()> {
    for annotation in annotations {
        if let Annotation::MethodCall(call) = annotation {
            if call.callee_parent == call.caller_module {
                return Err(ElabError::IntraModuleCall {
                    module: call.caller_module.clone(),
                });
            }
        }
    }
    Ok(())
}
