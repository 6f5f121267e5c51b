//! CollectCalls - the top-level elaboration pass
//!
//! Consumes a circuit plus its method annotations, traverses the untimed
//! module hierarchy leaves-first, and produces the rewritten circuit with
//! submodule instances declared, defaults inserted and call ports wired,
//! together with the bottom-up module summaries. Method-IO and Method-Call
//! annotations are consumed; everything else passes through unchanged.
//!
//! The pass is a pure transformation on immutable IR values: given
//! identical inputs the output is byte-identical, and the first structural
//! violation aborts it with no partial output.

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use veru_cir::annotations::Annotation;
use veru_cir::cir::{Circuit, Module, Stmt};
use veru_cir::namespace::Namespace;

use crate::error::{ElabError, Result};
use crate::extract::{CallTarget, MethodExtractor};
use crate::plan::plan_instances;
use crate::rewrite::rewrite_module;
use crate::scan::scan_state;
use crate::summary::{MethodInfo, StateRef, UntimedModuleInfo};
use crate::validate;

/// The CollectCalls pass
#[derive(Debug, Clone, Default)]
pub struct CollectCalls {
    /// Submodules requested to be abstracted; must be empty
    abstracted: IndexSet<String>,
}

/// Output of a successful pass run
#[derive(Debug, Clone)]
pub struct ElabResult {
    /// The rewritten circuit
    pub circuit: Circuit,
    /// The annotation list with all method metadata removed
    pub annotations: Vec<Annotation>,
    /// Summary of the main module, when the main module is untimed
    pub info: Option<UntimedModuleInfo>,
}

/// Method metadata resolved from the annotation stream
struct PassCtx {
    /// module -> (port -> method name)
    method_io: IndexMap<String, IndexMap<String, String>>,
    /// module -> (caller port -> callee)
    call_targets: IndexMap<String, IndexMap<String, CallTarget>>,
    empty_calls: IndexMap<String, CallTarget>,
}

/// Per-module facts computed once in the prepass
#[derive(Default)]
struct ModuleFacts {
    state: IndexMap<String, Vec<StateRef>>,
    methods: IndexMap<String, Vec<MethodInfo>>,
}

impl PassCtx {
    fn from_annotations(annotations: &[Annotation]) -> Self {
        let mut method_io: IndexMap<String, IndexMap<String, String>> = IndexMap::new();
        let mut call_targets: IndexMap<String, IndexMap<String, CallTarget>> = IndexMap::new();
        for annotation in annotations {
            match annotation {
                Annotation::MethodIo(io) => {
                    method_io
                        .entry(io.module.clone())
                        .or_default()
                        .insert(io.port.clone(), io.method.clone());
                }
                Annotation::MethodCall(call) => {
                    // Arg and Ret roles of one call site share the port.
                    call_targets
                        .entry(call.caller_module.clone())
                        .or_default()
                        .entry(call.caller_port.clone())
                        .or_insert_with(|| CallTarget {
                            parent: call.callee_parent.clone(),
                            method: call.callee_method.clone(),
                        });
                }
                _ => {}
            }
        }
        Self {
            method_io,
            call_targets,
            empty_calls: IndexMap::new(),
        }
    }

    fn is_untimed(&self, module: &str) -> bool {
        self.method_io.contains_key(module)
    }

    fn call_ports(&self, module: &str) -> &IndexMap<String, CallTarget> {
        self.call_targets.get(module).unwrap_or(&self.empty_calls)
    }

    fn untimed_set(&self) -> IndexSet<String> {
        self.method_io.keys().cloned().collect()
    }
}

impl CollectCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a set of submodules to be abstracted. Only the empty set is
    /// currently accepted.
    pub fn with_abstracted<I>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.abstracted.extend(modules);
        self
    }

    /// Run the pass on a circuit and its annotation stream
    pub fn run(&self, circuit: &Circuit, annotations: &[Annotation]) -> Result<ElabResult> {
        if !self.abstracted.is_empty() {
            return Err(ElabError::UnsupportedAbstraction);
        }

        let ctx = PassCtx::from_annotations(annotations);
        let untimed = ctx.untimed_set();
        debug!(
            circuit = %circuit.name,
            untimed_modules = untimed.len(),
            "collecting calls"
        );

        // Prepass: extract every untimed module's methods, then run the
        // program-wide checks over the complete method set.
        let mut facts = ModuleFacts::default();
        for module in &circuit.modules {
            if let Some(io_ports) = ctx.method_io.get(&module.name) {
                let state = scan_state(&module.body);
                let methods =
                    MethodExtractor::new(module, io_ports, ctx.call_ports(&module.name), &state)
                        .extract()?;
                facts.state.insert(module.name.clone(), state);
                facts.methods.insert(module.name.clone(), methods);
            }
        }
        validate::check_no_recursion(&facts.methods)?;
        validate::check_only_submodule_calls(annotations)?;

        // Bottom-up traversal: children are fully analyzed and rewritten
        // before their parent.
        let mut done: IndexMap<String, (Module, UntimedModuleInfo)> = IndexMap::new();
        let mut active: Vec<String> = Vec::new();
        let mut main_info = None;
        if ctx.is_untimed(&circuit.name) {
            main_info = Some(self.process(
                &circuit.name,
                circuit,
                &ctx,
                &untimed,
                &facts,
                &mut done,
                &mut active,
            )?);
        }
        for module in &circuit.modules {
            if ctx.is_untimed(&module.name) && !done.contains_key(&module.name) {
                self.process(
                    &module.name,
                    circuit,
                    &ctx,
                    &untimed,
                    &facts,
                    &mut done,
                    &mut active,
                )?;
            }
        }

        let modules = circuit
            .modules
            .iter()
            .map(|m| match done.get(&m.name) {
                Some((rewritten, _)) => rewritten.clone(),
                None => m.clone(),
            })
            .collect();
        let annotations = annotations
            .iter()
            .filter(|a| !a.is_method_meta())
            .cloned()
            .collect();

        Ok(ElabResult {
            circuit: Circuit {
                name: circuit.name.clone(),
                modules,
            },
            annotations,
            info: main_info,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn process(
        &self,
        name: &str,
        circuit: &Circuit,
        ctx: &PassCtx,
        untimed: &IndexSet<String>,
        facts: &ModuleFacts,
        done: &mut IndexMap<String, (Module, UntimedModuleInfo)>,
        active: &mut Vec<String>,
    ) -> Result<UntimedModuleInfo> {
        if let Some((_, info)) = done.get(name) {
            return Ok(info.clone());
        }
        // A module-hierarchy cycle is hardware recursion; the call-graph
        // check normally reports it first.
        if active.iter().any(|n| n == name) {
            return Err(ElabError::RecursiveCall);
        }
        active.push(name.to_string());

        let module = circuit
            .find_module(name)
            .expect("untimed module exists in the circuit");
        let declared = untimed_children(&module.body, untimed);
        let mut submodules = Vec::new();
        for child_module in declared.keys() {
            submodules.push(self.process(child_module, circuit, ctx, untimed, facts, done, active)?);
        }
        active.pop();

        debug!(module = %name, children = submodules.len(), "elaborating untimed module");
        let info = UntimedModuleInfo {
            name: name.to_string(),
            local_state: facts.state.get(name).cloned().unwrap_or_default(),
            methods: facts.methods.get(name).cloned().unwrap_or_default(),
            submodules,
        };
        validate::validate_module(&info)?;

        let mut ns = Namespace::from_module(module);
        let plan = plan_instances(&info, &declared, &mut ns);
        let rewritten = rewrite_module(module, &info, &plan, ctx.call_ports(name), circuit, untimed);
        done.insert(name.to_string(), (rewritten, info.clone()));
        Ok(info)
    }
}

/// The direct untimed children of a module body: child module name ->
/// front-end instance name, in declaration order
fn untimed_children(body: &[Stmt], untimed: &IndexSet<String>) -> IndexMap<String, String> {
    let mut declared = IndexMap::new();
    collect_children(body, untimed, &mut declared);
    declared
}

fn collect_children(
    stmts: &[Stmt],
    untimed: &IndexSet<String>,
    out: &mut IndexMap<String, String>,
) {
    for stmt in stmts {
        match stmt {
            Stmt::Instance { name, module } if untimed.contains(module) => {
                if !out.contains_key(module) {
                    out.insert(module.clone(), name.clone());
                } else {
                    debug!(
                        module = %module,
                        instance = %name,
                        "duplicate untimed submodule instance; keeping the first"
                    );
                }
            }
            Stmt::When {
                then_body,
                else_body,
                ..
            } => {
                collect_children(then_body, untimed, out);
                collect_children(else_body, untimed, out);
            }
            _ => {}
        }
    }
}
