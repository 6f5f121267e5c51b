//! State scanner
//!
//! Enumerates the register and memory declarations of a module body in
//! depth-first textual order, including both branches of conditional
//! regions. Instance declarations are not state; stateful submodules are
//! accounted for transitively through the module summaries.

use veru_cir::cir::{Stmt, Type};

use crate::summary::StateRef;

/// Collect all register and memory declarations in `body`
pub fn scan_state(body: &[Stmt]) -> Vec<StateRef> {
    let mut state = Vec::new();
    walk(body, &mut state);
    state
}

fn walk(stmts: &[Stmt], state: &mut Vec<StateRef>) {
    for stmt in stmts {
        match stmt {
            Stmt::Register { name, ty, .. } => state.push(StateRef {
                name: name.clone(),
                ty: ty.clone(),
            }),
            Stmt::Memory { name, elem, depth } => state.push(StateRef {
                name: name.clone(),
                ty: Type::Vector {
                    elem: Box::new(elem.clone()),
                    len: *depth,
                },
            }),
            Stmt::When {
                then_body,
                else_body,
                ..
            } => {
                walk(then_body, state);
                walk(else_body, state);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veru_cir::cir::Expr;

    #[test]
    fn finds_registers_and_memories_in_order() {
        let body = vec![
            Stmt::Register {
                name: "value".to_string(),
                ty: Type::Bits(4),
                init: Some(Expr::zero(4)),
            },
            Stmt::When {
                cond: Expr::reference("sel"),
                then_body: vec![Stmt::Memory {
                    name: "buf".to_string(),
                    elem: Type::Bits(5),
                    depth: 12,
                }],
                else_body: vec![Stmt::Register {
                    name: "shadow".to_string(),
                    ty: Type::Bits(1),
                    init: None,
                }],
            },
            Stmt::Instance {
                name: "ii".to_string(),
                module: "Inc".to_string(),
            },
        ];

        let state = scan_state(&body);
        let names: Vec<&str> = state.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["value", "buf", "shadow"]);
    }

    #[test]
    fn memory_state_entry_is_a_vector_of_elements() {
        let body = vec![Stmt::Memory {
            name: "buf".to_string(),
            elem: Type::Bits(5),
            depth: 12,
        }];
        let state = scan_state(&body);
        assert_eq!(
            state[0].ty,
            Type::Vector {
                elem: Box::new(Type::Bits(5)),
                len: 12,
            }
        );
    }

    #[test]
    fn instances_are_not_state() {
        let body = vec![Stmt::Instance {
            name: "ii".to_string(),
            module: "Inc".to_string(),
        }];
        assert!(scan_state(&body).is_empty());
    }
}
