//! Deterministic text rendering of the circuit IR
//!
//! Used for logs and test diffs. This is not a parsed format; the output is
//! stable for identical inputs but carries no version guarantee.

use std::fmt;

use crate::cir::{BinaryOp, Circuit, Direction, Expr, Module, Stmt, Type};

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "circuit {} :", self.name)?;
        for module in &self.modules {
            write_module(f, module, 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_module(f, self, 0)
    }
}

fn indent(f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
    for _ in 0..level {
        write!(f, "  ")?;
    }
    Ok(())
}

fn write_module(f: &mut fmt::Formatter<'_>, module: &Module, level: usize) -> fmt::Result {
    indent(f, level)?;
    writeln!(f, "module {} :", module.name)?;
    for port in &module.ports {
        indent(f, level + 1)?;
        let dir = match port.direction {
            Direction::Input => "input",
            Direction::Output => "output",
        };
        writeln!(f, "{} {} : {}", dir, port.name, port.ty)?;
    }
    write_stmts(f, &module.body, level + 1)
}

fn write_stmts(f: &mut fmt::Formatter<'_>, stmts: &[Stmt], level: usize) -> fmt::Result {
    for stmt in stmts {
        write_stmt(f, stmt, level)?;
    }
    Ok(())
}

fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt, level: usize) -> fmt::Result {
    indent(f, level)?;
    match stmt {
        Stmt::Register { name, ty, init } => {
            write!(f, "reg {} : {}", name, ty)?;
            if let Some(init) = init {
                write!(f, " init {}", init)?;
            }
            writeln!(f)
        }
        Stmt::Memory { name, elem, depth } => {
            writeln!(f, "mem {} : {}[{}]", name, elem, depth)
        }
        Stmt::Wire { name, ty } => writeln!(f, "wire {} : {}", name, ty),
        Stmt::Node { name, value } => writeln!(f, "node {} = {}", name, value),
        Stmt::Instance { name, module } => writeln!(f, "inst {} of {}", name, module),
        Stmt::Connect { loc, expr } => writeln!(f, "{} <= {}", loc, expr),
        Stmt::Invalidate { loc } => writeln!(f, "{} is invalid", loc),
        Stmt::When {
            cond,
            then_body,
            else_body,
        } => {
            writeln!(f, "when {} :", cond)?;
            write_stmts(f, then_body, level + 1)?;
            if !else_body.is_empty() {
                indent(f, level)?;
                writeln!(f, "else :")?;
                write_stmts(f, else_body, level + 1)?;
            }
            Ok(())
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bits(width) => write!(f, "UInt<{}>", width),
            Type::Vector { elem, len } => write!(f, "{}[{}]", elem, len),
            Type::Bundle(fields) => {
                write!(f, "{{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if field.flip {
                        write!(f, "flip ")?;
                    }
                    write!(f, "{} : {}", field.name, field.ty)?;
                }
                write!(f, " }}")
            }
            Type::Clock => write!(f, "Clock"),
            Type::Reset => write!(f, "Reset"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ref(name) => write!(f, "{}", name),
            Expr::Field { base, name } => write!(f, "{}.{}", base, name),
            Expr::Literal { width, value } => write!(f, "UInt<{}>({})", width, value),
            Expr::Binary { op, lhs, rhs } => {
                let op = match op {
                    BinaryOp::Add => "add",
                    BinaryOp::Sub => "sub",
                    BinaryOp::And => "and",
                    BinaryOp::Or => "or",
                    BinaryOp::Xor => "xor",
                    BinaryOp::Eq => "eq",
                };
                write!(f, "{}({}, {})", op, lhs, rhs)
            }
            Expr::Not(e) => write!(f, "not({})", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expressions_render_compactly() {
        let e = Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(Expr::path(&["inc", "arg"])),
            rhs: Box::new(Expr::Literal { width: 32, value: 1 }),
        };
        assert_eq!(e.to_string(), "add(inc.arg, UInt<32>(1))");
    }

    #[test]
    fn statements_render_one_per_line() {
        let mut m = Module::new("M");
        m.body.push(Stmt::Instance {
            name: "ii".to_string(),
            module: "Inc".to_string(),
        });
        m.body.push(Stmt::Connect {
            loc: Expr::path(&["ii", "clock"]),
            expr: Expr::reference("clock"),
        });
        let text = m.to_string();
        assert!(text.contains("inst ii of Inc\n"));
        assert!(text.contains("ii.clock <= clock\n"));
    }
}
