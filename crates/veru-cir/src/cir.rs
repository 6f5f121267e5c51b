//! CIR - Circuit Intermediate Representation
//!
//! This represents hardware designs at the level the elaboration passes
//! consume and produce:
//! - modules with typed bit-vector and bundle ports
//! - a statement tree (declarations, connections, conditional regions)
//! - references, sub-field accesses and literals as expressions
//!
//! The representation follows last-connect semantics: a later connection to
//! an lvalue overrides an earlier one, and a conditional region scopes its
//! connections to the region's predicate.

use serde::{Deserialize, Serialize};

/// A complete circuit: a set of modules, one designated as the main module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the main module
    pub name: String,
    /// All modules in the circuit, main included
    pub modules: Vec<Module>,
}

/// A hardware module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Module name (unique within a circuit)
    pub name: String,
    /// Input/output ports, in declaration order
    pub ports: Vec<Port>,
    /// The statement tree making up the module body
    pub body: Vec<Stmt>,
}

/// Port of a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Port name
    pub name: String,
    /// Port direction
    pub direction: Direction,
    /// Port type
    pub ty: Type,
    /// Source-location tag carried through from the front-end
    pub info: Option<String>,
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Input,
    Output,
}

/// Types in the circuit IR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    /// Bit vector of the given width; a zero width is legal and denotes an
    /// absent value (e.g. a method without an argument)
    Bits(u32),
    /// Fixed-length vector of a single element type
    Vector { elem: Box<Type>, len: u64 },
    /// Bundle of named sub-fields
    Bundle(Vec<Field>),
    /// Clock signal
    Clock,
    /// Reset signal
    Reset,
}

/// Sub-field of a bundle type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Whether the field's orientation is flipped relative to the bundle
    pub flip: bool,
    /// Field type
    pub ty: Type,
}

/// Statement in a module body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Register declaration
    Register {
        name: String,
        ty: Type,
        /// Reset value, if the register has one
        init: Option<Expr>,
    },
    /// Memory declaration: `depth` elements of type `elem`
    Memory { name: String, elem: Type, depth: u64 },
    /// Wire declaration
    Wire { name: String, ty: Type },
    /// Named expression
    Node { name: String, value: Expr },
    /// Instance of another module
    Instance { name: String, module: String },
    /// Connection: drive `loc` with `expr`
    Connect { loc: Expr, expr: Expr },
    /// Mark `loc` as driven with an unknown value
    Invalidate { loc: Expr },
    /// Conditional region
    When {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
}

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Reference to a port, wire, node, register, memory or instance
    Ref(String),
    /// Sub-field access on a bundle-typed expression
    Field { base: Box<Expr>, name: String },
    /// Bit-vector literal
    Literal { width: u32, value: u64 },
    /// Binary operation
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Bitwise complement
    Not(Box<Expr>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Eq,
}

impl Circuit {
    /// Create a new circuit with the given main module name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: Vec::new(),
        }
    }

    /// Look up a module by name
    pub fn find_module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }
}

impl Module {
    /// Create a new empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ports: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Look up a port by name
    pub fn find_port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }
}

impl Type {
    /// Whether a value of this type carries no bits
    pub fn is_zero_width(&self) -> bool {
        matches!(self, Type::Bits(0))
    }

    /// Look up a sub-field of a bundle type
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self {
            Type::Bundle(fields) => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }
}

impl Stmt {
    /// The name this statement introduces, if it is a declaration
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            Stmt::Register { name, .. }
            | Stmt::Memory { name, .. }
            | Stmt::Wire { name, .. }
            | Stmt::Node { name, .. }
            | Stmt::Instance { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl Expr {
    /// `ref(name)`
    pub fn reference(name: impl Into<String>) -> Self {
        Expr::Ref(name.into())
    }

    /// Sub-field access built on top of `self`
    pub fn field(self, name: impl Into<String>) -> Self {
        Expr::Field {
            base: Box::new(self),
            name: name.into(),
        }
    }

    /// A reference path `segments[0].segments[1]...`
    pub fn path(segments: &[&str]) -> Self {
        let mut it = segments.iter();
        let mut e = Expr::reference(*it.next().expect("empty reference path"));
        for seg in it {
            e = e.field(*seg);
        }
        e
    }

    /// Zero literal of the given width
    pub fn zero(width: u32) -> Self {
        Expr::Literal { width, value: 0 }
    }

    /// The first segment of a reference path, e.g. `r` for `r.field.sub`.
    /// `None` for anything that is not a reference path.
    pub fn root_ref(&self) -> Option<&str> {
        match self {
            Expr::Ref(name) => Some(name),
            Expr::Field { base, .. } => base.root_ref(),
            _ => None,
        }
    }

    /// Match the one-level shape `ref(base).field` and return `(base, field)`
    pub fn field_of_ref(&self) -> Option<(&str, &str)> {
        match self {
            Expr::Field { base, name } => match base.as_ref() {
                Expr::Ref(port) => Some((port, name)),
                _ => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_ref_walks_field_chains() {
        let e = Expr::path(&["ii", "inc", "enabled"]);
        assert_eq!(e.root_ref(), Some("ii"));
        assert_eq!(Expr::zero(4).root_ref(), None);
    }

    #[test]
    fn field_of_ref_matches_one_level_only() {
        assert_eq!(
            Expr::path(&["inc", "enabled"]).field_of_ref(),
            Some(("inc", "enabled"))
        );
        assert_eq!(Expr::path(&["ii", "inc", "enabled"]).field_of_ref(), None);
        assert_eq!(Expr::reference("inc").field_of_ref(), None);
    }

    #[test]
    fn declared_names() {
        let s = Stmt::Instance {
            name: "ii".to_string(),
            module: "Inc".to_string(),
        };
        assert_eq!(s.declared_name(), Some("ii"));
        let c = Stmt::Connect {
            loc: Expr::reference("a"),
            expr: Expr::zero(1),
        };
        assert_eq!(c.declared_name(), None);
    }
}
