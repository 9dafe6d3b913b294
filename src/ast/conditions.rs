use serde::{Deserialize, Serialize};

use crate::ast::{Expr, LogicalOp, LogicalQuery, Lookup, Value};

/// Right-hand operand of a predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// No operand (IS NULL carries its polarity in a value)
    None,
    /// A literal value, bound as a parameter
    Value(Value),
    /// An expression
    Expr(Expr),
    /// A sub-query
    Subquery(Box<LogicalQuery>),
    /// A list of values (IN, BETWEEN)
    Values(Vec<Value>),
    /// Candidate row tuples (tuple IN / tuple exact)
    Tuples(Vec<Vec<Value>>),
}

/// A single leaf predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    /// Left operand; `Expr::Tuple` for tuple lookups
    pub lhs: Expr,
    pub lookup: Lookup,
    pub rhs: Operand,
}

impl Predicate {
    pub fn new(lhs: Expr, lookup: Lookup, rhs: Operand) -> Self {
        Self { lhs, lookup, rhs }
    }

    /// `lhs <lookup> value` with a literal right side.
    pub fn value(lhs: Expr, lookup: Lookup, value: impl Into<Value>) -> Self {
        Self::new(lhs, lookup, Operand::Value(value.into()))
    }
}

/// Filter tree: nested boolean groups of predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    Leaf(Predicate),
    Group {
        op: LogicalOp,
        children: Vec<Filter>,
        #[serde(default)]
        negated: bool,
    },
}

impl Filter {
    pub fn and(children: Vec<Filter>) -> Self {
        Filter::Group {
            op: LogicalOp::And,
            children,
            negated: false,
        }
    }

    pub fn or(children: Vec<Filter>) -> Self {
        Filter::Group {
            op: LogicalOp::Or,
            children,
            negated: false,
        }
    }

    /// Negate this node, wrapping leaves in a single-child group.
    pub fn not(self) -> Self {
        match self {
            Filter::Group {
                op,
                children,
                negated,
            } => Filter::Group {
                op,
                children,
                negated: !negated,
            },
            leaf => Filter::Group {
                op: LogicalOp::And,
                children: vec![leaf],
                negated: true,
            },
        }
    }

    /// Predicates in depth-first order.
    pub fn predicates(&self) -> Vec<&Predicate> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Predicate>) {
        match self {
            Filter::Leaf(p) => out.push(p),
            Filter::Group { children, .. } => {
                for child in children {
                    child.collect(out);
                }
            }
        }
    }
}

impl From<Predicate> for Filter {
    fn from(p: Predicate) -> Self {
        Filter::Leaf(p)
    }
}
