//! Case-insensitive filter normalization.
//!
//! Literal operands of `iexact`, `icontains`, `istartswith` and `iendswith`
//! are upper-cased ahead of compilation; the compiled SQL upper-cases the
//! column side. Expression and sub-query operands are left alone.

use crate::ast::{Filter, Operand, Predicate};

/// Return a normalized copy of `filter`. The input is not modified.
pub fn normalize_filter(filter: &Filter) -> Filter {
    match filter {
        Filter::Leaf(p) => Filter::Leaf(normalize_predicate(p)),
        Filter::Group {
            op,
            children,
            negated,
        } => Filter::Group {
            op: *op,
            children: children.iter().map(normalize_filter).collect(),
            negated: *negated,
        },
    }
}

pub fn normalize_predicate(p: &Predicate) -> Predicate {
    if !p.lookup.is_case_insensitive() {
        return p.clone();
    }
    let rhs = match &p.rhs {
        Operand::Value(v) => Operand::Value(v.to_uppercase().unwrap_or_else(|| v.clone())),
        other => other.clone(),
    };
    Predicate {
        lhs: p.lhs.clone(),
        lookup: p.lookup,
        rhs,
    }
}
