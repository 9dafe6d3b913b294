//! Logical query representation consumed by the compiler.
//!
//! The tree is owned: expressions and predicates belong to exactly one
//! query, so compilation is a plain recursive walk.

pub mod conditions;
pub mod expr;
pub mod operators;
pub mod query;
pub mod values;

pub use conditions::*;
pub use expr::*;
pub use operators::*;
pub use query::*;
pub use values::*;
