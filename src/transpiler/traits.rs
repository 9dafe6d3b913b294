//! Transpiler traits.

use crate::error::Db2Result;

/// Trait for dialect-specific SQL generation.
pub trait SqlGenerator: Send + Sync {
    /// Quote an identifier with an optional table/alias qualifier.
    fn quote_qualified(&self, qualifier: Option<&str>, name: &str) -> Db2Result<String>;
    /// Generate the native bind marker for a 1-based parameter index.
    fn placeholder(&self, index: usize) -> String;
    /// Pattern matching operator.
    fn fuzzy_operator(&self) -> &str;
    /// Escape character declared on every pattern match.
    fn like_escape(&self) -> char;
    /// Generate string concatenation expression.
    fn string_concat(&self, parts: &[&str]) -> String;
    /// Native row window clause for a zero-based offset and exclusive upper bound.
    fn limit_offset(&self, low: u64, high: Option<u64>) -> String;
    /// Random number function.
    fn random_function(&self) -> &str;
}
