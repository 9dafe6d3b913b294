//! DB2 compiler for logical queries.
//!
//! Pipeline: validate the query, normalize its filters, translate every
//! node into a typed [`SelectStatement`], apply the row window, render, and
//! finally bind the `%s` placeholders to the driver's native markers.

pub mod binder;
pub mod conditions;
pub mod db2;
pub mod dml;
pub mod expr;
pub mod lexer;
pub mod ops;
pub mod pagination;
pub mod quote;
pub mod statement;
pub mod traits;

#[cfg(test)]
mod tests;

use serde::Serialize;

use crate::ast::{LogicalQuery, Value};
use crate::capabilities::{DialectCapabilities, PaginationSupport, ServerProbe};
use crate::error::Db2Result;

pub use binder::{Binder, BoundQuery};
pub use conditions::ParamContext;
pub use db2::Db2Generator;
pub use expr::{TranslateFn, Translator};
pub use ops::DialectOps;
pub use pagination::{Paginator, RowWindow};
pub use quote::IdentifierQuoter;
pub use statement::SelectStatement;
pub use traits::SqlGenerator;

/// A lossy rewrite the caller should know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// DISTINCT was removed because the projection contains LOB columns
    DistinctDropped { lob_columns: Vec<String> },
    /// MD5 was compiled to a SHA-256 digest
    DigestSubstituted,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::DistinctDropped { lob_columns } => write!(
                f,
                "DISTINCT dropped: projection contains LOB column(s) {}",
                lob_columns.join(", ")
            ),
            Notice::DigestSubstituted => write!(f, "MD5 replaced by a hex-encoded SHA-256 digest"),
        }
    }
}

/// Final SQL and native parameters, ready for the driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
    /// Parameters substituted into the text as literals
    pub inlined: usize,
    pub notices: Vec<Notice>,
}

/// Trait for compiling AST nodes to DB2 SQL.
pub trait ToDb2 {
    fn to_db2(&self, compiler: &Db2Compiler) -> Db2Result<CompiledQuery>;
}

impl ToDb2 for LogicalQuery {
    fn to_db2(&self, compiler: &Db2Compiler) -> Db2Result<CompiledQuery> {
        compiler.compile(self)
    }
}

pub struct Db2Compiler {
    translator: Translator,
}

impl Db2Compiler {
    pub fn new(caps: DialectCapabilities) -> Self {
        Self {
            translator: Translator::db2(caps),
        }
    }

    /// Compiler whose native pagination flag comes from probing the server.
    pub fn probed(caps: DialectCapabilities, support: &PaginationSupport, probe: &dyn ServerProbe) -> Self {
        let native = support.resolve(probe);
        Self::new(caps.with_native_pagination(native))
    }

    pub fn capabilities(&self) -> &DialectCapabilities {
        self.translator.capabilities()
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Mutable access for registering translation overrides.
    pub fn translator_mut(&mut self) -> &mut Translator {
        &mut self.translator
    }

    pub fn ops(&self) -> DialectOps<'_> {
        DialectOps::new(self.capabilities())
    }

    /// Compile a logical query to final SQL.
    pub fn compile(&self, query: &LogicalQuery) -> Db2Result<CompiledQuery> {
        let mut ctx = ParamContext::new();
        let stmt = dml::select::compile_statement(&self.translator, query, &mut ctx)?;
        self.finish(&stmt, ctx.notices)
    }

    /// Apply a row window to base SQL produced elsewhere, then bind it.
    pub fn paginate_sql(&self, sql: &str, params: Vec<Value>, low: u64, high: Option<u64>) -> Db2Result<CompiledQuery> {
        let window = RowWindow::new(low, high)?;
        let stmt = SelectStatement::parse(sql, params)?;
        let stmt = Paginator::new(self.capabilities(), self.translator.generator()).apply(stmt, window)?;
        self.finish(&stmt, Vec::new())
    }

    /// Bind a `%s` template without compiling anything.
    pub fn bind(&self, sql: &str, params: &[Value]) -> Db2Result<BoundQuery> {
        Binder::new(self.translator.generator()).bind(sql, params)
    }

    fn finish(&self, stmt: &SelectStatement, notices: Vec<Notice>) -> Db2Result<CompiledQuery> {
        let (template, params) = stmt.render();
        let bound = self.bind(&template, &params)?;
        tracing::debug!("Compiled: {}", bound.sql);
        Ok(CompiledQuery {
            sql: bound.sql,
            params: bound.params,
            inlined: bound.inlined,
            notices,
        })
    }
}

impl Default for Db2Compiler {
    fn default() -> Self {
        Self::new(DialectCapabilities::default())
    }
}
