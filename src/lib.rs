//! # qail-db2
//!
//! Compiles logical queries into IBM DB2 SQL.
//!
//! The compiler quotes identifiers the way DB2 folds them, translates
//! expressions DB2 spells differently, rewrites row windows into either
//! `OFFSET ... FETCH FIRST` or a `ROW_NUMBER()` derived table, and binds
//! parameters, inlining the ones DB2 refuses to bind.
//!
//! ## Quick Example
//!
//! ```rust
//! use qail_db2::prelude::*;
//!
//! let query = LogicalQuery::from_table("users")
//!     .column(Expr::col("id"))
//!     .filter(Predicate::value(Expr::col("name"), Lookup::IContains, "ann"))
//!     .slice(0, Some(10));
//!
//! let compiled = qail_db2::compile(&query, DialectCapabilities::db2()).unwrap();
//! assert_eq!(
//!     compiled.sql,
//!     "SELECT \"ID\" FROM \"USERS\" WHERE UPPER(\"NAME\") LIKE UPPER(?) ESCAPE '\\' FETCH FIRST 10 ROWS ONLY"
//! );
//! assert_eq!(compiled.params, vec![Value::String("%ANN%".into())]);
//! ```

pub mod ast;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod normalize;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::capabilities::{
        CaseFold, DialectCapabilities, PaginationSupport, PlaceholderStyle, ProbeError, ServerProbe,
        ServerVersion,
    };
    pub use crate::config::Config;
    pub use crate::error::*;
    pub use crate::transpiler::{CompiledQuery, Db2Compiler, Notice, ToDb2};
}

use ast::LogicalQuery;
use capabilities::DialectCapabilities;
use error::Db2Result;
use transpiler::{CompiledQuery, Db2Compiler};

/// Compile a logical query with the given capabilities.
pub fn compile(query: &LogicalQuery, caps: DialectCapabilities) -> Db2Result<CompiledQuery> {
    Db2Compiler::new(caps).compile(query)
}
