//! Compiler test modules.
//!
//! - `pagination`: row windows, native and emulated
//! - `binder`: placeholder conversion and literal inlining
//! - `expressions`: per-kind expression translation
//! - `predicates`: filters, lookups and tuple predicates

mod binder;
mod expressions;

use crate::ast::LogicalQuery;
use crate::capabilities::DialectCapabilities;
use crate::transpiler::{CompiledQuery, Db2Compiler};

fn native() -> Db2Compiler {
    Db2Compiler::new(DialectCapabilities::db2())
}

fn emulated() -> Db2Compiler {
    Db2Compiler::new(DialectCapabilities::db2().with_native_pagination(false))
}

fn compile(compiler: &Db2Compiler, query: &LogicalQuery) -> CompiledQuery {
    compiler.compile(query).unwrap()
}

/// Bind markers left in the text must match the bound parameters.
fn assert_marker_count(compiled: &CompiledQuery) {
    assert_eq!(compiled.sql.matches('?').count(), compiled.params.len(), "{}", compiled.sql);
}
