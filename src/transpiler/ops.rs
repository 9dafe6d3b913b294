//! Dialect operations outside SELECT compilation.

use super::binder;
use super::quote::IdentifierQuoter;
use crate::ast::{Expr, ForUpdate, Lookup, Value};
use crate::capabilities::DialectCapabilities;
use crate::error::{Db2Error, Db2Result};

/// Lock clause for SELECT ... FOR UPDATE.
pub const UPDATE_LOCK_CLAUSE: &str = "WITH RS USE AND KEEP UPDATE LOCKS";

/// Length of the VARCHAR a CLOB column is cast to before comparison.
pub const LOB_COMPARE_LENGTH: u32 = 4096;

pub struct DialectOps<'a> {
    caps: &'a DialectCapabilities,
    quoter: IdentifierQuoter,
}

impl<'a> DialectOps<'a> {
    pub fn new(caps: &'a DialectCapabilities) -> Self {
        Self {
            caps,
            quoter: IdentifierQuoter::from_capabilities(caps),
        }
    }

    fn savepoints(&self) -> Db2Result<()> {
        if self.caps.supports_savepoints {
            Ok(())
        } else {
            Err(Db2Error::unsupported("savepoints"))
        }
    }

    pub fn savepoint_create_sql(&self, sid: &str) -> Db2Result<String> {
        self.savepoints()?;
        Ok(format!("SAVEPOINT {} ON ROLLBACK RETAIN CURSORS", self.quoter.quote(sid)?))
    }

    pub fn savepoint_commit_sql(&self, sid: &str) -> Db2Result<String> {
        self.savepoints()?;
        Ok(format!("RELEASE TO SAVEPOINT {}", self.quoter.quote(sid)?))
    }

    pub fn savepoint_rollback_sql(&self, sid: &str) -> Db2Result<String> {
        self.savepoints()?;
        Ok(format!("ROLLBACK TO SAVEPOINT {}", self.quoter.quote(sid)?))
    }

    /// Trailing lock clause for a locking read.
    pub fn for_update_sql(&self, opts: &ForUpdate) -> Db2Result<String> {
        if !self.caps.has_select_for_update {
            return Err(Db2Error::unsupported("SELECT ... FOR UPDATE"));
        }
        if opts.nowait && !self.caps.has_select_for_update_nowait {
            return Err(Db2Error::unsupported("NOWAIT select for update"));
        }
        if opts.skip_locked && !self.caps.has_select_for_update_skip_locked {
            return Err(Db2Error::unsupported("SKIP LOCKED select for update"));
        }
        if !opts.of.is_empty() {
            return Err(Db2Error::unsupported("FOR UPDATE OF"));
        }
        Ok(UPDATE_LOCK_CLAUSE.to_string())
    }

    /// `DISTINCT`; DISTINCT ON fields are rejected.
    pub fn distinct_sql(&self, fields: &[Expr]) -> Db2Result<&'static str> {
        if !fields.is_empty() && !self.caps.can_distinct_on_fields {
            return Err(Db2Error::unsupported("DISTINCT ON fields"));
        }
        Ok("DISTINCT")
    }

    /// Wrapper applied to an operand of `lookup`.
    pub fn lookup_cast(&self, lookup: Lookup, sql: &str) -> String {
        if lookup.is_case_insensitive() {
            format!("UPPER({})", sql)
        } else {
            sql.to_string()
        }
    }

    /// Cast applied to `expr` before comparison. CLOB columns cannot be compared directly.
    pub fn field_cast_sql(&self, expr: &Expr, sql: String) -> String {
        if expr.is_lob() {
            format!("VARCHAR({}, {})", sql, LOB_COMPARE_LENGTH)
        } else {
            sql
        }
    }

    pub fn max_name_length(&self) -> usize {
        self.caps.max_identifier_length
    }

    /// Statement text with the parameters interpolated, for logs.
    pub fn last_executed_query(&self, sql: &str, params: &[Value]) -> Db2Result<String> {
        if params.is_empty() {
            return Ok(sql.to_string());
        }
        binder::interpolate(sql, params)
    }

    /// Picks the cache key at the culling offset (bound as the only parameter).
    pub fn cache_key_culling_sql(&self, table: &str) -> Db2Result<String> {
        Ok(format!(
            "SELECT cache_key FROM (SELECT cache_key, ( ROW_NUMBER() OVER() ) AS ROWNUM FROM {} ORDER BY cache_key) WHERE ROWNUM = %s + 1",
            self.quoter.quote_path(table)?
        ))
    }
}
