//! Pagination rewriting.
//!
//! An empty window (`low == high`) filters the whole statement with `1=0`.
//! Native servers get `OFFSET n ROWS FETCH FIRST m ROWS ONLY`. Otherwise a
//! window starting at row zero becomes a plain `FETCH FIRST`, and any other
//! window is emulated by numbering the rows of a derived table:
//!
//! ```text
//! SELECT a1, a2 FROM (
//!     SELECT a1, a2, ( ROW_NUMBER() OVER() ) AS "__ROWNUM"
//!     FROM ( SELECT e1 AS a1, e2 AS a2 FROM ... ) AS M
//! ) Z WHERE "__ROWNUM" > low AND "__ROWNUM" <= high
//! ```

use super::statement::{Alias, Fragment, FromClause, SelectItem, SelectStatement};
use super::traits::SqlGenerator;
use crate::capabilities::DialectCapabilities;
use crate::error::{Db2Error, Db2Result};

/// Requested row window: zero-based offset and exclusive upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowWindow {
    pub low: u64,
    pub high: Option<u64>,
}

impl RowWindow {
    pub fn new(low: u64, high: Option<u64>) -> Db2Result<Self> {
        match high {
            Some(high) if high < low => Err(Db2Error::InvalidWindow { low, high }),
            _ => Ok(Self { low, high }),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.low == 0 && self.high.is_none()
    }

    /// `low == high`: nothing can be returned.
    pub fn is_empty(&self) -> bool {
        self.high == Some(self.low)
    }

    /// Whether the row numbered `rownum` (1-based) passes the emulated filter.
    pub fn admits(&self, rownum: u64) -> bool {
        rownum > self.low && self.high.is_none_or(|high| rownum <= high)
    }
}

pub struct Paginator<'a> {
    caps: &'a DialectCapabilities,
    generator: &'a dyn SqlGenerator,
}

impl<'a> Paginator<'a> {
    pub fn new(caps: &'a DialectCapabilities, generator: &'a dyn SqlGenerator) -> Self {
        Self { caps, generator }
    }

    /// Apply `window` to a statement compiled without limits.
    pub fn apply(&self, stmt: SelectStatement, window: RowWindow) -> Db2Result<SelectStatement> {
        if window.is_unbounded() {
            return Ok(stmt);
        }
        if window.is_empty() {
            tracing::debug!("Empty row window at {}, compiling to a zero-row query", window.low);
            return Ok(self.empty_result(stmt));
        }
        if self.caps.supports_native_pagination {
            tracing::debug!("Native pagination: low={} high={:?}", window.low, window.high);
            let mut stmt = stmt;
            stmt.fetch = Some(self.generator.limit_offset(window.low, window.high));
            return Ok(stmt);
        }
        match window {
            RowWindow {
                low: 0,
                high: Some(high),
            } => {
                tracing::debug!("Emulated pagination from row zero, FETCH FIRST {}", high);
                let mut stmt = stmt;
                stmt.fetch = Some(self.generator.limit_offset(0, Some(high)));
                Ok(stmt)
            }
            _ => self.number_rows(stmt, window),
        }
    }

    /// `SELECT * FROM ( stmt ) AS M WHERE 1=0`, keeping the projection.
    fn empty_result(&self, mut inner: SelectStatement) -> SelectStatement {
        let lock = inner.lock.take();
        inner.fetch = None;
        SelectStatement {
            items: vec![SelectItem::new(Fragment::raw("*"), None)],
            from: Some(FromClause::Derived {
                query: Box::new(inner),
                alias: "M".to_string(),
                as_keyword: true,
            }),
            where_clause: Some(Fragment::raw("1=0")),
            lock,
            ..Default::default()
        }
    }

    fn number_rows(&self, mut inner: SelectStatement, window: RowWindow) -> Db2Result<SelectStatement> {
        tracing::debug!(
            "Emulated pagination with ROW_NUMBER(): low={} high={:?}",
            window.low,
            window.high
        );
        if inner.items.iter().any(SelectItem::is_wildcard) {
            return Err(Db2Error::unsupported(
                "wildcard projection under emulated pagination; list the columns explicitly",
            ));
        }

        let lock = inner.lock.take();
        inner.fetch = None;

        let mut references = Vec::with_capacity(inner.items.len());
        for (i, item) in inner.items.iter_mut().enumerate() {
            let alias = item
                .alias
                .get_or_insert_with(|| Alias::Quoted(format!("{}_{}", self.caps.column_alias_prefix, i + 1)));
            references.push(SelectItem::new(Fragment::raw(alias.reference()), None));
        }

        let rownum = format!("\"{}\"", self.caps.rownum_alias);
        let mut numbered_items = references.clone();
        numbered_items.push(SelectItem::new(
            Fragment::raw("( ROW_NUMBER() OVER() )"),
            Some(Alias::Quoted(self.caps.rownum_alias.clone())),
        ));
        let numbered = SelectStatement {
            items: numbered_items,
            from: Some(FromClause::Derived {
                query: Box::new(inner),
                alias: "M".to_string(),
                as_keyword: true,
            }),
            ..Default::default()
        };

        let mut bounds = Vec::new();
        if window.low != 0 {
            bounds.push(format!("{} > {}", rownum, window.low));
        }
        if let Some(high) = window.high {
            bounds.push(format!("{} <= {}", rownum, high));
        }

        Ok(SelectStatement {
            items: references,
            from: Some(FromClause::Derived {
                query: Box::new(numbered),
                alias: "Z".to_string(),
                as_keyword: false,
            }),
            where_clause: (!bounds.is_empty()).then(|| Fragment::raw(bounds.join(" AND "))),
            lock,
            ..Default::default()
        })
    }
}
