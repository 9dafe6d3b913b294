use serde::{Deserialize, Serialize};

use crate::ast::{Expr, Filter, JoinKind, OrderBy, SelectColumn, SetOp};
use crate::error::{Db2Error, Db2Result};

/// Source relation of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Source {
    /// No relation (SELECT without a table)
    None,
    Table {
        name: String,
        #[serde(default)]
        schema: Option<String>,
        #[serde(default)]
        alias: Option<String>,
    },
    Subquery {
        query: Box<LogicalQuery>,
        alias: String,
    },
}

impl Source {
    pub fn table(name: impl Into<String>) -> Self {
        Source::Table {
            name: name.into(),
            schema: None,
            alias: None,
        }
    }
}

/// A joined relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub source: Source,
    pub on: Filter,
}

/// SELECT ... FOR UPDATE options.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForUpdate {
    #[serde(default)]
    pub nowait: bool,
    #[serde(default)]
    pub skip_locked: bool,
    #[serde(default)]
    pub of: Vec<String>,
}

/// The logical query handed over by the mapper.
///
/// `low_mark` is a zero-based row offset and `high_mark` an exclusive upper
/// bound; when set, `high_mark >= low_mark`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalQuery {
    /// Projected columns; empty means `*`
    #[serde(default)]
    pub columns: Vec<SelectColumn>,
    pub source: Source,
    #[serde(default)]
    pub joins: Vec<Join>,
    #[serde(default)]
    pub filter: Option<Filter>,
    #[serde(default)]
    pub group_by: Vec<Expr>,
    #[serde(default)]
    pub having: Option<Filter>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
    #[serde(default)]
    pub distinct: bool,
    /// DISTINCT ON expressions (rejected by DB2)
    #[serde(default)]
    pub distinct_on: Vec<Expr>,
    #[serde(default)]
    pub low_mark: u64,
    #[serde(default)]
    pub high_mark: Option<u64>,
    /// Combined queries (UNION, INTERSECT, EXCEPT)
    #[serde(default)]
    pub combinators: Vec<(SetOp, LogicalQuery)>,
    #[serde(default)]
    pub for_update: Option<ForUpdate>,
}

impl Default for LogicalQuery {
    fn default() -> Self {
        Self {
            columns: vec![],
            source: Source::None,
            joins: vec![],
            filter: None,
            group_by: vec![],
            having: None,
            order_by: vec![],
            distinct: false,
            distinct_on: vec![],
            low_mark: 0,
            high_mark: None,
            combinators: vec![],
            for_update: None,
        }
    }
}

impl LogicalQuery {
    /// Create a query selecting from the given table.
    pub fn from_table(table: impl Into<String>) -> Self {
        Self {
            source: Source::table(table),
            ..Self::default()
        }
    }

    pub fn column(mut self, expr: Expr) -> Self {
        self.columns.push(SelectColumn::new(expr));
        self
    }

    pub fn column_as(mut self, expr: Expr, alias: impl Into<String>) -> Self {
        self.columns.push(SelectColumn::aliased(expr, alias));
        self
    }

    /// AND a filter into the existing filter tree.
    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        let filter = filter.into();
        self.filter = Some(match self.filter.take() {
            None => filter,
            Some(existing) => Filter::and(vec![existing, filter]),
        });
        self
    }

    pub fn group_by(mut self, expr: Expr) -> Self {
        self.group_by.push(expr);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Set the row window from a zero-based offset and an exclusive upper bound.
    pub fn slice(mut self, low: u64, high: Option<u64>) -> Self {
        self.low_mark = low;
        self.high_mark = high;
        self
    }

    pub fn for_update(mut self, opts: ForUpdate) -> Self {
        self.for_update = Some(opts);
        self
    }

    pub fn combine(mut self, op: SetOp, other: LogicalQuery) -> Self {
        self.combinators.push((op, other));
        self
    }

    /// Check the window invariant.
    pub fn validate(&self) -> Db2Result<()> {
        if let Some(high) = self.high_mark {
            if high < self.low_mark {
                return Err(Db2Error::InvalidWindow {
                    low: self.low_mark,
                    high,
                });
            }
        }
        Ok(())
    }
}
