use serde::{Deserialize, Serialize};

use crate::ast::{AggregateFunc, BinaryOp, DatePart, Filter, LogicalQuery, NullsOrder, TruncKind, Value};

/// A column reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Table or alias qualifier
    #[serde(default)]
    pub table: Option<String>,
    pub name: String,
    /// Primary or foreign key column
    #[serde(default)]
    pub key: bool,
    /// Large-object (CLOB) column
    #[serde(default)]
    pub lob: bool,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
            key: false,
            lob: false,
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            ..Self::new(name)
        }
    }

    /// Mark as a primary/foreign key column.
    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    /// Mark as a CLOB column.
    pub fn lob(mut self) -> Self {
        self.lob = true;
        self
    }
}

/// A general expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// All columns (*)
    Star,
    /// Column reference
    Column(ColumnRef),
    /// Bound value
    Value(Value),
    /// Row tuple, left side of tuple predicates
    Tuple(Vec<Expr>),
    /// Generic function call NAME(args...)
    Function { name: String, args: Vec<Expr> },
    /// Binary combination (left op right)
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// CAST(expr AS type)
    Cast { expr: Box<Expr>, target_type: String },
    /// Aggregate function call
    Aggregate {
        func: AggregateFunc,
        arg: Box<Expr>,
        #[serde(default)]
        distinct: bool,
    },
    /// Window function: func OVER (PARTITION BY ... ORDER BY ...)
    Window {
        func: Box<Expr>,
        #[serde(default)]
        partition_by: Vec<Expr>,
        #[serde(default)]
        order_by: Vec<OrderBy>,
    },
    /// Scalar sub-query
    Subquery(Box<LogicalQuery>),
    /// Date/time part extraction
    Extract {
        part: DatePart,
        expr: Box<Expr>,
        #[serde(default)]
        tzname: Option<String>,
    },
    /// Date/time truncation to a unit ('year', 'month', ...)
    Trunc {
        unit: String,
        expr: Box<Expr>,
        #[serde(default)]
        kind: TruncKind,
        #[serde(default)]
        tzname: Option<String>,
    },
    /// Datetime cast to DATE
    CastDate {
        expr: Box<Expr>,
        #[serde(default)]
        tzname: Option<String>,
    },
    /// Datetime cast to TIME
    CastTime {
        expr: Box<Expr>,
        #[serde(default)]
        tzname: Option<String>,
    },
    /// JSON object construction from key/value pairs
    JsonObject(Vec<(String, Expr)>),
    /// The constant pi
    Pi,
    /// Logarithm of `value` to `base`
    Log { value: Box<Expr>, base: Box<Expr> },
    /// MD5 digest of the argument
    Md5(Box<Expr>),
    /// Random number
    Random,
    /// Duration literal in microseconds
    Duration(i64),
    /// CASE WHEN filter THEN expr ... ELSE expr END
    Case {
        when_clauses: Vec<(Filter, Expr)>,
        #[serde(default)]
        else_value: Option<Box<Expr>>,
    },
}

/// Expression-kind tag, the key of the translator dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    Star,
    Column,
    Value,
    Tuple,
    Function,
    Binary,
    Cast,
    Aggregate,
    Window,
    Subquery,
    Extract,
    Trunc,
    CastDate,
    CastTime,
    JsonObject,
    Pi,
    Log,
    Md5,
    Random,
    Duration,
    Case,
}

impl ExprKind {
    pub const ALL: [ExprKind; 21] = [
        ExprKind::Star,
        ExprKind::Column,
        ExprKind::Value,
        ExprKind::Tuple,
        ExprKind::Function,
        ExprKind::Binary,
        ExprKind::Cast,
        ExprKind::Aggregate,
        ExprKind::Window,
        ExprKind::Subquery,
        ExprKind::Extract,
        ExprKind::Trunc,
        ExprKind::CastDate,
        ExprKind::CastTime,
        ExprKind::JsonObject,
        ExprKind::Pi,
        ExprKind::Log,
        ExprKind::Md5,
        ExprKind::Random,
        ExprKind::Duration,
        ExprKind::Case,
    ];
}

impl Expr {
    pub fn kind(&self) -> ExprKind {
        match self {
            Expr::Star => ExprKind::Star,
            Expr::Column(_) => ExprKind::Column,
            Expr::Value(_) => ExprKind::Value,
            Expr::Tuple(_) => ExprKind::Tuple,
            Expr::Function { .. } => ExprKind::Function,
            Expr::Binary { .. } => ExprKind::Binary,
            Expr::Cast { .. } => ExprKind::Cast,
            Expr::Aggregate { .. } => ExprKind::Aggregate,
            Expr::Window { .. } => ExprKind::Window,
            Expr::Subquery(_) => ExprKind::Subquery,
            Expr::Extract { .. } => ExprKind::Extract,
            Expr::Trunc { .. } => ExprKind::Trunc,
            Expr::CastDate { .. } => ExprKind::CastDate,
            Expr::CastTime { .. } => ExprKind::CastTime,
            Expr::JsonObject(_) => ExprKind::JsonObject,
            Expr::Pi => ExprKind::Pi,
            Expr::Log { .. } => ExprKind::Log,
            Expr::Md5(_) => ExprKind::Md5,
            Expr::Random => ExprKind::Random,
            Expr::Duration(_) => ExprKind::Duration,
            Expr::Case { .. } => ExprKind::Case,
        }
    }

    /// Column reference shorthand.
    pub fn col(name: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::new(name))
    }

    /// Bound value shorthand.
    pub fn val(value: impl Into<Value>) -> Self {
        Expr::Value(value.into())
    }

    pub fn func(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Function {
            name: name.into(),
            args,
        }
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn aggregate(func: AggregateFunc, arg: Expr) -> Self {
        Expr::Aggregate {
            func,
            arg: Box::new(arg),
            distinct: false,
        }
    }

    /// Column metadata when this is a plain column reference.
    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            Expr::Column(c) => Some(c),
            _ => None,
        }
    }

    /// Whether this is a CLOB column reference.
    pub fn is_lob(&self) -> bool {
        self.as_column().is_some_and(|c| c.lob)
    }
}

impl From<ColumnRef> for Expr {
    fn from(c: ColumnRef) -> Self {
        Expr::Column(c)
    }
}

/// ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub expr: Expr,
    #[serde(default)]
    pub descending: bool,
    #[serde(default)]
    pub nulls: Option<NullsOrder>,
}

impl OrderBy {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            descending: false,
            nulls: None,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            descending: true,
            nulls: None,
        }
    }
}

/// Projected column: expression plus optional alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectColumn {
    pub expr: Expr,
    #[serde(default)]
    pub alias: Option<String>,
}

impl SelectColumn {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }
}
