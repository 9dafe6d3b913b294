use serde::{Deserialize, Serialize};

/// Binary operators for arithmetic/combination expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
    /// Modulo (%)
    Mod,
    /// Bitwise AND (&)
    BitAnd,
    /// Bitwise OR (|)
    BitOr,
    /// Bitwise XOR (#)
    BitXor,
    /// The `^` operator. Compiled to POWER for compatibility with existing callers.
    Caret,
    /// String concatenation (||)
    Concat,
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Mod => write!(f, "%"),
            BinaryOp::BitAnd => write!(f, "&"),
            BinaryOp::BitOr => write!(f, "|"),
            BinaryOp::BitXor => write!(f, "#"),
            BinaryOp::Caret => write!(f, "^"),
            BinaryOp::Concat => write!(f, "||"),
        }
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    StdDevPop,
    StdDevSamp,
    VarPop,
    VarSamp,
}

impl std::fmt::Display for AggregateFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateFunc::Count => write!(f, "COUNT"),
            AggregateFunc::Sum => write!(f, "SUM"),
            AggregateFunc::Avg => write!(f, "AVG"),
            AggregateFunc::Min => write!(f, "MIN"),
            AggregateFunc::Max => write!(f, "MAX"),
            AggregateFunc::StdDevPop => write!(f, "STDDEV_POP"),
            AggregateFunc::StdDevSamp => write!(f, "STDDEV_SAMP"),
            AggregateFunc::VarPop => write!(f, "VAR_POP"),
            AggregateFunc::VarSamp => write!(f, "VAR_SAMP"),
        }
    }
}

/// Date/time part for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatePart {
    Year,
    IsoYear,
    Quarter,
    Month,
    Week,
    Day,
    WeekDay,
    IsoWeekDay,
    Hour,
    Minute,
    Second,
}

impl DatePart {
    /// Generic function name, used for parts without a dedicated DB2 mapping.
    pub fn function_name(&self) -> &'static str {
        match self {
            DatePart::Year => "YEAR",
            DatePart::IsoYear => "ISO_YEAR",
            DatePart::Quarter => "QUARTER",
            DatePart::Month => "MONTH",
            DatePart::Week => "WEEK",
            DatePart::Day => "DAY",
            DatePart::WeekDay => "WEEK_DAY",
            DatePart::IsoWeekDay => "ISO_WEEK_DAY",
            DatePart::Hour => "HOUR",
            DatePart::Minute => "MINUTE",
            DatePart::Second => "SECOND",
        }
    }
}

/// What a truncation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TruncKind {
    #[default]
    Date,
    DateTime,
    Time,
}

/// Predicate operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lookup {
    /// = value (IS NULL against NULL)
    Exact,
    /// Case-insensitive equality
    IExact,
    /// <>
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    /// Regular expression match
    Regex,
    /// Case-insensitive regular expression match
    IRegex,
    /// Single column IN value list / sub-query
    In,
    /// BETWEEN two values
    Range,
    /// IS NULL (rhs Bool(true)) / IS NOT NULL (rhs Bool(false))
    IsNull,
    /// Row tuple membership: (a, b) IN {...}
    TupleIn,
    /// Row tuple equality against a sub-query or a value tuple
    TupleExact,
}

impl Lookup {
    /// Lookups whose literal operand is upper-cased before compilation.
    pub fn is_case_insensitive(&self) -> bool {
        matches!(
            self,
            Lookup::IExact | Lookup::IContains | Lookup::IStartsWith | Lookup::IEndsWith
        )
    }

    /// LIKE-based pattern lookups.
    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            Lookup::IExact
                | Lookup::Contains
                | Lookup::IContains
                | Lookup::StartsWith
                | Lookup::IStartsWith
                | Lookup::EndsWith
                | Lookup::IEndsWith
        )
    }

    /// Comparison symbol for the simple binary lookups.
    pub fn sql_symbol(&self) -> Option<&'static str> {
        match self {
            Lookup::Exact => Some("="),
            Lookup::Ne => Some("<>"),
            Lookup::Gt => Some(">"),
            Lookup::Gte => Some(">="),
            Lookup::Lt => Some("<"),
            Lookup::Lte => Some("<="),
            _ => None,
        }
    }
}

/// Logical connector inside a filter group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LogicalOp {
    #[default]
    And,
    Or,
}

/// NULL placement in ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullsOrder {
    First,
    Last,
}

/// Set operation type for combining queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOp {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl std::fmt::Display for SetOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetOp::Union => write!(f, "UNION"),
            SetOp::UnionAll => write!(f, "UNION ALL"),
            SetOp::Intersect => write!(f, "INTERSECT"),
            SetOp::Except => write!(f, "EXCEPT"),
        }
    }
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
}
