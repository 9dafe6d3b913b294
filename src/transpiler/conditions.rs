//! Filter and predicate compilation.

use super::expr::Translator;
use super::ops::DialectOps;
use super::Notice;
use crate::ast::*;
use crate::error::{Db2Error, Db2Result};

/// Always-false predicate.
pub const MATCH_NOTHING: &str = "1=0";

/// Parameters and notices collected while translating.
#[derive(Debug, Default)]
pub struct ParamContext {
    /// Bound values, in placeholder order
    pub params: Vec<Value>,
    /// Lossy rewrites applied so far
    pub notices: Vec<Notice>,
}

impl ParamContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value and return the placeholder for it.
    pub fn add_param(&mut self, value: Value) -> String {
        self.params.push(value);
        "%s".to_string()
    }

    /// Take the parameters collected since the last call.
    pub fn take_params(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.params)
    }

    pub fn notice(&mut self, notice: Notice) {
        if !self.notices.contains(&notice) {
            self.notices.push(notice);
        }
    }
}

/// Escape LIKE wildcards and the escape character itself.
pub fn escape_like(value: &str, escape: char) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '%' || c == '_' || c == escape {
            out.push(escape);
        }
        out.push(c);
    }
    out
}

impl Translator {
    /// Compile a filter tree to a boolean SQL expression.
    pub fn filter(&self, filter: &Filter, ctx: &mut ParamContext) -> Db2Result<String> {
        match filter {
            Filter::Leaf(p) => self.predicate(p, ctx),
            Filter::Group {
                op,
                children,
                negated,
            } => {
                let joiner = match op {
                    LogicalOp::And => " AND ",
                    LogicalOp::Or => " OR ",
                };
                let parts = children
                    .iter()
                    .map(|c| self.filter(c, ctx))
                    .collect::<Db2Result<Vec<_>>>()?;
                let sql = match (parts.len(), op) {
                    (0, LogicalOp::And) => "1=1".to_string(),
                    (0, LogicalOp::Or) => MATCH_NOTHING.to_string(),
                    (1, _) => parts.join(""),
                    _ => format!("({})", parts.join(joiner)),
                };
                Ok(if *negated { format!("NOT ({})", sql) } else { sql })
            }
        }
    }

    /// Compile one predicate.
    pub fn predicate(&self, p: &Predicate, ctx: &mut ParamContext) -> Db2Result<String> {
        match p.lookup {
            Lookup::TupleIn => return self.tuple_in(p, ctx),
            Lookup::TupleExact => return self.tuple_exact(p, ctx),
            _ => {}
        }

        let lhs = self.comparable(&p.lhs, ctx)?;
        match p.lookup {
            Lookup::Exact | Lookup::Ne | Lookup::Gt | Lookup::Gte | Lookup::Lt | Lookup::Lte => {
                self.comparison(p, lhs, ctx)
            }
            Lookup::IsNull => match &p.rhs {
                Operand::Value(Value::Bool(false)) => Ok(format!("{} IS NOT NULL", lhs)),
                _ => Ok(format!("{} IS NULL", lhs)),
            },
            Lookup::In => self.in_list(p, lhs, ctx),
            Lookup::Range => match &p.rhs {
                Operand::Values(bounds) if bounds.len() == 2 => {
                    let low = ctx.add_param(bounds[0].clone());
                    let high = ctx.add_param(bounds[1].clone());
                    Ok(format!("{} BETWEEN {} AND {}", lhs, low, high))
                }
                _ => Err(Db2Error::unsupported("range lookup needs exactly two bounds")),
            },
            Lookup::Regex | Lookup::IRegex => self.regex(p, lhs),
            _ if p.lookup.is_pattern() => self.pattern(p, lhs, ctx),
            other => Err(Db2Error::unsupported(format!("{:?} lookup", other))),
        }
    }

    /// Left operand, with CLOB columns cast so they can be compared.
    fn comparable(&self, lhs: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
        let sql = self.translate(lhs, ctx)?;
        Ok(DialectOps::new(self.capabilities()).field_cast_sql(lhs, sql))
    }

    fn operand(&self, rhs: &Operand, ctx: &mut ParamContext) -> Db2Result<String> {
        match rhs {
            Operand::Value(v) => Ok(ctx.add_param(v.clone())),
            Operand::Expr(e) => self.translate(e, ctx),
            Operand::Subquery(q) => Ok(format!("({})", self.subquery(q, ctx)?)),
            Operand::None | Operand::Values(_) | Operand::Tuples(_) => {
                Err(Db2Error::unsupported("list operand for a scalar comparison"))
            }
        }
    }

    fn comparison(&self, p: &Predicate, lhs: String, ctx: &mut ParamContext) -> Db2Result<String> {
        let symbol = p.lookup.sql_symbol().unwrap_or("=");
        match (&p.rhs, p.lookup) {
            (Operand::Value(Value::Null), Lookup::Exact) => Ok(format!("{} IS NULL", lhs)),
            (Operand::Value(Value::Null), Lookup::Ne) => Ok(format!("{} IS NOT NULL", lhs)),
            (rhs, _) => Ok(format!("{} {} {}", lhs, symbol, self.operand(rhs, ctx)?)),
        }
    }

    fn in_list(&self, p: &Predicate, lhs: String, ctx: &mut ParamContext) -> Db2Result<String> {
        match &p.rhs {
            Operand::Subquery(q) => Ok(format!("{} IN ({})", lhs, self.subquery(q, ctx)?)),
            Operand::Values(values) => {
                let candidates: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
                if candidates.is_empty() {
                    return Ok(MATCH_NOTHING.to_string());
                }
                let markers: Vec<String> = candidates
                    .into_iter()
                    .map(|v| ctx.add_param(v.clone()))
                    .collect();
                Ok(format!("{} IN ({})", lhs, markers.join(", ")))
            }
            other => Ok(format!("{} IN ({})", lhs, self.operand(other, ctx)?)),
        }
    }

    /// `contains`, `startswith`, `endswith`, `iexact` and their variants.
    fn pattern(&self, p: &Predicate, lhs: String, ctx: &mut ParamContext) -> Db2Result<String> {
        let escape = self.generator().like_escape();
        let (prefix, suffix) = match p.lookup {
            Lookup::Contains | Lookup::IContains => ("%", "%"),
            Lookup::StartsWith | Lookup::IStartsWith => ("", "%"),
            Lookup::EndsWith | Lookup::IEndsWith => ("%", ""),
            _ => ("", ""),
        };

        let pattern = match &p.rhs {
            Operand::Value(value) => {
                let text = escape_like(&value.to_text(), escape);
                ctx.add_param(Value::String(format!("{}{}{}", prefix, text, suffix)))
            }
            rhs => {
                let operand = self.operand(rhs, ctx)?;
                let mut parts = Vec::new();
                if !prefix.is_empty() {
                    parts.push("'%'");
                }
                parts.push(operand.as_str());
                if !suffix.is_empty() {
                    parts.push("'%'");
                }
                self.generator().string_concat(&parts)
            }
        };

        let ops = DialectOps::new(self.capabilities());
        Ok(format!(
            "{} {} {} ESCAPE '{}'",
            ops.lookup_cast(p.lookup, &lhs),
            self.generator().fuzzy_operator(),
            ops.lookup_cast(p.lookup, &pattern),
            escape
        ))
    }

    /// Regular expressions go through XQuery `fn:matches`.
    fn regex(&self, p: &Predicate, lhs: String) -> Db2Result<String> {
        let Operand::Value(Value::String(pattern)) = &p.rhs else {
            return Err(Db2Error::unsupported("regex lookup against a non-literal pattern"));
        };
        let pattern = pattern
            .replace('&', "&amp;")
            .replace('\'', "''")
            .replace('"', "\"\"");
        let flags = if p.lookup == Lookup::IRegex { ", \"i\"" } else { "" };
        Ok(format!(
            "xmlcast( xmlquery('fn:matches(xs:string($c), \"{}\"{})' passing {} as \"c\") as varchar(5)) = 'true'",
            pattern, flags, lhs
        ))
    }

    /// Columns of a tuple left side (a single expression counts as a 1-tuple).
    fn tuple_columns<'q>(&self, lhs: &'q Expr) -> Vec<&'q Expr> {
        match lhs {
            Expr::Tuple(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    /// `(a, b) IN {...}` as a disjunction of per-row conjunctions.
    fn tuple_in(&self, p: &Predicate, ctx: &mut ParamContext) -> Db2Result<String> {
        let columns = self.tuple_columns(&p.lhs);
        match &p.rhs {
            Operand::Subquery(q) => {
                if !q.columns.is_empty() && q.columns.len() != columns.len() {
                    return Err(Db2Error::shape(columns.len(), q.columns.len()));
                }
                let lhs = columns
                    .iter()
                    .map(|c| self.translate(c, ctx))
                    .collect::<Db2Result<Vec<_>>>()?;
                Ok(format!("({}) IN ({})", lhs.join(", "), self.subquery(q, ctx)?))
            }
            Operand::Tuples(rows) => {
                if let Some(bad) = rows.iter().find(|r| r.len() != columns.len()) {
                    return Err(Db2Error::shape(columns.len(), bad.len()));
                }
                if rows.is_empty() {
                    return Ok(MATCH_NOTHING.to_string());
                }
                // NULL never compares equal, so such rows cannot match
                let matchable: Vec<&Vec<Value>> =
                    rows.iter().filter(|r| !r.iter().any(Value::is_null)).collect();
                let candidates = if !matchable.is_empty() {
                    matchable
                } else if columns.iter().all(|c| c.as_column().is_some_and(|c| c.key)) {
                    rows.iter().collect()
                } else {
                    return Ok(MATCH_NOTHING.to_string());
                };

                let mut disjuncts = Vec::with_capacity(candidates.len());
                for row in candidates {
                    disjuncts.push(format!("({})", self.row_equality(&columns, row, ctx)?));
                }
                Ok(if disjuncts.len() == 1 {
                    disjuncts.join("")
                } else {
                    format!("({})", disjuncts.join(" OR "))
                })
            }
            _ => Err(Db2Error::unsupported("tuple IN needs candidate rows or a sub-query")),
        }
    }

    /// `a = v1 AND b = w1`, with NULL components as `IS NULL`.
    fn row_equality(&self, columns: &[&Expr], row: &[Value], ctx: &mut ParamContext) -> Db2Result<String> {
        let mut terms = Vec::with_capacity(columns.len());
        for (column, value) in columns.iter().zip(row) {
            let lhs = self.comparable(column, ctx)?;
            if value.is_null() {
                terms.push(format!("{} IS NULL", lhs));
            } else {
                terms.push(format!("{} = {}", lhs, ctx.add_param(value.clone())));
            }
        }
        Ok(terms.join(" AND "))
    }

    /// Tuple equality against a sub-query or a single value row.
    fn tuple_exact(&self, p: &Predicate, ctx: &mut ParamContext) -> Db2Result<String> {
        let columns = self.tuple_columns(&p.lhs);
        let sql = match &p.rhs {
            Operand::Subquery(q) => {
                if q.columns.len() != columns.len() {
                    return Err(Db2Error::shape(columns.len(), q.columns.len()));
                }
                // first row of the sub-query's own window
                let low = q.low_mark;
                let high = q.high_mark.map_or(low + 1, |high| high.min(low + 1));
                let mut terms = Vec::with_capacity(columns.len());
                for (column, projected) in columns.iter().zip(&q.columns) {
                    let single = LogicalQuery {
                        columns: vec![projected.clone()],
                        ..(**q).clone()
                    }
                    .slice(low, Some(high));
                    let lhs = self.comparable(column, ctx)?;
                    terms.push(format!("{} = ({})", lhs, self.subquery(&single, ctx)?));
                }
                terms.join(" AND ")
            }
            Operand::Values(row) => {
                if row.len() != columns.len() {
                    return Err(Db2Error::shape(columns.len(), row.len()));
                }
                self.row_equality(&columns, row, ctx)?
            }
            _ => return Err(Db2Error::unsupported("tuple exact needs a sub-query or a value row")),
        };
        Ok(if columns.len() > 1 { format!("({})", sql) } else { sql })
    }
}
