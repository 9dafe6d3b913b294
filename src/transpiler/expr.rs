//! Expression translation.
//!
//! A [`Translator`] owns a dispatch table keyed by [`ExprKind`]. Every entry
//! turns one node into SQL text with `%s` placeholders, pushing bound values
//! onto the [`ParamContext`] in text order. Callers replace entries through
//! [`Translator::register`] instead of patching shared behaviour.

use std::collections::HashMap;

use super::conditions::ParamContext;
use super::db2::Db2Generator;
use super::dml::select;
use super::traits::SqlGenerator;
use super::Notice;
use crate::ast::*;
use crate::capabilities::DialectCapabilities;
use crate::error::{Db2Error, Db2Result};

/// Translation entry for one expression kind.
pub type TranslateFn = fn(&Translator, &Expr, &mut ParamContext) -> Db2Result<String>;

const DAY_MICROS: i64 = 86_400_000_000;

pub struct Translator {
    caps: DialectCapabilities,
    generator: Box<dyn SqlGenerator>,
    table: HashMap<ExprKind, TranslateFn>,
}

impl Translator {
    /// Translator with the DB2 entry for every expression kind.
    pub fn db2(caps: DialectCapabilities) -> Self {
        let generator = Box::new(Db2Generator::new(&caps));
        let mut tr = Self {
            caps,
            generator,
            table: HashMap::new(),
        };
        for kind in ExprKind::ALL {
            tr.register(kind, default_entry(kind));
        }
        tr
    }

    /// Replace the entry for `kind`, returning the previous one.
    pub fn register(&mut self, kind: ExprKind, f: TranslateFn) -> Option<TranslateFn> {
        self.table.insert(kind, f)
    }

    pub fn capabilities(&self) -> &DialectCapabilities {
        &self.caps
    }

    pub fn generator(&self) -> &dyn SqlGenerator {
        self.generator.as_ref()
    }

    /// Translate one node, appending its parameters to `ctx`.
    pub fn translate(&self, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
        match self.table.get(&expr.kind()) {
            Some(f) => f(self, expr, ctx),
            None => Err(Db2Error::unsupported(format!("{:?} expressions", expr.kind()))),
        }
    }

    /// Translate a standalone node into `(sql, params)`.
    pub fn translate_fragment(&self, expr: &Expr) -> Db2Result<(String, Vec<Value>)> {
        let mut ctx = ParamContext::new();
        let sql = self.translate(expr, &mut ctx)?;
        Ok((sql, ctx.params))
    }

    pub(crate) fn translate_list(&self, exprs: &[Expr], ctx: &mut ParamContext) -> Db2Result<String> {
        let parts = exprs
            .iter()
            .map(|e| self.translate(e, ctx))
            .collect::<Db2Result<Vec<_>>>()?;
        Ok(parts.join(", "))
    }

    pub(crate) fn order_term(&self, order: &OrderBy, ctx: &mut ParamContext) -> Db2Result<String> {
        let mut sql = self.translate(&order.expr, ctx)?;
        if order.descending {
            sql.push_str(" DESC");
        }
        match order.nulls {
            Some(NullsOrder::First) => sql.push_str(" NULLS FIRST"),
            Some(NullsOrder::Last) => sql.push_str(" NULLS LAST"),
            None => {}
        }
        Ok(sql)
    }

    /// Compile a nested query and embed its parameters.
    pub(crate) fn subquery(&self, query: &LogicalQuery, ctx: &mut ParamContext) -> Db2Result<String> {
        let mut inner = ParamContext::new();
        let stmt = select::compile_statement(self, query, &mut inner)?;
        let (sql, params) = stmt.render();
        ctx.params.extend(params);
        for notice in inner.notices {
            ctx.notice(notice);
        }
        Ok(sql)
    }

    /// Wrap in `TIMEZONE_TZ` when a zone other than the connection's is requested.
    pub(crate) fn adjust_timezone(&self, sql: String, tzname: Option<&str>, ctx: &mut ParamContext) -> String {
        match tzname {
            Some(tz) if self.caps.use_tz && tz != self.caps.connection_timezone => {
                let offset = ctx.add_param(Value::String(tz_offset(tz)));
                format!("TIMEZONE_TZ({}, {})", sql, offset)
            }
            _ => sql,
        }
    }
}

/// `Area/City+05:30` -> `+05:30`, splitting on the last sign.
///
/// Only an `HH:MM` suffix counts as an offset; anything else (including the
/// POSIX-inverted `Etc/GMT-5`) passes through as a zone name.
pub fn tz_offset(tzname: &str) -> String {
    match tzname.rfind(['+', '-']) {
        Some(at) if is_clock_offset(&tzname[at + 1..]) => tzname[at..].to_string(),
        _ => tzname.to_string(),
    }
}

fn is_clock_offset(s: &str) -> bool {
    match s.split_once(':') {
        Some((hours, minutes)) => {
            hours.len() == 2
                && minutes.len() == 2
                && hours.chars().chain(minutes.chars()).all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Generic `NAME(arg, ...)` rendering for constructs rebuilt as function calls.
pub fn named_call(name: &str, args: &[String]) -> String {
    format!("{}({})", name, args.join(", "))
}

/// DB2 duration literal for a number of microseconds.
pub fn duration_literal(micros: i64) -> String {
    let days = micros.div_euclid(DAY_MICROS);
    let rest = micros.rem_euclid(DAY_MICROS);
    let seconds = rest / 1_000_000;
    let microseconds = rest % 1_000_000;
    if days != 0 && seconds != 0 && microseconds != 0 {
        format!("{} days + {} seconds + {} microseconds", days, seconds, microseconds)
    } else if seconds != 0 || microseconds != 0 {
        format!("{} MICROSECONDS", micros)
    } else {
        format!("{} DAYS", days)
    }
}

fn default_entry(kind: ExprKind) -> TranslateFn {
    match kind {
        ExprKind::Star => translate_star,
        ExprKind::Column => translate_column,
        ExprKind::Value => translate_value,
        ExprKind::Tuple => translate_tuple,
        ExprKind::Function => translate_function,
        ExprKind::Binary => translate_binary,
        ExprKind::Cast => translate_cast,
        ExprKind::Aggregate => translate_aggregate,
        ExprKind::Window => translate_window,
        ExprKind::Subquery => translate_subquery,
        ExprKind::Extract => translate_extract,
        ExprKind::Trunc => translate_trunc,
        ExprKind::CastDate => translate_cast_date,
        ExprKind::CastTime => translate_cast_time,
        ExprKind::JsonObject => translate_json_object,
        ExprKind::Pi => translate_pi,
        ExprKind::Log => translate_log,
        ExprKind::Md5 => translate_md5,
        ExprKind::Random => translate_random,
        ExprKind::Duration => translate_duration,
        ExprKind::Case => translate_case,
    }
}

fn misrouted(expr: &Expr) -> Db2Error {
    Db2Error::unsupported(format!("{:?} routed to the wrong translator", expr.kind()))
}

fn translate_star(_: &Translator, _: &Expr, _: &mut ParamContext) -> Db2Result<String> {
    Ok("*".to_string())
}

fn translate_column(tr: &Translator, expr: &Expr, _: &mut ParamContext) -> Db2Result<String> {
    let Expr::Column(col) = expr else {
        return Err(misrouted(expr));
    };
    tr.generator.quote_qualified(col.table.as_deref(), &col.name)
}

fn translate_value(_: &Translator, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
    match expr {
        Expr::Value(Value::Null) => Ok("NULL".to_string()),
        Expr::Value(v) => Ok(ctx.add_param(v.clone())),
        _ => Err(misrouted(expr)),
    }
}

fn translate_tuple(tr: &Translator, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
    let Expr::Tuple(items) = expr else {
        return Err(misrouted(expr));
    };
    Ok(format!("({})", tr.translate_list(items, ctx)?))
}

fn translate_function(tr: &Translator, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
    let Expr::Function { name, args } = expr else {
        return Err(misrouted(expr));
    };
    Ok(format!("{}({})", name.to_uppercase(), tr.translate_list(args, ctx)?))
}

fn translate_binary(tr: &Translator, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
    let Expr::Binary { left, op, right } = expr else {
        return Err(misrouted(expr));
    };
    let l = tr.translate(left, ctx)?;
    let r = tr.translate(right, ctx)?;
    Ok(match op {
        BinaryOp::Mod => named_call("MOD", &[l, r]),
        BinaryOp::BitAnd => named_call("BITAND", &[l, r]),
        BinaryOp::BitOr => named_call("BITOR", &[l, r]),
        BinaryOp::BitXor => named_call("BITXOR", &[l, r]),
        // kept as exponentiation for compatibility with existing callers
        BinaryOp::Caret => named_call("POWER", &[l, r]),
        BinaryOp::Concat => format!("({})", tr.generator.string_concat(&[l.as_str(), r.as_str()])),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            format!("({} {} {})", l, op, r)
        }
    })
}

fn translate_cast(tr: &Translator, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
    let Expr::Cast { expr: inner, target_type } = expr else {
        return Err(misrouted(expr));
    };
    Ok(format!("CAST({} AS {})", tr.translate(inner, ctx)?, target_type.to_uppercase()))
}

fn translate_aggregate(tr: &Translator, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
    let Expr::Aggregate { func, arg, distinct } = expr else {
        return Err(misrouted(expr));
    };
    let name = match func {
        AggregateFunc::StdDevPop => "STDDEV",
        AggregateFunc::VarPop => "VARIANCE",
        AggregateFunc::StdDevSamp | AggregateFunc::VarSamp => {
            return Err(Db2Error::unsupported(format!("{} aggregate", func)));
        }
        AggregateFunc::Count => "COUNT",
        AggregateFunc::Sum => "SUM",
        AggregateFunc::Avg => "AVG",
        AggregateFunc::Min => "MIN",
        AggregateFunc::Max => "MAX",
    };
    let mut argument = tr.translate(arg, ctx)?;
    if *func == AggregateFunc::Avg {
        // DB2 averages in the argument's type; callers expect a float
        argument = format!("DOUBLE({})", argument);
    }
    if *distinct {
        argument = format!("DISTINCT {}", argument);
    }
    Ok(format!("{}({})", name, argument))
}

fn translate_window(tr: &Translator, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
    let Expr::Window {
        func,
        partition_by,
        order_by,
    } = expr
    else {
        return Err(misrouted(expr));
    };
    let func = tr.translate(func, ctx)?;
    let mut clauses = Vec::new();
    if !partition_by.is_empty() {
        clauses.push(format!("PARTITION BY {}", tr.translate_list(partition_by, ctx)?));
    }
    if !order_by.is_empty() {
        let terms = order_by
            .iter()
            .map(|o| tr.order_term(o, ctx))
            .collect::<Db2Result<Vec<_>>>()?;
        clauses.push(format!("ORDER BY {}", terms.join(", ")));
    }
    Ok(format!("{} OVER ({})", func, clauses.join(" ")))
}

fn translate_subquery(tr: &Translator, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
    let Expr::Subquery(query) = expr else {
        return Err(misrouted(expr));
    };
    Ok(format!("({})", tr.subquery(query, ctx)?))
}

fn translate_extract(tr: &Translator, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
    let Expr::Extract { part, expr: inner, tzname } = expr else {
        return Err(misrouted(expr));
    };
    let sql = tr.translate(inner, ctx)?;
    let sql = tr.adjust_timezone(sql, tzname.as_deref(), ctx);
    Ok(match part {
        DatePart::WeekDay => named_call("DAYOFWEEK", &[sql]),
        DatePart::IsoYear => format!("TO_CHAR({}, 'IYYY')", sql),
        DatePart::Week => named_call("WEEK_ISO", &[sql]),
        DatePart::IsoWeekDay => named_call("DAYOFWEEK_ISO", &[sql]),
        other => named_call(other.function_name(), &[sql]),
    })
}

fn translate_trunc(tr: &Translator, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
    let Expr::Trunc {
        unit,
        expr: inner,
        kind,
        tzname,
    } = expr
    else {
        return Err(misrouted(expr));
    };
    let unit = ctx.add_param(Value::String(unit.clone()));
    let sql = tr.translate(inner, ctx)?;
    let sql = tr.adjust_timezone(sql, tzname.as_deref(), ctx);
    let truncated = named_call("DATE_TRUNC", &[unit, sql]);
    Ok(match kind {
        TruncKind::Time => format!("{}::time", truncated),
        TruncKind::Date | TruncKind::DateTime => truncated,
    })
}

fn translate_cast_date(tr: &Translator, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
    let Expr::CastDate { expr: inner, tzname } = expr else {
        return Err(misrouted(expr));
    };
    let sql = tr.translate(inner, ctx)?;
    Ok(format!("({})::date", tr.adjust_timezone(sql, tzname.as_deref(), ctx)))
}

fn translate_cast_time(tr: &Translator, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
    let Expr::CastTime { expr: inner, tzname } = expr else {
        return Err(misrouted(expr));
    };
    let sql = tr.translate(inner, ctx)?;
    Ok(named_call("TIME", &[tr.adjust_timezone(sql, tzname.as_deref(), ctx)]))
}

fn translate_json_object(tr: &Translator, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
    let Expr::JsonObject(pairs) = expr else {
        return Err(misrouted(expr));
    };
    let args = pairs
        .iter()
        .map(|(key, value)| {
            let value = tr.translate(value, ctx)?;
            Ok(format!("KEY '{}' VALUE {}", key.replace('\'', "''"), value))
        })
        .collect::<Db2Result<Vec<_>>>()?;
    Ok(named_call("JSON_OBJECT", &args))
}

fn translate_pi(_: &Translator, _: &Expr, _: &mut ParamContext) -> Db2Result<String> {
    Ok(std::f64::consts::PI.to_string())
}

fn translate_log(tr: &Translator, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
    let Expr::Log { value, base } = expr else {
        return Err(misrouted(expr));
    };
    let value = tr.translate(value, ctx)?;
    let base = tr.translate(base, ctx)?;
    Ok(format!("DOUBLE(LN({}) / LN({}))", value, base))
}

fn translate_md5(tr: &Translator, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
    let Expr::Md5(inner) = expr else {
        return Err(misrouted(expr));
    };
    if !tr.caps.allow_digest_substitution {
        return Err(Db2Error::unsupported(
            "MD5 has no DB2 equivalent; enable allow_digest_substitution to accept SHA-256",
        ));
    }
    tracing::warn!("MD5 compiled to a SHA-256 digest; hash values will differ from MD5");
    ctx.notice(Notice::DigestSubstituted);
    let sql = tr.translate(inner, ctx)?;
    Ok(format!("LOWER(HEX(HASH_SHA256({})))", sql))
}

fn translate_random(tr: &Translator, _: &Expr, _: &mut ParamContext) -> Db2Result<String> {
    Ok(tr.generator.random_function().to_string())
}

fn translate_duration(_: &Translator, expr: &Expr, _: &mut ParamContext) -> Db2Result<String> {
    let Expr::Duration(micros) = expr else {
        return Err(misrouted(expr));
    };
    Ok(duration_literal(*micros))
}

fn translate_case(tr: &Translator, expr: &Expr, ctx: &mut ParamContext) -> Db2Result<String> {
    let Expr::Case {
        when_clauses,
        else_value,
    } = expr
    else {
        return Err(misrouted(expr));
    };
    let mut sql = String::from("CASE");
    for (condition, value) in when_clauses {
        let condition = tr.filter(condition, ctx)?;
        let value = tr.translate(value, ctx)?;
        sql.push_str(&format!(" WHEN {} THEN {}", condition, value));
    }
    if let Some(e) = else_value {
        sql.push_str(&format!(" ELSE {}", tr.translate(e, ctx)?));
    }
    sql.push_str(" END");
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tz_offset() {
        assert_eq!(tz_offset("Asia/Kolkata+05:30"), "+05:30");
        assert_eq!(tz_offset("America/Port-au-Prince-05:00"), "-05:00");
        assert_eq!(tz_offset("Etc/GMT-5"), "Etc/GMT-5");
        assert_eq!(tz_offset("UTC+5:30"), "UTC+5:30");
        assert_eq!(tz_offset("America/Port-au-Prince"), "America/Port-au-Prince");
        assert_eq!(tz_offset("Europe/Paris"), "Europe/Paris");
    }

    #[test]
    fn test_duration_literal() {
        assert_eq!(duration_literal(3 * DAY_MICROS), "3 DAYS");
        assert_eq!(duration_literal(90_000_000), "90000000 MICROSECONDS");
        assert_eq!(
            duration_literal(DAY_MICROS + 5_000_000 + 7),
            "1 days + 5 seconds + 7 microseconds"
        );
    }

    #[test]
    fn test_every_kind_has_an_entry() {
        let tr = Translator::db2(DialectCapabilities::db2());
        for kind in ExprKind::ALL {
            assert!(tr.table.contains_key(&kind), "{:?}", kind);
        }
    }
}
