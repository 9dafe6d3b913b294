//! SELECT compilation.

use crate::ast::*;
use crate::error::Db2Result;
use crate::normalize::normalize_filter;
use crate::transpiler::conditions::ParamContext;
use crate::transpiler::expr::Translator;
use crate::transpiler::ops::DialectOps;
use crate::transpiler::pagination::{Paginator, RowWindow};
use crate::transpiler::quote::IdentifierQuoter;
use crate::transpiler::statement::{Alias, Fragment, FromClause, SelectItem, SelectStatement};
use crate::transpiler::Notice;

/// Build the statement for `query` without applying its row window.
///
/// Each clause takes exactly the parameters its text consumes. Notices are
/// appended to `ctx`.
pub fn build_select(tr: &Translator, query: &LogicalQuery, ctx: &mut ParamContext) -> Db2Result<SelectStatement> {
    let caps = tr.capabilities();
    let ops = DialectOps::new(caps);
    let quoter = IdentifierQuoter::from_capabilities(caps);
    let mut local = ParamContext::new();

    let mut distinct = false;
    if query.distinct || !query.distinct_on.is_empty() {
        ops.distinct_sql(&query.distinct_on)?;
        distinct = true;
    }
    if distinct && !caps.lob_distinct {
        let lob_columns: Vec<String> = query
            .columns
            .iter()
            .filter_map(|c| c.expr.as_column())
            .filter(|c| c.lob)
            .map(|c| c.name.clone())
            .collect();
        if !lob_columns.is_empty() {
            tracing::warn!(
                "DISTINCT dropped: cannot be combined with LOB column(s) {}",
                lob_columns.join(", ")
            );
            local.notice(Notice::DistinctDropped { lob_columns });
            distinct = false;
        }
    }

    let mut items = Vec::with_capacity(query.columns.len().max(1));
    if query.columns.is_empty() {
        items.push(SelectItem::new(Fragment::raw("*"), None));
    }
    for column in &query.columns {
        let sql = tr.translate(&column.expr, &mut local)?;
        let alias = match &column.alias {
            Some(a) => Some(Alias::Quoted(quoter.unquoted(a)?)),
            None => None,
        };
        items.push(SelectItem::new(Fragment::new(sql, local.take_params()), alias));
    }

    let from = match &query.source {
        Source::None if query.joins.is_empty() => FromClause::bare(caps),
        source => {
            let mut sql = source_sql(tr, &quoter, source, &mut local)?;
            for join in &query.joins {
                let kind = match join.kind {
                    JoinKind::Inner => "INNER JOIN",
                    JoinKind::Left => "LEFT OUTER JOIN",
                };
                let target = source_sql(tr, &quoter, &join.source, &mut local)?;
                let on = tr.filter(&normalize_filter(&join.on), &mut local)?;
                sql.push_str(&format!(" {} {} ON {}", kind, target, on));
            }
            Some(FromClause::Text(Fragment::new(sql, local.take_params())))
        }
    };

    let where_clause = match &query.filter {
        Some(filter) => {
            let sql = tr.filter(&normalize_filter(filter), &mut local)?;
            Some(Fragment::new(sql, local.take_params()))
        }
        None => None,
    };

    let mut group_by = Vec::with_capacity(query.group_by.len());
    for expr in &query.group_by {
        let sql = tr.translate(expr, &mut local)?;
        group_by.push(Fragment::new(sql, local.take_params()));
    }

    let having = match &query.having {
        Some(filter) => {
            let sql = tr.filter(&normalize_filter(filter), &mut local)?;
            Some(Fragment::new(sql, local.take_params()))
        }
        None => None,
    };

    let mut compound = Vec::with_capacity(query.combinators.len());
    for (op, member) in &query.combinators {
        compound.push((*op, compile_statement(tr, member, &mut local)?));
    }

    let mut order_by = Vec::with_capacity(query.order_by.len());
    for order in &query.order_by {
        let sql = tr.order_term(order, &mut local)?;
        order_by.push(Fragment::new(sql, local.take_params()));
    }

    let lock = match &query.for_update {
        Some(opts) => Some(ops.for_update_sql(opts)?),
        None => None,
    };

    for notice in local.notices {
        ctx.notice(notice);
    }

    Ok(SelectStatement {
        distinct,
        items,
        from,
        where_clause,
        group_by,
        having,
        compound,
        order_by,
        fetch: None,
        lock,
    })
}

/// Validate, build and paginate `query`.
pub fn compile_statement(tr: &Translator, query: &LogicalQuery, ctx: &mut ParamContext) -> Db2Result<SelectStatement> {
    query.validate()?;
    let window = RowWindow::new(query.low_mark, query.high_mark)?;
    let stmt = build_select(tr, query, ctx)?;
    Paginator::new(tr.capabilities(), tr.generator()).apply(stmt, window)
}

fn source_sql(
    tr: &Translator,
    quoter: &IdentifierQuoter,
    source: &Source,
    ctx: &mut ParamContext,
) -> Db2Result<String> {
    match source {
        Source::None => Ok(String::new()),
        Source::Table { name, schema, alias } => {
            let mut sql = quoter.quote_qualified(schema.as_deref(), name)?;
            if let Some(alias) = alias {
                sql.push_str(&format!(" AS {}", quoter.quote(alias)?));
            }
            Ok(sql)
        }
        Source::Subquery { query, alias } => {
            let sub = tr.subquery(query, ctx)?;
            Ok(format!("({}) AS {}", sub, quoter.quote(alias)?))
        }
    }
}
