//! Parameter binding.
//!
//! Converts a template with positional `%s` placeholders into the driver's
//! native bind markers. Placeholders in positions DB2 cannot bind (aggregate
//! arguments, GROUP BY, decimals in SELECT/UPDATE, some arithmetic and CASE
//! contexts) are replaced by literals instead, in this order:
//!
//! 1. arguments of `SUM/AVG/COUNT/MIN/MAX(...)`
//! 2. GROUP BY expressions, plus the identical SELECT-list expression
//! 3. decimal parameters of SELECT and UPDATE statements
//! 4. placeholders next to `+`, `THEN`, `ELSE` and `AS`

use super::lexer::{self, Token};
use super::traits::SqlGenerator;
use crate::ast::Value;
use crate::error::{Db2Error, Db2Result};

const AGGREGATES: &[&str] = &["SUM", "AVG", "COUNT", "MIN", "MAX"];

const GROUP_BY_TERMINATORS: &[&str] = &[
    "HAVING", "ORDER", "FETCH", "OFFSET", "UNION", "INTERSECT", "EXCEPT", "WITH", "FOR", "LIMIT",
];

/// Final SQL with native markers and the parameters still bound.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    pub sql: String,
    pub params: Vec<Value>,
    /// Parameters substituted as literals
    pub inlined: usize,
}

pub struct Binder<'g> {
    generator: &'g dyn SqlGenerator,
    keep_escaped_percent: bool,
}

impl<'g> Binder<'g> {
    pub fn new(generator: &'g dyn SqlGenerator) -> Self {
        // `%%` only stays escaped when the driver itself uses %s markers
        let keep_escaped_percent = generator.placeholder(1) == "%s";
        Self {
            generator,
            keep_escaped_percent,
        }
    }

    /// Bind `params` into `sql`. The caller's parameter slice is not modified.
    pub fn bind(&self, sql: &str, params: &[Value]) -> Db2Result<BoundQuery> {
        let tokens = lexer::tokenize(sql)?;
        let positions: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| matches!(t, Token::Placeholder))
            .map(|(i, _)| i)
            .collect();

        if positions.len() != params.len() {
            return Err(Db2Error::ParamCountMismatch {
                sql: sql.to_string(),
                placeholders: positions.len(),
                params: params.len(),
            });
        }

        let params: Vec<Value> = params.iter().map(Value::normalized).collect();
        let mut inline = vec![false; params.len()];
        let ordinal_of = |token_index: usize| positions.binary_search(&token_index).ok();

        mark_aggregate_arguments(&tokens, &ordinal_of, &mut inline);
        mark_group_by(&tokens, &params, &ordinal_of, &mut inline);
        mark_decimals(&tokens, &params, &mut inline);
        mark_keyword_adjacent(&tokens, &positions, &mut inline);

        let mut out = String::with_capacity(sql.len());
        let mut bound = Vec::with_capacity(params.len());
        let mut ordinal = 0;
        for token in &tokens {
            match token {
                Token::Placeholder => {
                    let value = &params[ordinal];
                    if inline[ordinal] {
                        out.push_str(&value.to_literal());
                    } else {
                        bound.push(value.clone());
                        out.push_str(&self.generator.placeholder(bound.len()));
                    }
                    ordinal += 1;
                }
                Token::EscapedPercent if !self.keep_escaped_percent => out.push('%'),
                other => out.push_str(other.text()),
            }
        }

        let inlined = params.len() - bound.len();
        if inlined > 0 {
            tracing::debug!("Inlined {} of {} parameter(s) as literals", inlined, params.len());
        }
        Ok(BoundQuery {
            sql: out,
            params: bound,
            inlined,
        })
    }
}

/// Substitute every placeholder with its literal form. Used for logging.
pub fn interpolate(sql: &str, params: &[Value]) -> Db2Result<String> {
    let tokens = lexer::tokenize(sql)?;
    let count = tokens.iter().filter(|t| matches!(t, Token::Placeholder)).count();
    if count != params.len() {
        return Err(Db2Error::ParamCountMismatch {
            sql: sql.to_string(),
            placeholders: count,
            params: params.len(),
        });
    }
    let mut values = params.iter();
    let mut out = String::with_capacity(sql.len());
    for token in &tokens {
        match token {
            Token::Placeholder => {
                if let Some(v) = values.next() {
                    out.push_str(&v.to_literal());
                }
            }
            Token::EscapedPercent => out.push('%'),
            other => out.push_str(other.text()),
        }
    }
    Ok(out)
}

fn mark_range(
    range: std::ops::Range<usize>,
    ordinal_of: &dyn Fn(usize) -> Option<usize>,
    inline: &mut [bool],
) {
    for i in range {
        if let Some(k) = ordinal_of(i) {
            inline[k] = true;
        }
    }
}

fn mark_aggregate_arguments(
    tokens: &[Token<'_>],
    ordinal_of: &dyn Fn(usize) -> Option<usize>,
    inline: &mut [bool],
) {
    for (i, token) in tokens.iter().enumerate() {
        if !AGGREGATES.iter().any(|agg| token.is_word(agg)) {
            continue;
        }
        let Some(open) = lexer::next_significant(tokens, i) else {
            continue;
        };
        if tokens[open] != Token::Open {
            continue;
        }
        if let Some(close) = lexer::matching_close(tokens, open) {
            mark_range(open..close, ordinal_of, inline);
        }
    }
}

/// Depth of every token (an open paren counts at its outer depth).
fn depths(tokens: &[Token<'_>]) -> Vec<i32> {
    let mut depth = 0;
    tokens
        .iter()
        .map(|t| match t {
            Token::Open => {
                depth += 1;
                depth - 1
            }
            Token::Close => {
                depth -= 1;
                depth
            }
            _ => depth,
        })
        .collect()
}

/// Text of an expression with surrounding whitespace removed and inner runs collapsed.
fn normalized_text(tokens: &[Token<'_>]) -> String {
    tokens
        .iter()
        .map(|t| if t.is_space() { " " } else { t.text() })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Select-list item without a trailing `AS alias`.
fn strip_alias<'a, 'b>(item: &'b [Token<'a>]) -> &'b [Token<'a>] {
    let significant: Vec<usize> = (0..item.len()).filter(|&i| !item[i].is_space()).collect();
    if significant.len() >= 3 && item[significant[significant.len() - 2]].is_word("AS") {
        return &item[..significant[significant.len() - 2]];
    }
    item
}

fn placeholder_values(
    tokens: &[Token<'_>],
    offset: usize,
    params: &[Value],
    ordinal_of: &dyn Fn(usize) -> Option<usize>,
) -> Vec<Value> {
    (0..tokens.len())
        .filter_map(|i| ordinal_of(offset + i))
        .map(|k| params[k].clone())
        .collect()
}

fn mark_group_by(
    tokens: &[Token<'_>],
    params: &[Value],
    ordinal_of: &dyn Fn(usize) -> Option<usize>,
    inline: &mut [bool],
) {
    let depth = depths(tokens);
    for (i, token) in tokens.iter().enumerate() {
        if !token.is_word("GROUP") {
            continue;
        }
        let Some(by) = lexer::next_significant(tokens, i) else {
            continue;
        };
        if !tokens[by].is_word("BY") {
            continue;
        }
        let d = depth[i];
        let start = by + 1;
        let end = (start..tokens.len())
            .find(|&j| {
                depth[j] < d
                    || (depth[j] == d && GROUP_BY_TERMINATORS.iter().any(|kw| tokens[j].is_word(kw)))
            })
            .unwrap_or(tokens.len());

        let mut grouped = Vec::new();
        let mut offset = start;
        for expr in lexer::split_top_level(&tokens[start..end]) {
            if expr.iter().any(|t| matches!(t, Token::Placeholder)) {
                mark_range(offset..offset + expr.len(), ordinal_of, inline);
                grouped.push((
                    normalized_text(expr),
                    placeholder_values(expr, offset, params, ordinal_of),
                ));
            }
            offset += expr.len() + 1;
        }
        if grouped.is_empty() {
            continue;
        }

        // the SELECT that owns this GROUP BY sits at the same depth
        let Some(select) = (0..i).rev().find(|&j| depth[j] == d && tokens[j].is_word("SELECT")) else {
            continue;
        };
        let Some(from) = (select + 1..i).find(|&j| depth[j] == d && tokens[j].is_word("FROM")) else {
            continue;
        };
        let mut offset = select + 1;
        for item in lexer::split_top_level(&tokens[select + 1..from]) {
            let expr = strip_alias(item);
            let mut text = normalized_text(expr);
            if let Some(rest) = text.strip_prefix("DISTINCT ") {
                text = rest.to_string();
            }
            let values = placeholder_values(expr, offset, params, ordinal_of);
            if grouped.iter().any(|(g, v)| *g == text && *v == values) {
                mark_range(offset..offset + expr.len(), ordinal_of, inline);
            }
            offset += item.len() + 1;
        }
    }
}

fn mark_decimals(tokens: &[Token<'_>], params: &[Value], inline: &mut [bool]) {
    let leading = tokens.iter().find(|t| !t.is_space() && **t != Token::Open);
    let applies = leading.is_some_and(|t| t.is_word("SELECT") || t.is_word("UPDATE"));
    if !applies {
        return;
    }
    for (k, value) in params.iter().enumerate() {
        if matches!(value, Value::Decimal(_)) {
            inline[k] = true;
        }
    }
}

fn mark_keyword_adjacent(tokens: &[Token<'_>], positions: &[usize], inline: &mut [bool]) {
    let is_plus = |t: &Token<'_>| *t == Token::Symbol("+");
    for (k, &i) in positions.iter().enumerate() {
        let prev = lexer::prev_significant(tokens, i).map(|j| tokens[j]);
        let next_index = lexer::next_significant(tokens, i);
        let next = next_index.map(|j| tokens[j]);

        let plus = next.as_ref().is_some_and(is_plus) || prev.as_ref().is_some_and(is_plus);
        let case_branch = prev.is_some_and(|t| t.is_word("THEN") || t.is_word("ELSE"));
        let aliased = next.is_some_and(|t| t.is_word("AS"));
        let wrapped_aliased = prev == Some(Token::Open)
            && next == Some(Token::Close)
            && next_index
                .and_then(|j| lexer::next_significant(tokens, j))
                .is_some_and(|j| tokens[j].is_word("AS"));

        if plus || case_branch || aliased || wrapped_aliased {
            inline[k] = true;
        }
    }
}
