//! Typed SELECT statement.
//!
//! Every clause is a [`Fragment`]: SQL text with `%s` placeholders plus the
//! parameters those placeholders consume, so structural rewrites (derived
//! table wrapping, clause relocation) never lose parameter order.

use super::lexer::{self, Token};
use crate::ast::{SetOp, Value};
use crate::capabilities::DialectCapabilities;
use crate::error::{Db2Error, Db2Result};

/// Legacy timestamp construction whose commas are not paren-balanced once split.
const TIMESTAMP_CONSTRUCTION: &str = "TIMESTAMP(DATE(SUBSTR(CHAR(";

/// Trailing lock clauses recognised when lifting text.
const LOCK_CLAUSES: &[&str] = &[" WITH RS USE AND KEEP ", " WITH RR USE AND KEEP ", " FOR UPDATE"];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Fragment {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Fragment without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

/// Projection alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alias {
    /// `AS "name"`
    Quoted(String),
    /// `AS name`
    Bare(String),
}

impl Alias {
    /// How an enclosing query refers to the aliased column.
    pub fn reference(&self) -> String {
        match self {
            Alias::Quoted(name) => format!("\"{}\"", name),
            Alias::Bare(name) => name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Fragment,
    pub alias: Option<Alias>,
}

impl SelectItem {
    pub fn new(expr: Fragment, alias: Option<Alias>) -> Self {
        Self { expr, alias }
    }

    /// `*` or `T.*`
    pub fn is_wildcard(&self) -> bool {
        let sql = self.expr.sql.trim();
        sql == "*" || sql.ends_with(".*")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FromClause {
    /// Relation text, including joins (and for lifted statements the rest of the query)
    Text(Fragment),
    /// Derived table `( query ) [AS] alias`
    Derived {
        query: Box<SelectStatement>,
        alias: String,
        as_keyword: bool,
    },
}

impl FromClause {
    /// FROM clause of a SELECT without a table.
    pub fn bare(caps: &DialectCapabilities) -> Option<Self> {
        let suffix = caps.bare_select_suffix.trim();
        let relation = match suffix.get(..5) {
            Some(head) if head.eq_ignore_ascii_case("FROM ") => suffix[5..].trim(),
            _ => suffix,
        };
        if relation.is_empty() {
            None
        } else {
            Some(FromClause::Text(Fragment::raw(relation)))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStatement {
    pub distinct: bool,
    pub items: Vec<SelectItem>,
    pub from: Option<FromClause>,
    pub where_clause: Option<Fragment>,
    pub group_by: Vec<Fragment>,
    pub having: Option<Fragment>,
    pub compound: Vec<(SetOp, SelectStatement)>,
    pub order_by: Vec<Fragment>,
    /// Native pagination clause
    pub fetch: Option<String>,
    /// Trailing lock clause, always rendered last
    pub lock: Option<String>,
}

impl SelectStatement {
    /// Render to SQL text and the parameters in placeholder order.
    pub fn render(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.render_into(&mut sql, &mut params);
        (sql, params)
    }

    fn render_into(&self, sql: &mut String, params: &mut Vec<Value>) {
        sql.push_str(if self.distinct { "SELECT DISTINCT " } else { "SELECT " });
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            push_fragment(sql, params, &item.expr);
            if let Some(alias) = &item.alias {
                sql.push_str(" AS ");
                sql.push_str(&alias.reference());
            }
        }

        match &self.from {
            Some(FromClause::Text(fragment)) => {
                sql.push_str(" FROM ");
                push_fragment(sql, params, fragment);
            }
            Some(FromClause::Derived {
                query,
                alias,
                as_keyword,
            }) => {
                sql.push_str(" FROM ( ");
                query.render_into(sql, params);
                sql.push_str(if *as_keyword { " ) AS " } else { " ) " });
                sql.push_str(alias);
            }
            None => {}
        }

        if let Some(w) = &self.where_clause {
            sql.push_str(" WHERE ");
            push_fragment(sql, params, w);
        }
        push_list(sql, params, " GROUP BY ", &self.group_by);
        if let Some(h) = &self.having {
            sql.push_str(" HAVING ");
            push_fragment(sql, params, h);
        }
        for (op, member) in &self.compound {
            sql.push(' ');
            sql.push_str(&op.to_string());
            let nested = !member.order_by.is_empty() || member.fetch.is_some();
            sql.push_str(if nested { " (" } else { " " });
            member.render_into(sql, params);
            if nested {
                sql.push(')');
            }
        }
        push_list(sql, params, " ORDER BY ", &self.order_by);
        if let Some(fetch) = &self.fetch {
            if !fetch.is_empty() {
                sql.push(' ');
                sql.push_str(fetch);
            }
        }
        if let Some(lock) = &self.lock {
            sql.push(' ');
            sql.push_str(lock);
        }
    }

    /// Lift base SQL text (`SELECT [DISTINCT] <cols> FROM <rest>`) into a statement.
    ///
    /// `params` are distributed over the lifted clauses by placeholder count.
    pub fn parse(sql: &str, params: Vec<Value>) -> Db2Result<Self> {
        let tokens = lexer::tokenize(sql)?;
        let total = tokens.iter().filter(|t| matches!(t, Token::Placeholder)).count();
        if total != params.len() {
            return Err(Db2Error::ParamCountMismatch {
                sql: sql.to_string(),
                placeholders: total,
                params: params.len(),
            });
        }

        let mut cursor = skip_space(&tokens, 0);
        if !tokens.get(cursor).is_some_and(|t| t.is_word("SELECT")) {
            return Err(Db2Error::parse(0, "expected SELECT"));
        }
        cursor = skip_space(&tokens, cursor + 1);
        let distinct = tokens.get(cursor).is_some_and(|t| t.is_word("DISTINCT"));
        if distinct {
            cursor += 1;
        }

        let from = top_level_from(&tokens, cursor)
            .ok_or_else(|| Db2Error::parse(text_position(&tokens, cursor), "no top-level FROM"))?;

        let mut params = params.into_iter();
        let mut items = Vec::new();
        for column in select_columns(&tokens[cursor..from]) {
            let taken = lexer::count_placeholders(&column)?;
            let column_params: Vec<Value> = params.by_ref().take(taken).collect();
            items.push(lift_item(&column, column_params));
        }

        let rest = lexer::join(&tokens[from + 1..]);
        let (rest, lock) = split_lock(rest.trim());
        let from_params: Vec<Value> = params.collect();

        Ok(SelectStatement {
            distinct,
            items,
            from: Some(FromClause::Text(Fragment::new(rest, from_params))),
            lock,
            ..Default::default()
        })
    }
}

fn push_fragment(sql: &mut String, params: &mut Vec<Value>, fragment: &Fragment) {
    sql.push_str(&fragment.sql);
    params.extend(fragment.params.iter().cloned());
}

fn push_list(sql: &mut String, params: &mut Vec<Value>, keyword: &str, list: &[Fragment]) {
    if list.is_empty() {
        return;
    }
    sql.push_str(keyword);
    for (i, fragment) in list.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        push_fragment(sql, params, fragment);
    }
}

fn skip_space(tokens: &[Token<'_>], mut i: usize) -> usize {
    while tokens.get(i).is_some_and(Token::is_space) {
        i += 1;
    }
    i
}

fn text_position(tokens: &[Token<'_>], index: usize) -> usize {
    tokens[..index.min(tokens.len())].iter().map(|t| t.text().len()).sum()
}

fn top_level_from(tokens: &[Token<'_>], start: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, t) in tokens.iter().enumerate().skip(start) {
        match t {
            Token::Open => depth += 1,
            Token::Close => depth -= 1,
            t if depth == 0 && t.is_word("FROM") => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split the select list into columns.
///
/// Commas inside quotes never split. Commas inside parentheses are split
/// first and then rejoined by paren depth, after the legacy four-part
/// timestamp construction has been merged back together.
fn select_columns(tokens: &[Token<'_>]) -> Vec<String> {
    let raw: Vec<String> = tokens
        .split(|t| *t == Token::Comma)
        .map(lexer::join)
        .collect();

    let mut merged = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i].contains(TIMESTAMP_CONSTRUCTION) && paren_balance(&raw[i]) != 0 && i + 4 <= raw.len() {
            merged.push(raw[i..i + 4].join(","));
            i += 4;
        } else {
            merged.push(raw[i].clone());
            i += 1;
        }
    }

    let mut columns = Vec::with_capacity(merged.len());
    let mut fragment: Option<String> = None;
    let mut depth = 0i32;
    for column in merged {
        depth += paren_balance(&column);
        fragment = Some(match fragment.take() {
            Some(open) => format!("{},{}", open, column),
            None => column,
        });
        if depth <= 0 {
            depth = 0;
            columns.extend(fragment.take());
        }
    }
    columns.extend(fragment);
    columns
}

fn paren_balance(text: &str) -> i32 {
    lexer::tokenize(text)
        .map(|tokens| {
            tokens.iter().fold(0, |acc, t| match t {
                Token::Open => acc + 1,
                Token::Close => acc - 1,
                _ => acc,
            })
        })
        .unwrap_or(0)
}

/// Detect an explicit `AS "alias"` or `AS alias` on a lifted column.
fn lift_item(column: &str, params: Vec<Value>) -> SelectItem {
    let column = column.trim();
    if let Some((expr, alias)) = column.rsplit_once(" AS \"") {
        let alias = alias.trim().trim_end_matches('"').trim();
        if !alias.is_empty() {
            return SelectItem::new(Fragment::new(expr.trim(), params), Some(Alias::Quoted(alias.to_string())));
        }
    }
    if let Some((expr, alias)) = column.rsplit_once(" AS ") {
        let alias = alias.trim();
        if !alias.is_empty() && !alias.contains('(') {
            return SelectItem::new(Fragment::new(expr.trim(), params), Some(Alias::Bare(alias.to_string())));
        }
    }
    SelectItem::new(Fragment::new(column, params), None)
}

fn split_lock(rest: &str) -> (String, Option<String>) {
    let upper = rest.to_ascii_uppercase();
    for clause in LOCK_CLAUSES {
        if let Some(pos) = upper.rfind(clause) {
            if paren_balance(&rest[..pos]) == 0 {
                return (rest[..pos].trim_end().to_string(), Some(rest[pos..].trim().to_string()));
            }
        }
    }
    (rest.to_string(), None)
}
