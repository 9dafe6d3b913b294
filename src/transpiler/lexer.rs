//! Tokenizer for SQL templates with positional `%s` placeholders.
//!
//! Only distinguishes what the binder and the statement lifter need:
//! placeholders, quoted text (never scanned for placeholders), words,
//! parentheses and commas. Everything else passes through as a symbol.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while1},
    character::complete::{anychar, char, multispace1},
    combinator::{all_consuming, map, recognize, value},
    multi::many0,
    sequence::tuple,
    IResult,
};

use crate::error::{Db2Error, Db2Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `%s`
    Placeholder,
    /// `%%`
    EscapedPercent,
    /// `'string'` or `"identifier"`, quotes included
    Quoted(&'a str),
    Word(&'a str),
    Space(&'a str),
    Open,
    Close,
    Comma,
    Symbol(&'a str),
}

impl<'a> Token<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Token::Placeholder => "%s",
            Token::EscapedPercent => "%%",
            Token::Open => "(",
            Token::Close => ")",
            Token::Comma => ",",
            Token::Quoted(s) | Token::Word(s) | Token::Space(s) | Token::Symbol(s) => s,
        }
    }

    /// Case-insensitive keyword match.
    pub fn is_word(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(keyword))
    }

    pub fn is_space(&self) -> bool {
        matches!(self, Token::Space(_))
    }
}

fn quoted_with(quote: char) -> impl Fn(&str) -> IResult<&str, &str> {
    move |input| {
        let doubled: &'static str = if quote == '\'' { "''" } else { "\"\"" };
        let body: &'static str = if quote == '\'' { "'" } else { "\"" };
        recognize(tuple((
            char(quote),
            many0(alt((tag(doubled), is_not(body)))),
            char(quote),
        )))(input)
    }
}

fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        value(Token::Placeholder, tag("%s")),
        value(Token::EscapedPercent, tag("%%")),
        map(quoted_with('\''), Token::Quoted),
        map(quoted_with('"'), Token::Quoted),
        map(
            take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '.' || c == '$'),
            Token::Word,
        ),
        map(multispace1, Token::Space),
        value(Token::Open, char('(')),
        value(Token::Close, char(')')),
        value(Token::Comma, char(',')),
        map(recognize(anychar), Token::Symbol),
    ))(input)
}

/// Split SQL text into tokens. Concatenating the token texts gives back the input.
pub fn tokenize(sql: &str) -> Db2Result<Vec<Token<'_>>> {
    all_consuming(many0(token))(sql)
        .map(|(_, tokens)| tokens)
        .map_err(|e| Db2Error::parse(0, format!("cannot tokenize SQL: {}", e)))
}

/// Number of `%s` placeholders outside quoted text.
pub fn count_placeholders(sql: &str) -> Db2Result<usize> {
    Ok(tokenize(sql)?
        .iter()
        .filter(|t| matches!(t, Token::Placeholder))
        .count())
}

/// Join token texts back into SQL.
pub fn join(tokens: &[Token<'_>]) -> String {
    tokens.iter().map(|t| t.text()).collect()
}

/// Split on commas at paren depth zero.
pub fn split_top_level<'a, 'b>(tokens: &'b [Token<'a>]) -> Vec<&'b [Token<'a>]> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, t) in tokens.iter().enumerate() {
        match t {
            Token::Open => depth += 1,
            Token::Close => depth -= 1,
            Token::Comma if depth == 0 => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts
}

/// Index of the matching close paren for the open paren at `open`.
pub fn matching_close(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, t) in tokens.iter().enumerate().skip(open) {
        match t {
            Token::Open => depth += 1,
            Token::Close => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Next non-space token index after `i`.
pub fn next_significant(tokens: &[Token<'_>], i: usize) -> Option<usize> {
    (i + 1..tokens.len()).find(|&j| !tokens[j].is_space())
}

/// Previous non-space token index before `i`.
pub fn prev_significant(tokens: &[Token<'_>], i: usize) -> Option<usize> {
    (0..i).rev().find(|&j| !tokens[j].is_space())
}
