//! Identifier quoting.

use crate::capabilities::{CaseFold, DialectCapabilities};
use crate::error::{Db2Error, Db2Result};

/// Folds and double-quotes table, column and schema names.
///
/// Quoting is idempotent: `quote(quote(x)) == quote(x)`.
#[derive(Debug, Clone)]
pub struct IdentifierQuoter {
    case_fold: CaseFold,
    max_length: usize,
}

impl IdentifierQuoter {
    pub fn new(case_fold: CaseFold, max_length: usize) -> Self {
        Self {
            case_fold,
            max_length,
        }
    }

    pub fn from_capabilities(caps: &DialectCapabilities) -> Self {
        Self::new(caps.identifier_case_fold, caps.max_identifier_length)
    }

    fn fold(&self, name: &str) -> String {
        match self.case_fold {
            CaseFold::Upper => name.to_uppercase(),
            CaseFold::Lower => name.to_lowercase(),
            CaseFold::None => name.to_string(),
        }
    }

    /// Quote a single identifier.
    pub fn quote(&self, name: &str) -> Db2Result<String> {
        if name.is_empty() {
            return Err(Db2Error::identifier(name, "empty identifier"));
        }
        let folded = self.fold(name);

        let quoted = if is_fully_quoted(&folded) && inner_is_escaped(&folded) {
            folded
        } else if folded.starts_with("\"\"") && folded.ends_with("\"\"") && folded.len() >= 4 {
            format!("\"{}\"", folded)
        } else if folded.starts_with('"') && !folded.ends_with('"') {
            format!("{}\"", folded)
        } else {
            // a trailing-only quote gets its opening quote here as well
            format!("\"{}\"", folded)
        };

        if !inner_is_escaped(&quoted) {
            return Err(Db2Error::identifier(name, "unescaped double quote inside identifier"));
        }
        let length = quoted[1..quoted.len() - 1].replace("\"\"", "\"").chars().count();
        if length > self.max_length {
            return Err(Db2Error::identifier(
                name,
                format!("{} characters exceeds the limit of {}", length, self.max_length),
            ));
        }
        Ok(quoted)
    }

    /// Quote a dotted path (`schema.table`) part by part.
    pub fn quote_path(&self, path: &str) -> Db2Result<String> {
        if path.contains('"') {
            return self.quote(path);
        }
        let parts = path
            .split('.')
            .map(|part| self.quote(part))
            .collect::<Db2Result<Vec<_>>>()?;
        Ok(parts.join("."))
    }

    /// Quote with an optional qualifier (`"T"."COL"`).
    pub fn quote_qualified(&self, qualifier: Option<&str>, name: &str) -> Db2Result<String> {
        match qualifier {
            Some(q) => Ok(format!("{}.{}", self.quote_path(q)?, self.quote(name)?)),
            None => self.quote(name),
        }
    }

    /// Folded name without the surrounding quotes.
    pub fn unquoted(&self, name: &str) -> Db2Result<String> {
        let quoted = self.quote(name)?;
        Ok(quoted[1..quoted.len() - 1].to_string())
    }
}

impl Default for IdentifierQuoter {
    fn default() -> Self {
        Self::new(CaseFold::Upper, 128)
    }
}

fn is_fully_quoted(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('"') && s.ends_with('"')
}

/// Every quote between the outer pair is doubled.
fn inner_is_escaped(quoted: &str) -> bool {
    if !is_fully_quoted(quoted) {
        return false;
    }
    let inner = &quoted[1..quoted.len() - 1];
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
            } else {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quote_folds_to_upper() {
        let q = IdentifierQuoter::default();
        assert_eq!(q.quote("user_name").unwrap(), "\"USER_NAME\"");
    }

    #[test]
    fn test_quote_is_idempotent() {
        let q = IdentifierQuoter::default();
        for name in ["a", "Mixed", "\"X\"", "\"half", "tail\"", "\"\"odd\"\"", "a\"\"b"] {
            let once = q.quote(name).unwrap();
            assert_eq!(q.quote(&once).unwrap(), once, "input {}", name);
        }
    }

    #[test]
    fn test_half_quoted_names_are_completed() {
        let q = IdentifierQuoter::default();
        assert_eq!(q.quote("\"abc").unwrap(), "\"ABC\"");
        assert_eq!(q.quote("abc\"").unwrap(), "\"ABC\"");
    }

    #[test]
    fn test_unescaped_inner_quote_rejected() {
        let q = IdentifierQuoter::default();
        assert!(matches!(q.quote("ab\"c"), Err(Db2Error::InvalidIdentifier { .. })));
    }

    #[test]
    fn test_length_limit() {
        let q = IdentifierQuoter::default();
        assert!(q.quote(&"x".repeat(128)).is_ok());
        assert!(matches!(
            q.quote(&"x".repeat(129)),
            Err(Db2Error::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_case_fold_none_and_path() {
        let q = IdentifierQuoter::new(CaseFold::None, 128);
        assert_eq!(q.quote_path("app.Users").unwrap(), "\"app\".\"Users\"");
        assert_eq!(q.quote_qualified(Some("u"), "id").unwrap(), "\"u\".\"id\"");
    }
}
