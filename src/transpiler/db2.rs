use super::quote::IdentifierQuoter;
use super::traits::SqlGenerator;
use crate::capabilities::{DialectCapabilities, PlaceholderStyle};
use crate::error::Db2Result;

/// DB2 LUW generator, configured from a capability table.
#[derive(Debug, Clone)]
pub struct Db2Generator {
    quoter: IdentifierQuoter,
    style: PlaceholderStyle,
}

impl Db2Generator {
    pub fn new(caps: &DialectCapabilities) -> Self {
        Self {
            quoter: IdentifierQuoter::from_capabilities(caps),
            style: caps.placeholder_style,
        }
    }
}

impl SqlGenerator for Db2Generator {
    fn quote_qualified(&self, qualifier: Option<&str>, name: &str) -> Db2Result<String> {
        self.quoter.quote_qualified(qualifier, name)
    }

    fn placeholder(&self, index: usize) -> String {
        match self.style {
            PlaceholderStyle::PositionalPercent => "%s".to_string(),
            PlaceholderStyle::Qmark => "?".to_string(),
            PlaceholderStyle::Numbered => format!(":{}", index),
        }
    }

    fn fuzzy_operator(&self) -> &str {
        "LIKE"
    }

    fn like_escape(&self) -> char {
        '\\'
    }

    fn string_concat(&self, parts: &[&str]) -> String {
        parts.join(" || ")
    }

    fn limit_offset(&self, low: u64, high: Option<u64>) -> String {
        // OFFSET n ROWS FETCH FIRST m ROWS ONLY, each part omitted when empty
        let mut parts = Vec::new();
        if low > 0 {
            parts.push(format!("OFFSET {} ROWS", low));
        }
        if let Some(high) = high {
            parts.push(format!("FETCH FIRST {} ROWS ONLY", high.saturating_sub(low)));
        }
        parts.join(" ")
    }

    fn random_function(&self) -> &str {
        "SYSFUN.RAND()"
    }
}
