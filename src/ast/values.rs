use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A parameter or literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean (DB2 binds these as 1/0)
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// Exact decimal
    Decimal(Decimal),
    /// String
    String(String),
    /// Binary payload
    Bytes(Vec<u8>),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// Naive timestamp
    Timestamp(NaiveDateTime),
    /// Timezone-aware timestamp, normalised to UTC before it reaches the driver
    TimestampTz(DateTime<FixedOffset>),
    /// UUID value
    Uuid(Uuid),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Upper-cased copy for string values, `None` for everything else.
    pub fn to_uppercase(&self) -> Option<Value> {
        match self {
            Value::String(s) => Some(Value::String(s.to_uppercase())),
            _ => None,
        }
    }

    /// Convert timezone-aware timestamps to naive UTC. Other values are returned as-is.
    pub fn normalized(&self) -> Value {
        match self {
            Value::TimestampTz(ts) => Value::Timestamp(ts.with_timezone(&Utc).naive_utc()),
            other => other.clone(),
        }
    }

    /// Render the value as DB2 literal text.
    ///
    /// Strings are single-quoted unless they already are a `DATE(...)` or
    /// `TIMESTAMP(...)` constructor call. Binary values become `BX'..'`,
    /// date/time values go through their constructor.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(n) => n.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::String(s) => {
                if is_datetime_constructor(s) {
                    s.clone()
                } else {
                    format!("'{}'", s.replace('\'', "''"))
                }
            }
            Value::Bytes(_) => format!("BX'{}'", self.to_text()),
            Value::Date(_) => format!("DATE('{}')", self.to_text()),
            Value::Time(_) => format!("TIME('{}')", self.to_text()),
            Value::Timestamp(_) | Value::TimestampTz(_) => format!("TIMESTAMP('{}')", self.to_text()),
            Value::Uuid(u) => format!("'{}'", u.simple()),
        }
    }

    /// The value's text without literal quoting or constructors.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Bytes(bytes) => bytes.iter().map(|b| format!("{:02X}", b)).collect(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            Value::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
            Value::TimestampTz(ts) => ts.with_timezone(&Utc).naive_utc().format(TIMESTAMP_FORMAT).to_string(),
            Value::Uuid(u) => u.simple().to_string(),
            other => other.to_literal(),
        }
    }

    /// Convert a JSON value into a parameter value (used by the CLI).
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            other => Value::String(other.to_string()),
        }
    }
}

/// `DATE(...)` / `TIMESTAMP(...)` strings are constructor calls, never quoted.
///
/// The call must span the whole string: parens balance outside quoted text,
/// the opening paren closes on the last character, and nothing outside quotes
/// can start a comment or another statement.
fn is_datetime_constructor(s: &str) -> bool {
    let Some(args) = s.strip_prefix("TIMESTAMP(").or_else(|| s.strip_prefix("DATE(")) else {
        return false;
    };
    let Some(args) = args.strip_suffix(')') else {
        return false;
    };
    let mut depth = 0usize;
    let mut quoted = false;
    let mut prev = ' ';
    for c in args.chars() {
        if c == '\'' {
            quoted = !quoted;
        } else if !quoted {
            match c {
                '(' => depth += 1,
                ')' => match depth.checked_sub(1) {
                    Some(d) => depth = d,
                    None => return false,
                },
                '-' if prev == '-' => return false,
                c if c.is_ascii_alphanumeric() || " _,.:-+*|\"".contains(c) => {}
                _ => return false,
            }
        }
        prev = c;
    }
    depth == 0 && !quoted
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_literal())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_literal_escapes_quotes() {
        assert_eq!(Value::from("O'Hara").to_literal(), "'O''Hara'");
    }

    #[test]
    fn test_constructor_strings_stay_bare() {
        assert_eq!(Value::from("DATE('2024-01-02')").to_literal(), "DATE('2024-01-02')");
        assert_eq!(
            Value::from("TIMESTAMP('2024-01-02 10:00:00')").to_literal(),
            "TIMESTAMP('2024-01-02 10:00:00')"
        );
        assert_eq!(
            Value::from("TIMESTAMP(DATE(SUBSTR(CHAR(\"D\"), 1, 10)), '00:00:00')").to_literal(),
            "TIMESTAMP(DATE(SUBSTR(CHAR(\"D\"), 1, 10)), '00:00:00')"
        );
    }

    #[test]
    fn test_constructor_lookalikes_are_quoted() {
        assert_eq!(Value::from("DATE night").to_literal(), "'DATE night'");
        assert_eq!(
            Value::from("TIMESTAMPED' OR 1=1 --").to_literal(),
            "'TIMESTAMPED'' OR 1=1 --'"
        );
        assert_eq!(
            Value::from("DATE('2024-01-01') OR DATE('x')").to_literal(),
            "'DATE(''2024-01-01'') OR DATE(''x'')'"
        );
        assert_eq!(Value::from("DATE(1) OR (1=1)").to_literal(), "'DATE(1) OR (1=1)'");
        assert_eq!(Value::from("DATE(1 --)").to_literal(), "'DATE(1 --)'");
        assert_eq!(Value::from("DATE(1); DROP").to_literal(), "'DATE(1); DROP'");
    }

    #[test]
    fn test_bytes_render_as_hex() {
        assert_eq!(Value::Bytes(vec![0xde, 0xad, 0x01]).to_literal(), "BX'DEAD01'");
    }

    #[test]
    fn test_temporal_constructors() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Value::Date(d).to_literal(), "DATE('2024-03-09')");
        let ts = d.and_hms_opt(7, 5, 0).unwrap();
        assert_eq!(Value::Timestamp(ts).to_literal(), "TIMESTAMP('2024-03-09 07:05:00')");
        let t = NaiveTime::from_hms_micro_opt(7, 5, 0, 250_000).unwrap();
        assert_eq!(Value::Time(t).to_literal(), "TIME('07:05:00.250')");
        assert_eq!(Value::Time(t).to_text(), "07:05:00.250");
    }

    #[test]
    fn test_aware_timestamp_normalised_to_utc() {
        let ts = DateTime::parse_from_rfc3339("2024-03-09T12:00:00+02:00").unwrap();
        assert_eq!(
            Value::TimestampTz(ts).to_literal(),
            "TIMESTAMP('2024-03-09 10:00:00')"
        );
    }
}
