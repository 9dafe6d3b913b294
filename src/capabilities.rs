//! Dialect capability table.
//!
//! An immutable description of what the target DB2 server accepts. Built
//! once (defaults, TOML overrides, probed pagination flag) and shared
//! read-only by every compilation.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier case-folding policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseFold {
    Upper,
    Lower,
    None,
}

/// Native bind-marker convention of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaceholderStyle {
    /// `%s`
    PositionalPercent,
    /// `?`
    Qmark,
    /// `:1`, `:2`, ...
    Numbered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectCapabilities {
    /// `OFFSET .. ROWS FETCH FIRST .. ROWS ONLY` is accepted
    pub supports_native_pagination: bool,
    pub identifier_case_fold: CaseFold,
    pub max_identifier_length: usize,
    pub placeholder_style: PlaceholderStyle,
    pub supports_savepoints: bool,
    /// Dummy FROM clause for a SELECT without a table
    pub bare_select_suffix: String,

    pub supports_transactions: bool,
    pub has_select_for_update: bool,
    pub has_select_for_update_nowait: bool,
    pub has_select_for_update_skip_locked: bool,
    pub can_distinct_on_fields: bool,
    pub supports_timezones: bool,
    pub uppercases_column_names: bool,
    pub requires_literal_defaults: bool,
    pub has_case_insensitive_like: bool,
    pub supports_regex_backreferencing: bool,

    /// Row-number column added by the emulated pagination rewrite
    pub rownum_alias: String,
    /// Prefix of synthesized projection aliases (`<prefix>_<n>`)
    pub column_alias_prefix: String,
    /// DISTINCT may be combined with a LOB column in the projection
    pub lob_distinct: bool,
    /// Caller accepts MD5 being compiled to a SHA-256 digest
    pub allow_digest_substitution: bool,
    /// Datetimes are timezone-aware in the mapper
    pub use_tz: bool,
    /// Timezone configured on the connection
    pub connection_timezone: String,
}

impl Default for DialectCapabilities {
    fn default() -> Self {
        Self::db2()
    }
}

impl DialectCapabilities {
    /// The DB2 LUW capability table.
    pub fn db2() -> Self {
        Self {
            supports_native_pagination: true,
            identifier_case_fold: CaseFold::Upper,
            max_identifier_length: 128,
            placeholder_style: PlaceholderStyle::Qmark,
            supports_savepoints: true,
            bare_select_suffix: " FROM SYSIBM.SYSDUMMY1".to_string(),
            supports_transactions: true,
            has_select_for_update: true,
            has_select_for_update_nowait: false,
            has_select_for_update_skip_locked: false,
            can_distinct_on_fields: false,
            supports_timezones: false,
            uppercases_column_names: true,
            requires_literal_defaults: true,
            has_case_insensitive_like: true,
            supports_regex_backreferencing: true,
            rownum_alias: "__ROWNUM".to_string(),
            column_alias_prefix: "Z.__db2".to_string(),
            lob_distinct: false,
            allow_digest_substitution: false,
            use_tz: true,
            connection_timezone: "UTC".to_string(),
        }
    }

    /// Same table with the native pagination flag forced.
    pub fn with_native_pagination(mut self, native: bool) -> Self {
        self.supports_native_pagination = native;
        self
    }

    /// Rows as (name, value) pairs for display.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("supports_native_pagination", self.supports_native_pagination.to_string()),
            ("identifier_case_fold", format!("{:?}", self.identifier_case_fold)),
            ("max_identifier_length", self.max_identifier_length.to_string()),
            ("placeholder_style", format!("{:?}", self.placeholder_style)),
            ("supports_savepoints", self.supports_savepoints.to_string()),
            ("bare_select_suffix", self.bare_select_suffix.trim().to_string()),
            ("supports_transactions", self.supports_transactions.to_string()),
            ("has_select_for_update", self.has_select_for_update.to_string()),
            ("can_distinct_on_fields", self.can_distinct_on_fields.to_string()),
            ("supports_timezones", self.supports_timezones.to_string()),
            ("rownum_alias", self.rownum_alias.clone()),
            ("column_alias_prefix", self.column_alias_prefix.clone()),
            ("lob_distinct", self.lob_distinct.to_string()),
            ("allow_digest_substitution", self.allow_digest_substitution.to_string()),
            ("use_tz", self.use_tz.to_string()),
            ("connection_timezone", self.connection_timezone.clone()),
        ]
    }
}

/// Server version as reported by the driver (`11.05.0800`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub fix: u32,
}

impl ServerVersion {
    /// First release accepting OFFSET/FETCH natively.
    pub const NATIVE_PAGINATION: ServerVersion = ServerVersion {
        major: 11,
        minor: 1,
        fix: 0,
    };

    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split('.').map(|p| p.parse::<u32>());
        let major = parts.next()?.ok()?;
        let minor = parts.next().unwrap_or(Ok(0)).ok()?;
        let fix = parts.next().unwrap_or(Ok(0)).ok()?;
        Some(Self { major, minor, fix })
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    /// Probing is not allowed in the calling context (e.g. no connection yet)
    #[error("server probing is not allowed here")]
    Disallowed,
    #[error("server probe failed: {0}")]
    Failed(String),
}

/// Implemented by the connection layer to report the live server version.
pub trait ServerProbe {
    fn server_version(&self) -> Result<ServerVersion, ProbeError>;
}

/// Lazily probed native-pagination flag.
///
/// The first successful probe is cached; a failed or disallowed probe
/// answers `true` and leaves the cache empty so a later call retries.
#[derive(Debug, Default)]
pub struct PaginationSupport {
    cached: OnceLock<bool>,
}

impl PaginationSupport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, probe: &dyn ServerProbe) -> bool {
        if let Some(native) = self.cached.get() {
            return *native;
        }
        match probe.server_version() {
            Ok(version) => {
                let native = version >= ServerVersion::NATIVE_PAGINATION;
                tracing::debug!(
                    "Probed DB2 server {}.{}.{}: native pagination = {}",
                    version.major,
                    version.minor,
                    version.fix,
                    native
                );
                *self.cached.get_or_init(|| native)
            }
            Err(e) => {
                tracing::debug!("Pagination probe unavailable ({}), assuming native support", e);
                true
            }
        }
    }

    /// Cached value, if a probe has succeeded.
    pub fn cached(&self) -> Option<bool> {
        self.cached.get().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FixedProbe {
        answer: Result<ServerVersion, ()>,
        calls: Cell<usize>,
    }

    impl ServerProbe for FixedProbe {
        fn server_version(&self) -> Result<ServerVersion, ProbeError> {
            self.calls.set(self.calls.get() + 1);
            self.answer.map_err(|_| ProbeError::Disallowed)
        }
    }

    #[test]
    fn test_version_parse() {
        assert_eq!(
            ServerVersion::parse("11.05.0800"),
            Some(ServerVersion { major: 11, minor: 5, fix: 800 })
        );
        assert_eq!(ServerVersion::parse("9"), Some(ServerVersion { major: 9, minor: 0, fix: 0 }));
        assert_eq!(ServerVersion::parse("x.1"), None);
    }

    #[test]
    fn test_probe_cached_after_success() {
        let support = PaginationSupport::new();
        let probe = FixedProbe {
            answer: Ok(ServerVersion { major: 10, minor: 5, fix: 0 }),
            calls: Cell::new(0),
        };
        assert!(!support.resolve(&probe));
        assert!(!support.resolve(&probe));
        assert_eq!(probe.calls.get(), 1);
        assert_eq!(support.cached(), Some(false));
    }

    #[test]
    fn test_probe_failure_is_permissive_and_uncached() {
        let support = PaginationSupport::new();
        let probe = FixedProbe {
            answer: Err(()),
            calls: Cell::new(0),
        };
        assert!(support.resolve(&probe));
        assert!(support.resolve(&probe));
        assert_eq!(probe.calls.get(), 2);
        assert_eq!(support.cached(), None);
    }

    #[test]
    fn test_capabilities_from_partial_toml() {
        let caps: DialectCapabilities = toml::from_str(
            "supports_native_pagination = false\nplaceholder_style = \"numbered\"\n",
        )
        .unwrap();
        assert!(!caps.supports_native_pagination);
        assert_eq!(caps.placeholder_style, PlaceholderStyle::Numbered);
        assert_eq!(caps.max_identifier_length, 128);
    }
}
