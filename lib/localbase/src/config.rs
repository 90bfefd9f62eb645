//! Connection and backend-selection configuration.

use async_trait::async_trait;

use crate::DbError;

pub const DATABASE_URL_VAR: &str = "LOCALBASE_DATABASE_URL";
pub const HOSTED_URL_VAR: &str = "LOCALBASE_HOSTED_URL";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://local.db";

/// Values that mark a hosted URL as a template rather than a real endpoint.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "your-project",
    "your_project",
    "placeholder",
    "example.com",
    "<",
];

/// Connection configuration for store backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionConfig {
    /// Connect using a database URL string.
    Url(String),
}

impl ConnectionConfig {
    pub fn url(&self) -> &str {
        match self {
            ConnectionConfig::Url(url) => url,
        }
    }
}

impl From<&str> for ConnectionConfig {
    fn from(url: &str) -> Self {
        ConnectionConfig::Url(url.to_string())
    }
}

impl From<String> for ConnectionConfig {
    fn from(url: String) -> Self {
        ConnectionConfig::Url(url)
    }
}

impl From<&String> for ConnectionConfig {
    fn from(url: &String) -> Self {
        ConnectionConfig::Url(url.clone())
    }
}

/// Trait for store connection and schema bootstrap.
#[async_trait]
pub trait StoreConnection: Sized + Send + Sync {
    /// Connect to the store using the provided configuration.
    async fn connect(config: impl Into<ConnectionConfig> + Send) -> Result<Self, DbError>;

    /// Run schema DDL (one or more statements) against the store.
    async fn apply_schema(&self, ddl: &str) -> Result<(), DbError>;
}

/// Which client the application should construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Hosted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConfig {
    pub database_url: String,
    pub hosted_url: Option<String>,
}

impl LocalConfig {
    /// Load from `LOCALBASE_DATABASE_URL` and `LOCALBASE_HOSTED_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database_url = lookup(DATABASE_URL_VAR)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        Self {
            database_url,
            hosted_url: lookup(HOSTED_URL_VAR),
        }
    }

    pub fn backend(&self) -> BackendKind {
        if is_hosted_configured(self.hosted_url.as_deref()) {
            BackendKind::Hosted
        } else {
            BackendKind::Local
        }
    }

    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig::from(&self.database_url)
    }
}

/// True when a hosted URL is present, http(s), and not a template placeholder.
pub fn is_hosted_configured(url: Option<&str>) -> bool {
    let Some(url) = url.map(str::trim) else {
        return false;
    };

    let lower = url.to_ascii_lowercase();
    (lower.starts_with("https://") || lower.starts_with("http://"))
        && !PLACEHOLDER_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_local_file() {
        let config = LocalConfig::from_lookup(lookup(&[]));
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.backend(), BackendKind::Local);
        assert_eq!(config.connection().url(), DEFAULT_DATABASE_URL);
    }

    #[test]
    fn blank_database_url_falls_back() {
        let config = LocalConfig::from_lookup(lookup(&[(DATABASE_URL_VAR, "  ")]));
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn real_hosted_url_selects_hosted() {
        let config = LocalConfig::from_lookup(lookup(&[
            (HOSTED_URL_VAR, "https://abcd1234.supabase.co"),
            (DATABASE_URL_VAR, "sqlite::memory:"),
        ]));
        assert_eq!(config.backend(), BackendKind::Hosted);
        assert_eq!(config.database_url, "sqlite::memory:");
    }

    #[test]
    fn placeholders_are_not_hosted() {
        for url in [
            "",
            "   ",
            "your-project-url",
            "https://your-project.supabase.co",
            "https://<project>.supabase.co",
            "https://placeholder.supabase.co",
            "ftp://files.internal",
        ] {
            assert!(!is_hosted_configured(Some(url)), "{url}");
        }
        assert!(!is_hosted_configured(None));
    }
}
