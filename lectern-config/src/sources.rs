use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as written in `lectern.toml`.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub auth: FileAuthConfig,
    #[serde(default)]
    pub reporting: FileReportingConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    /// Humantime string, e.g. `"30s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquire_timeout: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileAuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_ttl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_ttl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_pepper: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileReportingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_offset_hours: Option<i32>,
}

/// Environment-derived configuration values, kept as raw strings until
/// composition so parse failures can name the variable.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub database_url: Option<String>,
    pub database_max_connections: Option<String>,
    pub database_acquire_timeout: Option<String>,
    pub access_secret: Option<String>,
    pub refresh_secret: Option<String>,
    pub access_ttl: Option<String>,
    pub refresh_ttl: Option<String>,
    pub password_pepper: Option<String>,
    pub utc_offset_hours: Option<String>,
}

impl EnvConfig {
    pub const CONFIG_PATH: &'static str = "LECTERN_CONFIG";
    pub const DATABASE_URL: &'static str = "DATABASE_URL";
    pub const DB_MAX_CONNECTIONS: &'static str = "DB_MAX_CONNECTIONS";
    pub const DB_ACQUIRE_TIMEOUT: &'static str = "DB_ACQUIRE_TIMEOUT";
    pub const ACCESS_SECRET: &'static str = "JWT_SECRET_ACCESS_KEY";
    pub const REFRESH_SECRET: &'static str = "JWT_SECRET_REFRESH_KEY";
    pub const ACCESS_TTL: &'static str = "ACCESS_EXPIRATION";
    pub const REFRESH_TTL: &'static str = "REFRESH_EXPIRATION";
    pub const PASSWORD_PEPPER: &'static str = "AUTH_PASSWORD_PEPPER";
    pub const UTC_OFFSET_HOURS: &'static str = "REPORTING_UTC_OFFSET_HOURS";

    /// Snapshot of the process environment.
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key).filter(|value| !value.trim().is_empty())
        };

        Self {
            config_path: var(Self::CONFIG_PATH).map(PathBuf::from),
            database_url: var(Self::DATABASE_URL),
            database_max_connections: var(Self::DB_MAX_CONNECTIONS),
            database_acquire_timeout: var(Self::DB_ACQUIRE_TIMEOUT),
            access_secret: var(Self::ACCESS_SECRET),
            refresh_secret: var(Self::REFRESH_SECRET),
            access_ttl: var(Self::ACCESS_TTL),
            refresh_ttl: var(Self::REFRESH_TTL),
            password_pepper: var(Self::PASSWORD_PEPPER),
            utc_offset_hours: var(Self::UTC_OFFSET_HOURS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn blank_variables_are_ignored() {
        let vars = HashMap::from([
            ("DATABASE_URL", "  "),
            ("ACCESS_EXPIRATION", "5m"),
        ]);
        let env = EnvConfig::from_lookup(|key| {
            vars.get(key).map(|value| value.to_string())
        });
        assert_eq!(env.database_url, None);
        assert_eq!(env.access_ttl.as_deref(), Some("5m"));
    }

    #[test]
    fn file_config_rejects_unknown_keys() {
        let parsed = toml::from_str::<FileConfig>(
            "[database]\nurl = \"postgres://x\"\nport = 5432\n",
        );
        assert!(parsed.is_err());

        let parsed: FileConfig =
            toml::from_str("[reporting]\nutc_offset_hours = 3\n").unwrap();
        assert_eq!(parsed.reporting.utc_offset_hours, Some(3));
        assert!(parsed.database.url.is_none());
    }
}
