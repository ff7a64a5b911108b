use thiserror::Error;
use url::Url;

use crate::models::{AuthConfig, Config, DatabaseConfig, ReportingConfig};

pub const MIN_UTC_OFFSET_HOURS: i32 = -12;
pub const MAX_UTC_OFFSET_HOURS: i32 = 14;
const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigGuardRailError {
    #[error("access and refresh tokens must be signed with different secrets")]
    SharedTokenSecret,
    #[error("reporting offset {hours}h is outside -12..=14")]
    UtcOffsetOutOfRange { hours: i32 },
    #[error("database URL scheme '{scheme}' is not PostgreSQL")]
    UnsupportedDatabaseScheme { scheme: String },
    #[error("database pool needs at least one connection")]
    EmptyPool,
    #[error("{field} must be longer than zero")]
    ZeroDuration { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    check_database(&config.database, &mut warnings)?;
    check_auth(&config.auth, &mut warnings)?;
    check_reporting(&config.reporting)?;

    Ok(warnings)
}

fn check_database(
    database: &DatabaseConfig,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigGuardRailError> {
    if database.max_connections == 0 {
        return Err(ConfigGuardRailError::EmptyPool);
    }
    if database.acquire_timeout.is_zero() {
        return Err(ConfigGuardRailError::ZeroDuration {
            field: "DB_ACQUIRE_TIMEOUT",
        });
    }

    match database.url.as_deref().map(Url::parse) {
        None => warnings.push_with_hint(
            "DATABASE_URL not configured; database commands will fail",
            "Set DATABASE_URL or add [database] url to lectern.toml",
        ),
        Some(Ok(url)) => {
            if !matches!(url.scheme(), "postgres" | "postgresql") {
                return Err(ConfigGuardRailError::UnsupportedDatabaseScheme {
                    scheme: url.scheme().to_string(),
                });
            }
        }
        // Parse failures are reported by the loader before composition.
        Some(Err(_)) => {}
    }
    Ok(())
}

fn check_auth(
    auth: &AuthConfig,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigGuardRailError> {
    if auth.access_secret == auth.refresh_secret {
        return Err(ConfigGuardRailError::SharedTokenSecret);
    }
    if auth.access_ttl.is_zero() {
        return Err(ConfigGuardRailError::ZeroDuration {
            field: "ACCESS_EXPIRATION",
        });
    }
    if auth.refresh_ttl.is_zero() {
        return Err(ConfigGuardRailError::ZeroDuration {
            field: "REFRESH_EXPIRATION",
        });
    }

    let secrets = [
        (
            "JWT_SECRET_ACCESS_KEY",
            auth.is_default_access_secret(),
            auth.access_secret.len(),
        ),
        (
            "JWT_SECRET_REFRESH_KEY",
            auth.is_default_refresh_secret(),
            auth.refresh_secret.len(),
        ),
        (
            "AUTH_PASSWORD_PEPPER",
            auth.is_default_pepper(),
            auth.password_pepper.len(),
        ),
    ];
    for (field, is_default, len) in secrets {
        if is_default {
            warnings.push_with_hint(
                format!("{field} uses the default placeholder value"),
                format!("Set {field} to a random value before deploying"),
            );
        } else if len < MIN_SECRET_LENGTH {
            warnings.push(format!(
                "{field} is shorter than {MIN_SECRET_LENGTH} characters"
            ));
        }
    }

    if auth.refresh_ttl <= auth.access_ttl {
        warnings.push(
            "REFRESH_EXPIRATION is not longer than ACCESS_EXPIRATION; \
             refresh tokens will be of little use",
        );
    }
    Ok(())
}

fn check_reporting(
    reporting: &ReportingConfig,
) -> Result<(), ConfigGuardRailError> {
    let hours = reporting.utc_offset_hours;
    if !(MIN_UTC_OFFSET_HOURS..=MAX_UTC_OFFSET_HOURS).contains(&hours) {
        return Err(ConfigGuardRailError::UtcOffsetOutOfRange { hours });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use zeroize::Zeroizing;

    use super::*;
    use crate::models::{ConfigMetadata, DEFAULT_PASSWORD_PEPPER};

    fn config() -> Config {
        Config {
            database: DatabaseConfig {
                url: Some("postgres://lectern@localhost/lectern".into()),
                max_connections: 10,
                acquire_timeout: Duration::from_secs(30),
            },
            auth: AuthConfig {
                access_secret: Zeroizing::new("a".repeat(40)),
                refresh_secret: Zeroizing::new("r".repeat(40)),
                access_ttl: Duration::from_secs(15 * 60),
                refresh_ttl: Duration::from_secs(14 * 24 * 3600),
                password_pepper: Zeroizing::new("p".repeat(40)),
            },
            reporting: ReportingConfig::default(),
            metadata: ConfigMetadata::default(),
        }
    }

    #[test]
    fn strong_configuration_has_no_warnings() {
        let warnings = apply_guard_rails(&config()).unwrap();
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn default_and_short_secrets_only_warn() {
        let mut config = config();
        config.auth.password_pepper =
            Zeroizing::new(DEFAULT_PASSWORD_PEPPER.into());
        config.auth.access_secret = Zeroizing::new("short".into());
        config.database.url = None;

        let warnings = apply_guard_rails(&config).unwrap();
        let messages: Vec<_> =
            warnings.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(warnings.len(), 3, "{messages:?}");
        assert!(messages.iter().any(|m| m.contains("AUTH_PASSWORD_PEPPER")));
        assert!(messages.iter().any(|m| m.contains("JWT_SECRET_ACCESS_KEY")));
        assert!(messages.iter().any(|m| m.contains("DATABASE_URL")));
    }

    #[test]
    fn shared_secret_is_rejected() {
        let mut config = config();
        config.auth.refresh_secret = config.auth.access_secret.clone();
        assert_eq!(
            apply_guard_rails(&config).unwrap_err(),
            ConfigGuardRailError::SharedTokenSecret
        );
    }

    #[test]
    fn offset_bounds() {
        let mut config = config();
        for hours in [-12, 0, 7, 14] {
            config.reporting.utc_offset_hours = hours;
            assert!(apply_guard_rails(&config).is_ok(), "{hours}");
        }
        for hours in [-13, 15] {
            config.reporting.utc_offset_hours = hours;
            assert_eq!(
                apply_guard_rails(&config).unwrap_err(),
                ConfigGuardRailError::UtcOffsetOutOfRange { hours }
            );
        }
    }

    #[test]
    fn only_postgres_urls() {
        let mut config = config();
        config.database.url = Some("postgresql://db/lectern".into());
        assert!(apply_guard_rails(&config).is_ok());

        config.database.url = Some("mysql://db/lectern".into());
        assert_eq!(
            apply_guard_rails(&config).unwrap_err(),
            ConfigGuardRailError::UnsupportedDatabaseScheme {
                scheme: "mysql".into()
            }
        );
    }
}
