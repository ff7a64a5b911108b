use std::{fmt, path::PathBuf, time::Duration};

use lectern_core::{
    AuditInterceptor,
    auth::{PasswordCrypto, PasswordCryptoError, TokenSettings},
    database::infrastructure::postgres::PoolSettings,
};
use zeroize::Zeroizing;

pub const DEFAULT_ACCESS_SECRET: &str = "change-me-access-secret";
pub const DEFAULT_REFRESH_SECRET: &str = "change-me-refresh-secret";
pub const DEFAULT_PASSWORD_PEPPER: &str = "change-me-password-pepper";
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub reporting: ReportingConfig,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Only commands that touch the database require it.
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            acquire_timeout: self.acquire_timeout,
        }
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    pub access_secret: Zeroizing<String>,
    pub refresh_secret: Zeroizing<String>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub password_pepper: Zeroizing<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("password_pepper", &"<redacted>")
            .finish()
    }
}

impl AuthConfig {
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            access_secret: self.access_secret.clone(),
            refresh_secret: self.refresh_secret.clone(),
            access_ttl: self.access_ttl,
            refresh_ttl: self.refresh_ttl,
        }
    }

    pub fn password_crypto(
        &self,
    ) -> Result<PasswordCrypto, PasswordCryptoError> {
        PasswordCrypto::new(self.password_pepper.as_bytes())
    }

    pub fn is_default_access_secret(&self) -> bool {
        self.access_secret.as_str() == DEFAULT_ACCESS_SECRET
    }

    pub fn is_default_refresh_secret(&self) -> bool {
        self.refresh_secret.as_str() == DEFAULT_REFRESH_SECRET
    }

    pub fn is_default_pepper(&self) -> bool {
        self.password_pepper.as_str() == DEFAULT_PASSWORD_PEPPER
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingConfig {
    pub utc_offset_hours: i32,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
        }
    }
}

impl ReportingConfig {
    /// Interceptor stamping audit times in the configured offset.
    pub fn interceptor(&self) -> lectern_core::Result<AuditInterceptor> {
        AuditInterceptor::from_offset_hours(self.utc_offset_hours)
    }
}

/// Where the values came from, for `config check` output.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
