use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use thiserror::Error;
use tracing::debug;
use url::Url;
use zeroize::Zeroizing;

use crate::{
    models::{
        AuthConfig, Config, ConfigMetadata, DEFAULT_ACCESS_SECRET,
        DEFAULT_PASSWORD_PEPPER, DEFAULT_REFRESH_SECRET,
        DEFAULT_UTC_OFFSET_HOURS, DatabaseConfig, ReportingConfig,
    },
    sources::{EnvConfig, FileConfig},
    validation::{self, ConfigGuardRailError, ConfigWarnings},
};

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] =
    ["lectern.toml", "config/lectern.toml"];
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Use this snapshot instead of `.env` + the process environment.
    pub env: Option<EnvConfig>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.options.env = Some(env);
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let (env, env_file_loaded) = match &self.options.env {
            Some(env) => (env.clone(), false),
            None => {
                let loaded = self.load_env_file()?;
                (EnvConfig::gather(), loaded)
            }
        };

        let (file, config_path) = self.load_file_config(&env)?;
        let mut warnings = ConfigWarnings::default();
        if config_path.is_none() {
            warnings.push_with_hint(
                "No lectern.toml detected; using environment variables only",
                "Pass --config or set LECTERN_CONFIG to load a file",
            );
        }

        let config = compose(
            file.unwrap_or_default(),
            env,
            ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        )?;
        warnings.extend(validation::apply_guard_rails(&config)?);

        Ok(ConfigLoad { config, warnings })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        let loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path),
            None => dotenvy::dotenv().map(|_| ()),
        };
        match loaded {
            Ok(()) => Ok(true),
            Err(dotenvy::Error::Io(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        // An explicitly named file must exist; defaults are optional.
        let path = match (&self.options.config_path, &env.config_path) {
            (Some(explicit), _) | (None, Some(explicit)) => {
                if !explicit.exists() {
                    return Err(ConfigLoadError::MissingConfig {
                        path: explicit.clone(),
                    });
                }
                explicit.clone()
            }
            (None, None) => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(found) => found,
                None => return Ok((None, None)),
            },
        };

        let file = read_file_config(&path)?;
        debug!(path = %path.display(), "loaded configuration file");
        Ok((Some(file), Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn compose(
    file: FileConfig,
    env: EnvConfig,
    metadata: ConfigMetadata,
) -> Result<Config, ConfigLoadError> {
    let FileConfig {
        database: file_database,
        auth: file_auth,
        reporting: file_reporting,
    } = file;

    let url = env
        .database_url
        .or(file_database.url)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());
    if let Some(url) = &url {
        Url::parse(url)
            .map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;
    }

    let database = DatabaseConfig {
        url,
        max_connections: parse_var(
            EnvConfig::DB_MAX_CONNECTIONS,
            env.database_max_connections,
        )?
        .or(file_database.max_connections)
        .unwrap_or(DEFAULT_MAX_CONNECTIONS),
        acquire_timeout: duration(
            EnvConfig::DB_ACQUIRE_TIMEOUT,
            env.database_acquire_timeout.or(file_database.acquire_timeout),
        )?
        .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT),
    };

    let auth = AuthConfig {
        access_secret: secret(
            env.access_secret.or(file_auth.access_secret),
            DEFAULT_ACCESS_SECRET,
        ),
        refresh_secret: secret(
            env.refresh_secret.or(file_auth.refresh_secret),
            DEFAULT_REFRESH_SECRET,
        ),
        access_ttl: duration(
            EnvConfig::ACCESS_TTL,
            env.access_ttl.or(file_auth.access_ttl),
        )?
        .unwrap_or(DEFAULT_ACCESS_TTL),
        refresh_ttl: duration(
            EnvConfig::REFRESH_TTL,
            env.refresh_ttl.or(file_auth.refresh_ttl),
        )?
        .unwrap_or(DEFAULT_REFRESH_TTL),
        password_pepper: secret(
            env.password_pepper.or(file_auth.password_pepper),
            DEFAULT_PASSWORD_PEPPER,
        ),
    };

    let reporting = ReportingConfig {
        utc_offset_hours: parse_var(
            EnvConfig::UTC_OFFSET_HOURS,
            env.utc_offset_hours,
        )?
        .or(file_reporting.utc_offset_hours)
        .unwrap_or(DEFAULT_UTC_OFFSET_HOURS),
    };

    Ok(Config {
        database,
        auth,
        reporting,
        metadata,
    })
}

fn secret(value: Option<String>, fallback: &str) -> Zeroizing<String> {
    Zeroizing::new(
        value
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string()),
    )
}

fn parse_var<T: FromStr>(
    key: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, ConfigLoadError> {
    raw.map(|value| {
        value
            .trim()
            .parse()
            .map_err(|_| ConfigLoadError::InvalidValue { key, value })
    })
    .transpose()
}

fn duration(
    key: &'static str,
    raw: Option<String>,
) -> Result<Option<Duration>, ConfigLoadError> {
    raw.map(|value| {
        humantime::parse_duration(value.trim()).map_err(|source| {
            ConfigLoadError::InvalidDuration { key, value, source }
        })
    })
    .transpose()
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid database URL")]
    InvalidDatabaseUrl {
        #[source]
        source: url::ParseError,
    },
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid duration for {key}: '{value}'")]
    InvalidDuration {
        key: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
