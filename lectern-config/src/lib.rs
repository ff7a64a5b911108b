//! Configuration for Lectern binaries.
//!
//! Values are resolved from the process environment first, then a `.env`
//! file, then a TOML file. [`ConfigLoader::load`] returns the composed
//! [`Config`] together with any non-fatal [`ConfigWarnings`].

#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use loader::{
    ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions,
};
pub use models::{
    AuthConfig, Config, ConfigMetadata, DatabaseConfig, ReportingConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
