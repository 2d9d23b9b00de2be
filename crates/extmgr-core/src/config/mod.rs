//! Application configuration schemas.
//!
//! Configuration is deserialized from TOML via the `config` crate. Every
//! field has a default, so an absent file yields a usable configuration.

pub mod extension;
pub mod logging;

use serde::{Deserialize, Serialize};

use self::extension::ExtensionsConfig;
use self::logging::LoggingConfig;

use crate::result::ExtResult;

/// Root application configuration.
///
/// Top-level deserialization target for the merged configuration sources
/// (base file + environment overlay + `EXTMGR`-prefixed variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Extension loading settings.
    #[serde(default)]
    pub extensions: ExtensionsConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Merges `config_path` with an optional `config/{env}` overlay and
    /// environment variables prefixed with `EXTMGR`. Missing files are
    /// not an error.
    pub fn load(config_path: &str, env: Option<&str>) -> ExtResult<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false));

        if let Some(env) = env {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{env}")).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("EXTMGR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
