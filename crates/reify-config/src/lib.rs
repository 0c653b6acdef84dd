//! TOML configuration for the reify crates plus `tracing` setup.
//!
//! ```toml
//! [logging]
//! level = "reify.resolve=debug,info"
//! json = false
//!
//! [resolver]
//! max_depth = 256
//! ```

use std::path::Path;
use std::sync::Once;

use reify_types::ResolveOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::{EnvFilter, Layer as _};

mod schema;

pub use crate::schema::json_schema;

/// Top-level configuration loaded from TOML.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct ReifyConfig {
    /// Global logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Limits applied by the type resolver.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level, either a plain level (`debug`) or an `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Write logs to stderr.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    /// `level` as `EnvFilter` directives. A bare level name may be written in any case.
    pub(crate) fn directives(&self) -> String {
        let level = self.level.trim();
        if level.is_empty() {
            return Self::default_level();
        }
        match level.parse::<LevelFilter>() {
            Ok(filter) => filter.to_string(),
            Err(_) => level.to_owned(),
        }
    }

    /// The effective filter. `RUST_LOG`, when set, is appended after the configured directives.
    ///
    /// Directives that fail to parse fall back to the configured level alone, then to `info`.
    pub fn env_filter(&self) -> EnvFilter {
        let configured = self.directives();
        let combined = match std::env::var("RUST_LOG") {
            Ok(env) if !env.trim().is_empty() => format!("{configured},{}", env.trim()),
            _ => configured.clone(),
        };
        EnvFilter::try_new(combined)
            .or_else(|_| EnvFilter::try_new(configured))
            .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::INFO.into()))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Maximum supertype-walk and substitution depth before the resolver gives up.
    #[serde(default = "ResolverConfig::default_max_depth")]
    #[schemars(range(min = 1))]
    pub max_depth: usize,
}

impl ResolverConfig {
    fn default_max_depth() -> usize {
        ResolveOptions::DEFAULT_MAX_DEPTH
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::default_max_depth(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("invalid value for `{field}`: {message}")]
    Invalid {
        field: &'static str,
        message: &'static str,
    },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` quotes a snippet of the input; keep only the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl ReifyConfig {
    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let config: ReifyConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.max_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "resolver.max_depth",
                message: "must be at least 1",
            });
        }
        Ok(())
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            max_depth: self.resolver.max_depth,
        }
    }
}

static TRACING_INIT: Once = Once::new();

/// Installs a global `tracing` subscriber.
///
/// Safe to call multiple times; only the first call has an effect, and it does nothing if the
/// host application already installed a subscriber.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();

        let base_layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if !config.stderr {
            tracing_subscriber::layer::Identity::new().boxed()
        } else if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(filter).with(base_layer);
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            tracing::debug!(
                target: "reify.config",
                json = config.json,
                "tracing initialized"
            );
        }
    });
}
