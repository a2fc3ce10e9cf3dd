//! Configuration loading and persistence
//!
//! Resolution order for the file: an explicit path, then `UTMDASH_CONFIG_PATH`,
//! then `utmdash.toml` in the working directory, then built-in defaults.
//! Environment overrides are applied on top and the result is validated.

use crate::defaults::DEFAULT_CONFIG_FILE;
use crate::schema::Config;
use std::{
    env,
    error::Error as StdError,
    fs,
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tracing::{debug, info};
use utmdash_common::DashError;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "UTMDASH_CONFIG_PATH";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading or writing the configuration file
    #[error("Failed to access configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Serializing the configuration for saving failed
    #[error("Failed to serialize configuration: {0}")]
    SerializeError(String),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[source] DashError),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        /// Variable name
        var: String,
        /// Parse failure
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl From<ConfigError> for DashError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ValidationError(inner) => inner,
            ConfigError::IoError(e) => Self::Io(e),
            other => Self::config(other.to_string()),
        }
    }
}

/// On-disk format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml` and anything unrecognised
    Toml,
    /// `.yaml` / `.yml`
    Yaml,
}

impl ConfigFormat {
    /// Format for a path; TOML unless the extension says YAML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Toml,
        }
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a file, apply environment overrides and validate.
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let mut config = Self::read_file(path.as_ref())?;
        Self::apply_env_overrides(&mut config)?;
        config.validate().map_err(ConfigError::ValidationError)?;
        Ok(config)
    }

    /// Resolve the configuration file and load it, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        match Self::resolve_path(explicit, env::var(CONFIG_PATH_VAR).ok()) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::load_config(path)
            }
            None => {
                debug!("No configuration file found, using defaults");
                let mut config = Config::default();
                Self::apply_env_overrides(&mut config)?;
                config.validate().map_err(ConfigError::ValidationError)?;
                Ok(config)
            }
        }
    }

    /// Which file `load` reads, if any.
    ///
    /// Explicit and environment paths are returned even when missing so the
    /// read fails loudly; the working-directory default is only used if present.
    pub fn resolve_path(explicit: Option<&Path>, from_env: Option<String>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Some(path) = from_env.filter(|p| !p.trim().is_empty()) {
            return Some(PathBuf::from(path));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.exists().then_some(default)
    }

    /// Parse a file without overrides or validation.
    pub fn read_file(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content, ConfigFormat::from_path(path))
    }

    /// Parse configuration text in the given format.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
        Ok(match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
        })
    }

    /// Serialize configuration in the given format.
    pub fn render(config: &Config, format: ConfigFormat) -> Result<String, ConfigError> {
        Ok(match format {
            ConfigFormat::Toml => toml::to_string_pretty(config)
                .map_err(|e| ConfigError::SerializeError(e.to_string()))?,
            ConfigFormat::Yaml => serde_yaml::to_string(config)?,
        })
    }

    /// Save configuration atomically: write a sibling temp file, then rename.
    pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
        let content = Self::render(config, ConfigFormat::from_path(path))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(content.as_bytes())?;
        file.persist(path).map_err(|e| ConfigError::IoError(e.error))?;

        info!("Wrote configuration to {}", path.display());
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides_from(config, |var| env::var(var).ok())
    }

    /// Apply overrides from any variable source.
    pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // API configuration overrides
        if let Some(url) = lookup("UTMDASH_API_URL") {
            config.api.url = url;
        }

        if let Some(key) = lookup("UTMDASH_API_KEY") {
            config.api.api_key = Some(key).filter(|k| !k.trim().is_empty());
        }

        if let Some(timeout) = lookup("UTMDASH_TIMEOUT_SECS") {
            config.api.timeout_secs = parse_var("UTMDASH_TIMEOUT_SECS", &timeout)?;
        }

        if let Some(retries) = lookup("UTMDASH_MAX_RETRIES") {
            config.api.max_retries = parse_var("UTMDASH_MAX_RETRIES", &retries)?;
        }

        if let Some(rate) = lookup("UTMDASH_RATE_LIMIT") {
            config.api.rate_limit_per_sec = parse_var("UTMDASH_RATE_LIMIT", &rate)?;
        }

        // Report configuration overrides
        if let Some(platform) = lookup("UTMDASH_PLATFORM") {
            config.report.platform = parse_var("UTMDASH_PLATFORM", &platform)?;
        }

        if let Some(policy) = lookup("UTMDASH_MERGE_POLICY") {
            config.report.merge_policy = parse_var("UTMDASH_MERGE_POLICY", &policy)?;
        }

        // Logging configuration overrides
        if let Some(level) = lookup("UTMDASH_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(dir) = lookup("UTMDASH_LOG_DIR") {
            config.logging.directory = Some(PathBuf::from(dir)).filter(|d| !d.as_os_str().is_empty());
        }

        Ok(())
    }
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    value.trim().parse().map_err(|e| ConfigError::EnvParseError {
        var: var.to_string(),
        source: Box::new(e),
    })
}
