//! Configuration loading from YAML or TOML with environment overrides.

use crate::schema::Config;
use pbbot_common::PbBotError;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Files looked up in the working directory when no path is given.
const DEFAULT_CONFIG_FILES: [&str; 3] = ["config.yaml", "config.yml", "config.toml"];

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file `{path}`: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    Validation(String),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {message}")]
    EnvParse {
        /// Variable name.
        var: String,
        /// Parse failure description.
        message: String,
    },
}

impl From<ConfigError> for PbBotError {
    fn from(err: ConfigError) -> Self {
        Self::config(err.to_string())
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from `path`, `PBBOT_CONFIG_PATH`, a default file in
    /// the working directory, or built-in defaults, in that order. Environment
    /// overrides are applied and the result is validated.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| env::var_os("PBBOT_CONFIG_PATH").map(PathBuf::from));

        let source = explicit.or_else(|| {
            DEFAULT_CONFIG_FILES
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
        });

        let mut config = match source {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::load_file(&path)?
            }
            None => {
                info!("No configuration file found, using defaults");
                Config::default()
            }
        };

        Self::apply_overrides(&mut config, |var| env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration file, choosing the format by extension.
    pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, path.extension().and_then(|ext| ext.to_str()))
    }

    /// Parses configuration text. `toml` selects TOML, anything else YAML.
    pub fn parse(content: &str, extension: Option<&str>) -> Result<Config, ConfigError> {
        match extension {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(toml::from_str(content)?),
            _ => Ok(serde_yaml::from_str(content)?),
        }
    }

    /// Applies overrides looked up through `lookup` (the process environment
    /// in production).
    pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("DISCORD_TOKEN") {
            config.discord.token = token;
        }

        if let Some(url) = lookup("PBBOT_DATABASE_URL") {
            config.database.url = url;
        }

        if let Some(level) = lookup("PBBOT_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(interval) = lookup("PBBOT_FLUSH_INTERVAL") {
            config.scheduling.flush_interval_seconds =
                interval.parse().map_err(|e: std::num::ParseIntError| ConfigError::EnvParse {
                    var: "PBBOT_FLUSH_INTERVAL".to_string(),
                    message: e.to_string(),
                })?;
        }

        debug!("Environment overrides applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = Config::default();
        let vars: HashMap<&str, &str> = [
            ("DISCORD_TOKEN", "env_token"),
            ("PBBOT_DATABASE_URL", "sqlite::memory:"),
            ("PBBOT_FLUSH_INTERVAL", "30"),
        ]
        .into_iter()
        .collect();

        ConfigLoader::apply_overrides(&mut config, |var| vars.get(var).map(ToString::to_string))
            .unwrap();

        assert_eq!(config.discord.token, "env_token");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.scheduling.flush_interval_seconds, 30);
    }

    #[test]
    fn test_bad_numeric_override_is_reported() {
        let mut config = Config::default();
        let result = ConfigLoader::apply_overrides(&mut config, |var| {
            (var == "PBBOT_FLUSH_INTERVAL").then(|| "soon".to_string())
        });

        assert!(matches!(
            result,
            Err(ConfigError::EnvParse { ref var, .. }) if var == "PBBOT_FLUSH_INTERVAL"
        ));
    }

    #[test]
    fn test_format_is_chosen_by_extension() {
        let toml = "[discord]\ntoken = \"t\"\n";
        let config = ConfigLoader::parse(toml, Some("toml")).unwrap();
        assert_eq!(config.discord.token, "t");

        let yaml = "discord:\n  token: \"y\"\n";
        let config = ConfigLoader::parse(yaml, None).unwrap();
        assert_eq!(config.discord.token, "y");
    }
}
