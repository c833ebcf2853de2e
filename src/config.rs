use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default Things Cloud API root.
pub const DEFAULT_API_BASE: &str = "https://cloud.culturedcode.com/version/1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Root of the history API
    pub api_base: ConfigValue<String>,
    /// Account history key
    pub history_key: ConfigValue<Option<String>>,
    /// Directory holding the snapshot cache
    pub data_dir: ConfigValue<PathBuf>,
    /// Per-request timeout
    pub timeout_secs: ConfigValue<u64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    api_base: Option<String>,
    history_key: Option<String>,
    data_dir: Option<PathBuf>,
    timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut api_base = ConfigValue::new(DEFAULT_API_BASE.to_string(), ConfigSource::Default);
        let mut history_key = ConfigValue::new(None, ConfigSource::Default);
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut timeout_secs = ConfigValue::new(DEFAULT_TIMEOUT_SECS, ConfigSource::Default);
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(base) = file_config.api_base {
                api_base = ConfigValue::new(base, ConfigSource::File);
            }
            if let Some(key) = file_config.history_key {
                history_key = ConfigValue::new(Some(key), ConfigSource::File);
            }
            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(secs) = file_config.timeout_secs {
                timeout_secs = ConfigValue::new(secs, ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Ok(base) = std::env::var("THINGS_API_BASE") {
            api_base = ConfigValue::new(base, ConfigSource::Environment);
        }
        if let Ok(key) = std::env::var("THINGS_HISTORY_KEY") {
            history_key = ConfigValue::new(Some(key), ConfigSource::Environment);
        }
        if let Ok(dir) = std::env::var("THINGS_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(secs) = std::env::var("THINGS_TIMEOUT_SECS") {
            let parsed = secs
                .parse()
                .map_err(|_| ConfigError::InvalidValue("THINGS_TIMEOUT_SECS", secs.clone()))?;
            timeout_secs = ConfigValue::new(parsed, ConfigSource::Environment);
        }

        Ok(Self {
            api_base,
            history_key,
            data_dir,
            timeout_secs,
            config_file,
        })
    }

    /// The history key, required by every command that talks to the server.
    pub fn require_history_key(&self) -> Result<&str, ConfigError> {
        self.history_key
            .value
            .as_deref()
            .ok_or(ConfigError::MissingValue("history_key", "THINGS_HISTORY_KEY"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.value)
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/things-sync/
    /// - macOS: ~/Library/Application Support/things-sync/
    /// - Windows: %APPDATA%/things-sync/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("things-sync")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/things-sync/
    /// - macOS: ~/Library/Application Support/things-sync/
    /// - Windows: %APPDATA%/things-sync/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("things-sync")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(&'static str, String),
    MissingValue(&'static str, &'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(var, value) => {
                write!(f, "Invalid value for {}: '{}'", var, value)
            }
            ConfigError::MissingValue(key, var) => {
                write!(
                    f,
                    "{} is not configured. Add it to the config file or set {}.",
                    key, var
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.api_base.value, DEFAULT_API_BASE);
        assert_eq!(config.api_base.source, ConfigSource::Default);
        assert!(config
            .data_dir
            .value
            .to_string_lossy()
            .contains("things-sync"));
        assert_eq!(config.timeout_secs.value, 30);
        assert_eq!(config.config_file, None);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "api_base: http://localhost:8080/version/1").unwrap();
        writeln!(file, "history_key: abc123").unwrap();
        writeln!(file, "data_dir: /custom/things").unwrap();
        writeln!(file, "timeout_secs: 5").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(config.api_base.value, "http://localhost:8080/version/1");
        assert_eq!(config.api_base.source, ConfigSource::File);
        assert_eq!(config.require_history_key().unwrap(), "abc123");
        assert_eq!(config.data_dir.value, PathBuf::from("/custom/things"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_data_dir_resolves_against_config_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "data_dir: cache").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.data_dir.value, temp_dir.path().join("cache"));
    }

    #[test]
    fn test_missing_history_key() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "timeout_secs: 10").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        let err = config.require_history_key().unwrap_err();
        assert!(err.to_string().contains("THINGS_HISTORY_KEY"));
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "history_key: fromfile").unwrap();

        std::env::set_var("THINGS_HISTORY_KEY", "fromenv");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.history_key.value.as_deref(), Some("fromenv"));
        assert_eq!(config.history_key.source, ConfigSource::Environment);

        std::env::remove_var("THINGS_HISTORY_KEY");
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
