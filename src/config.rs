//! Configuration Module
//!
//! Handles loading and managing server configuration. Values are layered:
//! built-in defaults, then `config.yml`, then environment variables (which
//! may themselves come from a `.env` file loaded by the binary).

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;

/// File read by [`Config::load`] when `CONFIG_FILE` is not set.
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

const DEFAULT_CACHE_SIZE: usize = 10;
const DEFAULT_CACHE_SHARDS: usize = 1;
const DEFAULT_PORT: u16 = 10000;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Replaced by the port in `logFile`, so several instances can share one file layout.
const INSTANCE_ID_PLACEHOLDER: &str = "<<instanceId>>";

/// Failure to read or parse the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to parse configuration file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Server configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub cache_size: usize,
    /// Number of independently locked cache partitions
    pub cache_shards: usize,
    /// HTTP server port
    pub port: u16,
    /// Tracing level applied to this crate and the HTTP layer
    pub log_level: String,
    /// Optional JSON log file, written in addition to stdout
    pub log_file: Option<PathBuf>,
    /// Settings that were present but could not be used, with their raw values
    rejected: Vec<(&'static str, String)>,
    /// Configuration file the values were read from, if any
    file: Option<PathBuf>,
}

/// Keys accepted in `config.yml`.
///
/// Every value is kept as a raw YAML scalar so `port: 8080` and
/// `port: "8080"` are treated the same way.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    #[serde(rename = "logLevel")]
    log_level: Option<Value>,
    #[serde(rename = "logFile")]
    log_file: Option<Value>,
    port: Option<Value>,
    #[serde(rename = "cache-size")]
    cache_size: Option<Value>,
    #[serde(rename = "cache-shards")]
    cache_shards: Option<Value>,
}

#[derive(Debug, Clone, Copy)]
enum Setting {
    CacheSize,
    CacheShards,
    Port,
    LogLevel,
    LogFile,
}

impl Config {
    /// Loads the full configuration for the server process.
    ///
    /// Reads the file named by `CONFIG_FILE` (default `config.yml` in the
    /// working directory) when it exists, then applies environment overrides.
    /// A missing default file is not an error; a named file that is missing
    /// or unparsable is.
    ///
    /// # Environment Variables
    /// - `CACHE_SIZE` - Maximum cache entries (default: 10)
    /// - `CACHE_SHARDS` - Number of cache partitions (default: 1)
    /// - `PORT` - HTTP server port (default: 10000)
    /// - `LOG_LEVEL` - One of debug, info, warning, error (default: info)
    /// - `LOG_FILE` - Path of an extra JSON log file (default: none)
    pub fn load() -> Result<Self, ConfigError> {
        let (path, required) = match env::var("CONFIG_FILE") {
            Ok(path) if !path.trim().is_empty() => (PathBuf::from(path), true),
            _ => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let file = if required || path.exists() {
            Some(path.as_path())
        } else {
            None
        };

        Self::layered(file, |name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable source.
    ///
    /// Values that fail to parse fall back to their default and are kept in
    /// [`Config::rejected`] so they can be reported once logging is up.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_lookup(lookup);
        config.resolve_log_file();
        config
    }

    /// Reads `config.yml`-style settings from `path`, without environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::layered(Some(path.as_ref()), |_| None)
    }

    /// Parses `config.yml`-style settings from a string.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_file(FileConfig::parse(text)?);
        config.resolve_log_file();
        Ok(config)
    }

    /// Defaults, then the file at `path` (if given), then `lookup`.
    pub fn layered<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = path {
            let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            config.apply_file(FileConfig::parse(&text)?);
            config.file = Some(path.to_path_buf());
        }

        config.apply_lookup(lookup);
        config.resolve_log_file();
        Ok(config)
    }

    /// Tracing filter directive derived from `log_level`.
    pub fn log_filter(&self) -> String {
        format!("gcache={level},tower_http={level}", level = self.log_level)
    }

    /// Settings that were present but invalid.
    pub fn rejected(&self) -> &[(&'static str, String)] {
        &self.rejected
    }

    /// Configuration file that was read, if any.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    // == Layering ==

    fn apply_file(&mut self, file: FileConfig) {
        let settings = [
            (Setting::CacheSize, "cache-size", file.cache_size),
            (Setting::CacheShards, "cache-shards", file.cache_shards),
            (Setting::Port, "port", file.port),
            (Setting::LogLevel, "logLevel", file.log_level),
            (Setting::LogFile, "logFile", file.log_file),
        ];

        for (setting, name, value) in settings {
            if let Some(raw) = value.and_then(scalar_text) {
                self.apply(setting, name, raw);
            }
        }
    }

    fn apply_lookup<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = [
            (Setting::CacheSize, "CACHE_SIZE"),
            (Setting::CacheShards, "CACHE_SHARDS"),
            (Setting::Port, "PORT"),
            (Setting::LogLevel, "LOG_LEVEL"),
            (Setting::LogFile, "LOG_FILE"),
        ];

        for (setting, name) in settings {
            if let Some(raw) = lookup(name) {
                self.apply(setting, name, raw);
            }
        }
    }

    fn apply(&mut self, setting: Setting, name: &'static str, raw: String) {
        let accepted = match setting {
            Setting::CacheSize => raw
                .trim()
                .parse::<usize>()
                .map(|size| self.cache_size = size)
                .is_ok(),
            Setting::CacheShards => match raw.trim().parse::<usize>() {
                Ok(shards) if shards > 0 => {
                    self.cache_shards = shards;
                    true
                }
                _ => false,
            },
            Setting::Port => raw
                .trim()
                .parse::<u16>()
                .map(|port| self.port = port)
                .is_ok(),
            Setting::LogLevel => translate_log_level(&raw)
                .map(|level| self.log_level = level.to_string())
                .is_some(),
            Setting::LogFile => {
                // An empty value switches the file sink off
                let path = raw.trim();
                self.log_file = (!path.is_empty()).then(|| PathBuf::from(path));
                true
            }
        };

        if !accepted {
            self.rejected.push((name, raw));
        }
    }

    fn resolve_log_file(&mut self) {
        if let Some(path) = self.log_file.take() {
            let resolved = path
                .to_string_lossy()
                .replacen(INSTANCE_ID_PLACEHOLDER, &self.port.to_string(), 1);
            self.log_file = Some(PathBuf::from(resolved));
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            cache_shards: DEFAULT_CACHE_SHARDS,
            port: DEFAULT_PORT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
            rejected: Vec::new(),
            file: None,
        }
    }
}

impl FileConfig {
    fn parse(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Text form of a YAML scalar; `None` for an empty (`~`) value.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(format!("{:?}", other)),
    }
}

fn translate_log_level(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warning" | "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}
