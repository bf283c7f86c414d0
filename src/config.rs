use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use phplens_logs::{DEFAULT_CHUNK_SIZE, ParserConfig, ReaderConfig};

/// Settings read from `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chunk_size: usize,

    /// IANA zone for timestamps written without one
    pub timezone: String,

    pub verify_source_files: bool,
    pub disabled_severities: Vec<String>,

    /// Entries shown by `tail` without `-n`
    pub default_entries: usize,

    pub cache_ttl_secs: u64,
    pub seen_ttl_secs: u64,
    pub cache_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            timezone: "UTC".to_string(),
            verify_source_files: true,
            disabled_severities: Vec::new(),
            default_entries: 50,
            cache_ttl_secs: 600,
            seen_ttl_secs: 30 * 24 * 60 * 60,
            cache_path: None,
        }
    }
}

impl Config {
    /// Load from an explicit path, or from the default location if it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn reader_config(&self) -> Result<ReaderConfig> {
        let timezone: Tz = self
            .timezone
            .parse()
            .map_err(|err| anyhow!("unknown timezone {:?}: {}", self.timezone, err))?;

        Ok(ReaderConfig {
            chunk_size: self.chunk_size,
            parser: ParserConfig {
                timezone,
                verify_source_files: self.verify_source_files,
            },
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            seen_ttl: Duration::from_secs(self.seen_ttl_secs),
        })
    }

    /// Where bookkeeping between runs is stored
    pub fn cache_file(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("phplens")
                .join("cache.json")
        })
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("phplens").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            timezone = "Europe/Berlin"
            disabled_severities = ["notice", "deprecated"]
            "#,
        )
        .unwrap();

        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.default_entries, 50);
        assert_eq!(config.disabled_severities, vec!["notice", "deprecated"]);

        let reader = config.reader_config().unwrap();
        assert_eq!(reader.parser.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(reader.cache_ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_unknown_timezone_is_an_error() {
        let config = Config {
            timezone: "Mars/Olympus".to_string(),
            ..Config::default()
        };
        assert!(config.reader_config().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "chunk_size = 512\ncache_path = \"/tmp/x.json\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.chunk_size, 512);
        assert_eq!(config.cache_file(), PathBuf::from("/tmp/x.json"));

        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
