//! Configuration with environment variable and file-based loading.
//!
//! Environment variables:
//! - `PB_DATABASE_PATH`: SQLite database file
//! - `PB_PASTE_ID_WIDTH`: characters per paste compact ID
//! - `PB_URL_ID_WIDTH`: characters per short-URL compact ID
//! - `PB_BUSY_TIMEOUT_MS`: how long a transaction waits on a locked database

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Widest compact ID whose range still fits in a `u64`.
pub const MAX_ID_WIDTH: usize = 10;

/// Configuration for a pb instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PbConfig {
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Display width of paste compact IDs.
    #[serde(default = "default_paste_id_width")]
    pub paste_id_width: usize,

    /// Display width of short-URL compact IDs.
    #[serde(default = "default_url_id_width")]
    pub url_id_width: usize,

    /// Busy timeout handed to SQLite, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("pb.db")
}

fn default_paste_id_width() -> usize {
    4
}

fn default_url_id_width() -> usize {
    3
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for PbConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            paste_id_width: default_paste_id_width(),
            url_id_width: default_url_id_width(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl PbConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            database_path: env::var("PB_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            paste_id_width: env_or("PB_PASTE_ID_WIDTH", defaults.paste_id_width)?,
            url_id_width: env_or("PB_URL_ID_WIDTH", defaults.url_id_width)?,
            busy_timeout_ms: env_or("PB_BUSY_TIMEOUT_MS", defaults.busy_timeout_ms)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to environment.
    ///
    /// The file should contain a `[pb]` section:
    /// ```toml
    /// [pb]
    /// database_path = "/var/lib/pb/pb.db"
    /// paste_id_width = 4
    /// url_id_width = 3
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let table: toml::Table = contents
            .parse()
            .with_context(|| format!("failed to parse TOML: {}", path.display()))?;

        let Some(section) = table.get("pb") else {
            return Self::from_env();
        };

        let config: PbConfig = section
            .clone()
            .try_into()
            .context("failed to parse [pb] section")?;
        config.validate()?;
        Ok(config)
    }

    /// Create a config with a specific database path.
    pub fn with_database_path(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: path.into(),
            ..Self::default()
        }
    }

    /// Reject widths that cannot address anything or overflow a `u64`.
    pub fn validate(&self) -> Result<()> {
        for (name, width) in [
            ("paste_id_width", self.paste_id_width),
            ("url_id_width", self.url_id_width),
        ] {
            if width == 0 || width > MAX_ID_WIDTH {
                bail!("{} must be between 1 and {}, got {}", name, MAX_ID_WIDTH, width);
            }
        }
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PbConfig::default();
        assert_eq!(config.paste_id_width, 4);
        assert_eq!(config.url_id_width, 3);
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
        config.validate().unwrap();
    }

    #[test]
    fn test_from_file_with_section() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[pb]
database_path = "/tmp/test-pb.db"
paste_id_width = 6
"#
        )
        .unwrap();

        let config = PbConfig::from_file(file.path()).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/test-pb.db"));
        assert_eq!(config.paste_id_width, 6);
        assert_eq!(config.url_id_width, 3);
    }

    #[test]
    fn test_from_file_rejects_bad_width() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pb]\npaste_id_width = 0").unwrap();

        assert!(PbConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_validate_upper_bound() {
        let config = PbConfig {
            url_id_width: MAX_ID_WIDTH + 1,
            ..PbConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
