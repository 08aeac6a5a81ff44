//! Configuration management for postwatch.
//!
//! Configuration is read from `~/.config/postwatch/config.toml` unless a path is
//! given on the command line. `postwatch init` writes a commented default file.

pub mod interval;

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use self::interval::serde_interval;

/// Process-wide settings plus the per-source table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Delay after a successful cycle
    #[serde(with = "serde_interval")]
    pub success_delay: Duration,

    /// Delay after a failed cycle
    #[serde(with = "serde_interval")]
    pub error_delay: Duration,

    /// Default cap on the number of posts taken from a page
    pub max_posts: usize,

    /// Whether new posts are delivered at all
    pub send_posts: bool,

    /// Shared destination for posts when a source has no webhook of its own
    pub webhook: String,

    /// Destination for failure reports
    pub error_webhook: String,

    /// Directory holding one cache file per source
    pub cache_dir: PathBuf,

    /// Accent colour used by some strategies, as `#RRGGBB`
    pub theme_color: String,

    /// Count posts without an identifier as already seen in the no-new-posts check
    pub treat_unidentified_as_seen: bool,

    /// CAS login endpoint for authenticated sources
    pub cas_url: String,

    pub credentials: Option<Credentials>,

    pub sources: BTreeMap<String, SourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            success_delay: Duration::from_secs(180),
            error_delay: Duration::from_secs(60),
            max_posts: 20,
            send_posts: false,
            webhook: String::new(),
            error_webhook: String::new(),
            cache_dir: PathBuf::from("cache"),
            theme_color: "#313183".to_string(),
            treat_unidentified_as_seen: true,
            cas_url: crate::auth::DEFAULT_CAS_URL.to_string(),
            credentials: None,
            sources: BTreeMap::new(),
        }
    }
}

/// One polled page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub link: String,
    pub strategy: String,
    pub max_posts: Option<usize>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub webhook: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load configuration from `path`, or from the default path when `None`.
    ///
    /// A missing file at the default path is created with commented defaults.
    /// A missing file at an explicit path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = Self::default_config_path()?;
                if !default_path.exists() {
                    Self::write_default_config(&default_path)?;
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config = Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: config_path.clone(),
                source,
            },
            other => other,
        })?;

        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that do not depend on a single source.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_posts == 0 {
            return Err(ConfigError::Invalid("max_posts must be at least 1".into()));
        }
        if self.theme_color_value().is_none() {
            return Err(ConfigError::Invalid(format!(
                "theme_color must look like #RRGGBB, got {:?}",
                self.theme_color
            )));
        }
        for (name, source) in &self.sources {
            if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
                return Err(ConfigError::Invalid(format!(
                    "source name {:?} cannot be used as a cache file name",
                    name
                )));
            }
            if source.max_posts == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "[sources.{}] max_posts must be at least 1",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Get the default config file path: `~/.config/postwatch/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("postwatch").join("config.toml"))
    }

    /// Sources that should be started, in name order.
    pub fn enabled_sources(&self) -> impl Iterator<Item = (&String, &SourceConfig)> {
        self.sources.iter().filter(|(_, source)| source.enabled)
    }

    /// Accent colour as a 24-bit integer.
    pub fn theme_color_value(&self) -> Option<u32> {
        let hex = self.theme_color.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        u32::from_str_radix(hex, 16).ok()
    }

    /// Write the commented default configuration to `path`.
    pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    pub fn default_config_content() -> String {
        r##"# postwatch configuration
#
# Delays accept "500ms", "90s", "3m", "1h" or a plain number of seconds.

# Wait after a successful cycle
success_delay = "3m"

# Wait after a failed cycle
error_delay = "1m"

# Default number of posts taken from the top of each page
max_posts = 20

# Deliver new posts (when false, caches are still updated)
send_posts = false

# Shared Discord webhook for sources without their own
webhook = ""

# Discord webhook for failure reports (falls back to the source webhook)
error_webhook = ""

# One file per source, named after the source
cache_dir = "cache"

theme_color = "#313183"

# Posts whose identifier cannot be extracted count as already seen when
# deciding whether a page changed at all
treat_unidentified_as_seen = true

cas_url = "https://cas.finki.ukim.mk/cas/login"

# Required by the activities, course, diplomas, internships and masters strategies
# [credentials]
# username = ""
# password = ""

# [sources.events]
# link = "https://finki.ukim.mk/mk/news"
# strategy = "events"
# max_posts = 10
# name = "Настани"
# role = ""
# webhook = ""
# enabled = true
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
