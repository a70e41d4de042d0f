//! Daemon configuration, shared with clients for the listen address.
//!
//! Settings come from, in increasing precedence: built-in defaults, the TOML
//! file (`$XDG_CONFIG_HOME/notiline/config.toml` unless a path is given),
//! environment variables, and finally CLI flags applied by the binary.
//!
//! ```toml
//! listen_addr = "127.0.0.1:8082"
//! default_timeout_secs = 15
//! max_subscribers = 32
//! dbus = true
//! ```

use std::path::{Path, PathBuf};

use notiline_core::DEFAULT_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default address of the subscriber listener.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8082";

/// Default cap on concurrently subscribed connections.
pub const DEFAULT_MAX_SUBSCRIBERS: usize = 32;

/// Overrides `listen_addr`.
pub const LISTEN_ENV: &str = "NOTILINE_LISTEN";

/// Overrides `default_timeout_secs`.
pub const DEFAULT_TIMEOUT_ENV: &str = "NOTILINE_DEFAULT_TIMEOUT";

/// Daemon settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Address the line-based subscriber listener binds to.
    pub listen_addr: String,

    /// Countdown used for notifications that ask for the default timeout.
    pub default_timeout_secs: u32,

    /// Maximum number of simultaneously subscribed connections.
    pub max_subscribers: usize,

    /// Whether to claim `org.freedesktop.Notifications` on the session bus.
    pub dbus: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_subscribers: DEFAULT_MAX_SUBSCRIBERS,
            dbus: true,
        }
    }
}

impl Config {
    /// The per-user config file location, if a config dir is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("notiline").join("config.toml"))
    }

    /// Parses a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Loads configuration from `path`, or from the default location.
    ///
    /// An explicitly given file must exist; a missing default file simply
    /// yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                debug!(path = %path.display(), "Loaded config file");
                Self::from_toml_str(&contents)
            }
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Read {
                path,
                error: e.to_string(),
            }),
        }
    }

    /// Applies `NOTILINE_*` environment overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(LISTEN_ENV) {
            self.listen_addr = addr;
        }

        if let Some(raw) = lookup(DEFAULT_TIMEOUT_ENV) {
            self.default_timeout_secs =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv {
                        var: DEFAULT_TIMEOUT_ENV,
                        value: raw.clone(),
                    })?;
        }

        Ok(())
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {error}")]
    Read { path: PathBuf, error: String },

    #[error("Invalid config: {0}")]
    Parse(String),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}
