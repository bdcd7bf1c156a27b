//! JSON configuration file
//!
//! Every field is optional; an empty object runs against the default client
//! URL without credential auto-fill and without a blacklist.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_APP_URL: &str = "https://teams.microsoft.com";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One blacklist rule: a team, and optionally only some of its channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub team_name: String,
    /// Empty means the whole team.
    #[serde(default)]
    pub channel_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Waiting for the email and password fields
    pub login_secs: u64,
    /// Waiting for the organization panel after load; logins can be slow
    pub main_panel_secs: u64,
    /// Waiting for join buttons after opening a channel's call panel
    pub call_panel_secs: u64,
    /// Waiting for each control of the join sequence
    pub join_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            login_secs: 60,
            main_panel_secs: 300,
            call_panel_secs: 60,
            join_secs: 30,
        }
    }
}

impl Timeouts {
    pub fn login(&self) -> Duration {
        Duration::from_secs(self.login_secs)
    }

    pub fn main_panel(&self) -> Duration {
        Duration::from_secs(self.main_panel_secs)
    }

    pub fn call_panel(&self) -> Duration {
        Duration::from_secs(self.call_panel_secs)
    }

    pub fn join(&self) -> Duration {
        Duration::from_secs(self.join_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    pub headless: bool,
    /// Profile directory; reusing one keeps the client logged in across runs
    pub user_data_dir: Option<PathBuf>,
    pub executable: Option<PathBuf>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub email: String,
    pub password: String,
    pub blacklist: Vec<BlacklistEntry>,
    pub app_url: String,
    pub poll_interval_secs: u64,
    pub timeouts: Timeouts,
    pub browser: BrowserOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            blacklist: Vec::new(),
            app_url: DEFAULT_APP_URL.to_string(),
            poll_interval_secs: 2,
            timeouts: Timeouts::default(),
            browser: BrowserOptions::default(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("email", &self.email)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .field("blacklist", &self.blacklist)
            .field("app_url", &self.app_url)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("timeouts", &self.timeouts)
            .field("browser", &self.browser)
            .finish()
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_url.trim().is_empty() {
            return Err(ConfigError::Invalid("app_url must not be empty".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Credentials are typed in only when both halves are present.
    pub fn has_credentials(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
