use chrono::{NaiveTime, Weekday};
use lettre::Address;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub relay: RelayConfig,
    pub monitor: MonitorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// SMTP relay host name
    pub host: String,
    /// Submission port (STARTTLS)
    pub port: u16,
    /// Envelope and From address
    pub sender: String,
    /// Login name, defaults to the sender address
    pub username: Option<String>,
    pub password: String,
    /// Network timeout in seconds (0 = none)
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Filesystem whose usage ratio is checked
    pub path: PathBuf,
    /// Fraction of capacity (0-1) above which users are notified
    pub notify_threshold: f64,
    /// Day of the week the check runs on
    pub weekday: String,
    /// Time of day (HH:MM) the check runs at; unset = time the scheduler started
    pub at: Option<String>,
    /// Seconds slept between scheduler polls
    pub poll_interval: u64,
    /// Command printing `<bytes>\t<path>` per home directory
    pub usage_command: Vec<String>,
    /// Characters stripped from each path to recover the user name
    pub prefix_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Directory holding the daily rotated log files
    pub directory: PathBuf,
    /// Base name of the log file
    pub file_name: String,
    /// Mirror log lines to stderr
    pub console: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            sender: String::new(),
            username: None,
            password: String::new(),
            timeout_secs: 60,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/home"),
            notify_threshold: 0.9,
            weekday: "monday".to_string(),
            at: None,
            poll_interval: 60,
            usage_command: vec!["sudo".to_string(), "./du_homes.sh".to_string()],
            prefix_len: 6,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("log"),
            file_name: "forward.log".to_string(),
            console: false,
        }
    }
}

impl Config {
    /// Default config location: `$XDG_CONFIG_HOME/du-mailer/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("du-mailer").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load and validate the configuration file.
    ///
    /// `.json` files are parsed as JSON, everything else as TOML.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        let config: Config = load_file(&path)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.relay.validate()?;
        self.monitor.validate()?;

        if self.logging.file_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "logging.file_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl RelayConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("relay.host must be set".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("relay.port must be non-zero".to_string()));
        }
        self.sender_address()?;
        Ok(())
    }

    pub fn sender_address(&self) -> Result<Address, ConfigError> {
        self.sender.parse().map_err(|e| {
            ConfigError::Invalid(format!("relay.sender '{}' is not an address: {}", self.sender, e))
        })
    }

    pub fn login(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.sender)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl MonitorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.notify_threshold) {
            return Err(ConfigError::Invalid(format!(
                "monitor.notify_threshold must be between 0 and 1, got {}",
                self.notify_threshold
            )));
        }
        if self.poll_interval == 0 {
            return Err(ConfigError::Invalid(
                "monitor.poll_interval must be at least 1 second".to_string(),
            ));
        }
        if self.usage_command.is_empty() {
            return Err(ConfigError::Invalid(
                "monitor.usage_command must not be empty".to_string(),
            ));
        }
        self.weekday()?;
        self.at()?;
        Ok(())
    }

    pub fn weekday(&self) -> Result<Weekday, ConfigError> {
        parse_weekday(&self.weekday)
    }

    pub fn at(&self) -> Result<Option<NaiveTime>, ConfigError> {
        self.at.as_deref().map(parse_time).transpose()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }
}

/// Parse `monday`, `Mon`, ... into a weekday
pub fn parse_weekday(day: &str) -> Result<Weekday, ConfigError> {
    day.trim()
        .parse::<Weekday>()
        .map_err(|_| ConfigError::Invalid(format!("'{}' is not a day of the week", day)))
}

/// Parse `HH:MM` into a time of day
pub fn parse_time(time: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map_err(|_| ConfigError::Invalid(format!("'{}' is not a HH:MM time", time)))
}

/// Mailing lists: user name -> address
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Members {
    pub users: BTreeMap<String, Address>,
    pub managers: BTreeMap<String, Address>,
}

impl Members {
    /// Members file next to the config file
    pub fn default_path(config_path: &Path) -> PathBuf {
        config_path.with_file_name("members.toml")
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let members: Members = load_file(path)?;
        members.validate()?;
        Ok(members)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.users.is_empty() {
            return Err(ConfigError::Invalid("members.users must not be empty".to_string()));
        }
        if self.managers.is_empty() {
            return Err(ConfigError::Invalid(
                "members.managers must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn user_addresses(&self) -> Vec<Address> {
        unique(self.users.values())
    }

    pub fn manager_addresses(&self) -> Vec<Address> {
        unique(self.managers.values())
    }
}

fn unique<'a>(addresses: impl Iterator<Item = &'a Address>) -> Vec<Address> {
    let mut out: Vec<Address> = Vec::new();
    for address in addresses {
        if !out.contains(address) {
            out.push(address.clone());
        }
    }
    out
}

fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).map_err(|source| ConfigError::JsonError {
            path: path.to_path_buf(),
            source,
        })
    } else {
        toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }
}
