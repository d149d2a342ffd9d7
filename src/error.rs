use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Core library errors
#[derive(Error, Debug)]
pub enum DuMailerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Usage collection failed: {0}")]
    Collection(#[from] CollectionError),

    #[error("Mail transport failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to sample disk usage of '{path}': {source}")]
    Disk {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },

    #[error("IO error at path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("System call failed: {0}")]
    Sys(#[from] nix::Error),

    #[error("Another instance is already running (PID: {0})")]
    AlreadyRunning(u32),

    #[error("update failed: {0}")]
    UpdateFailed(#[source] Box<DuMailerError>),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to parse JSON config file '{path}': {source}")]
    JsonError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No configuration directory available, pass --config")]
    NoConfigDir,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while enumerating per-user usage
#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("Usage command is empty")]
    EmptyCommand,

    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Line {line}: missing tab separator in {content:?}")]
    MissingSeparator { line: usize, content: String },

    #[error("Line {line}: invalid size {value:?}: {source}")]
    InvalidSize {
        line: usize,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("Line {line}: path {path:?} is shorter than the {prefix_len}-character prefix")]
    MissingOwner {
        line: usize,
        path: String,
        prefix_len: usize,
    },
}

/// Errors that abort a mail submission
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to connect to relay {relay}: {source}")]
    Connect {
        relay: String,
        #[source]
        source: lettre::transport::smtp::Error,
    },

    #[error("STARTTLS with relay {relay} failed: {source}")]
    StartTls {
        relay: String,
        #[source]
        source: lettre::transport::smtp::Error,
    },

    #[error("Authentication as '{user}' failed: {reason}")]
    Auth { user: String, reason: String },

    #[error("Relay refused every recipient of '{subject}'")]
    AllRecipientsRefused {
        subject: String,
        failures: BTreeMap<String, String>,
    },

    #[error("SMTP session error: {0}")]
    Session(#[from] lettre::transport::smtp::Error),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, DuMailerError>;
