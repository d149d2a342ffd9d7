//! du-mailer - Weekly home directory usage reports by email
//!
//! This crate provides functionality for:
//! - Sampling usage of a shared filesystem against a threshold
//! - Collecting per-user home directory sizes from an external command
//! - Mailing the breakdown to users and failures to managers over SMTP
//! - A cooperative weekly scheduler with signal-driven shutdown

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod mail;
pub mod monitor;
pub mod usage;

// Re-export commonly used types
pub use config::{Config, Members};
pub use error::{DuMailerError, Result};
