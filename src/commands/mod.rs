//! Subcommand implementations

pub mod check;
pub mod instance;
pub mod report;
pub mod run;

use std::path::{Path, PathBuf};

use crate::config::{Config, Members};
use crate::error::Result;
use crate::mail::{MailComposer, Mailer, SmtpRelay};
use crate::monitor::Notifier;
use crate::usage::{CommandUsageSource, StatvfsSampler};

/// Configuration and mailing lists, loaded once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub config_path: PathBuf,
    pub config: Config,
    pub members: Members,
}

impl Settings {
    pub fn load(config: Option<&Path>, members: Option<&Path>) -> Result<Self> {
        let config_path = match config {
            Some(p) => p.to_path_buf(),
            None => Config::default_path()?,
        };
        let members_path = members
            .map(Path::to_path_buf)
            .unwrap_or_else(|| Members::default_path(&config_path));

        let config = Config::load(Some(&config_path))?;
        let members = Members::load(&members_path)?;

        Ok(Self {
            config_path,
            config,
            members,
        })
    }
}

/// Wire the notifier to statvfs, the usage command and the SMTP relay
pub fn build_notifier(config: &Config, members: &Members) -> Result<Notifier> {
    let sender = config.relay.sender_address()?;

    let composer = MailComposer::new(
        sender.clone(),
        members.user_addresses(),
        members.manager_addresses(),
    );
    let disk = StatvfsSampler::new(config.monitor.path.clone());
    let usage = CommandUsageSource::new(
        config.monitor.usage_command.clone(),
        config.monitor.prefix_len,
    );
    let transport = Mailer::new(SmtpRelay::from_config(&config.relay), sender);

    Ok(Notifier::new(
        config.monitor.notify_threshold,
        composer,
        Box::new(disk),
        Box::new(usage),
        Box::new(transport),
    ))
}
