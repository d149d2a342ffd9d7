//! Report command: print the usage breakdown without mailing it

use super::Settings;
use crate::error::Result;
use crate::mail::format_notification_body;
use crate::usage::{CommandUsageSource, UsageSource};

pub fn run(settings: Settings) -> Result<()> {
    let monitor = &settings.config.monitor;
    let source = CommandUsageSource::new(monitor.usage_command.clone(), monitor.prefix_len);

    let records = source.collect()?;

    println!("{}", format_notification_body(&records));
    tracing::info!(count = records.len(), "Usage report printed");

    Ok(())
}
