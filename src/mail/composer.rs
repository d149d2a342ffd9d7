use lettre::Address;

use super::message::Message;
use crate::usage::UsageRecord;

pub const NOTIFICATION_SUBJECT: &str = "Home Directory Usage Notification";

/// Divisor applied to byte counts before the "GB" label.
///
/// This is 2^20, so the figures are MiB despite the label.
const REPORT_UNIT: f64 = (1u64 << 20) as f64;

/// Builds the two kinds of mail the notifier sends
#[derive(Debug, Clone)]
pub struct MailComposer {
    sender: Address,
    users: Vec<Address>,
    managers: Vec<Address>,
}

impl MailComposer {
    pub fn new(sender: Address, users: Vec<Address>, managers: Vec<Address>) -> Self {
        Self {
            sender,
            users,
            managers,
        }
    }

    pub fn users(&self) -> &[Address] {
        &self.users
    }

    pub fn managers(&self) -> &[Address] {
        &self.managers
    }

    /// Usage breakdown addressed to every user
    pub fn notification(&self, records: &[UsageRecord]) -> Message {
        Message {
            subject: NOTIFICATION_SUBJECT.to_string(),
            from: self.sender.clone(),
            to: self.users.clone(),
            body: format_notification_body(records),
        }
    }

    /// Failure report addressed to every manager
    pub fn error_report(&self, subject: &str, body: &str) -> Message {
        Message {
            subject: subject.to_string(),
            from: self.sender.clone(),
            to: self.managers.clone(),
            body: body.to_string(),
        }
    }
}

pub fn format_notification_body(records: &[UsageRecord]) -> String {
    let lines: Vec<String> = records.iter().map(format_usage_line).collect();
    format!("{}\n\n{}", NOTIFICATION_SUBJECT, lines.join("\n"))
}

/// `owner` padded to 12 columns, then the size in units of 2^20 bytes
pub fn format_usage_line(record: &UsageRecord) -> String {
    format!(
        "{:<12}: {:>8.2} GB",
        record.owner,
        record.bytes as f64 / REPORT_UNIT
    )
}
