//! Message composition and SMTP submission.

pub mod composer;
pub mod message;
pub mod smtp;
pub mod transport;

pub use composer::{
    format_notification_body, format_usage_line, MailComposer, NOTIFICATION_SUBJECT,
};
pub use message::Message;
pub use smtp::SmtpRelay;
pub use transport::{
    DeliveryReport, MailTransport, Mailer, RcptStatus, Relay, RelaySession,
};
