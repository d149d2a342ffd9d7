use std::collections::BTreeMap;

use lettre::Address;

use super::message::Message;
use crate::error::TransportError;

/// Recipients the relay rejected, with the relay's reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub failures: BTreeMap<String, String>,
}

impl DeliveryReport {
    /// True when every recipient was accepted
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Something that can deliver a [`Message`]
pub trait MailTransport: Send + Sync {
    /// Submit `message` to `recipients`.
    ///
    /// Per-recipient rejections end up in the returned report; connection,
    /// TLS and authentication failures are errors.
    fn send(
        &self,
        message: &Message,
        recipients: &[Address],
    ) -> Result<DeliveryReport, TransportError>;
}

/// Outcome of a single `RCPT TO`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RcptStatus {
    Accepted,
    Rejected(String),
}

/// An authenticated session with a mail relay
pub trait RelaySession {
    fn mail_from(&mut self, sender: &Address) -> Result<(), TransportError>;
    fn rcpt_to(&mut self, recipient: &Address) -> Result<RcptStatus, TransportError>;
    fn data(&mut self, content: &[u8]) -> Result<(), TransportError>;
    fn quit(&mut self);
}

/// Opens authenticated sessions
pub trait Relay: Send + Sync {
    type Session: RelaySession;

    fn open(&self) -> Result<Self::Session, TransportError>;
}

/// Envelope logic on top of a [`Relay`]: one session per send, no retries.
pub struct Mailer<R> {
    relay: R,
    sender: Address,
}

impl<R: Relay> Mailer<R> {
    pub fn new(relay: R, sender: Address) -> Self {
        Self { relay, sender }
    }

    fn submit(
        &self,
        session: &mut R::Session,
        message: &Message,
        recipients: &[Address],
    ) -> Result<DeliveryReport, TransportError> {
        let content = message.formatted()?;

        session.mail_from(&self.sender)?;

        let mut report = DeliveryReport::default();
        let mut accepted = 0usize;
        for recipient in recipients {
            match session.rcpt_to(recipient)? {
                RcptStatus::Accepted => accepted += 1,
                RcptStatus::Rejected(detail) => {
                    report.failures.insert(recipient.to_string(), detail);
                }
            }
        }

        if accepted == 0 {
            return Err(TransportError::AllRecipientsRefused {
                subject: message.subject.clone(),
                failures: report.failures,
            });
        }

        session.data(&content)?;

        Ok(report)
    }
}

impl<R: Relay> MailTransport for Mailer<R> {
    fn send(
        &self,
        message: &Message,
        recipients: &[Address],
    ) -> Result<DeliveryReport, TransportError> {
        if recipients.is_empty() {
            tracing::warn!(subject = %message.subject, "No recipients, nothing sent");
            return Ok(DeliveryReport::default());
        }

        let mut session = self.relay.open()?;
        let result = self.submit(&mut session, message, recipients);
        session.quit();

        let report = result?;

        if !report.is_complete() {
            tracing::error!("`{}` sending failed", message.subject);
            for (address, detail) in &report.failures {
                tracing::error!("{}: {}", address, detail);
            }
        }

        Ok(report)
    }
}
