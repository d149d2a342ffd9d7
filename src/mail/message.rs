use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::Address;

use crate::error::TransportError;

/// A plain-text email, built once per send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub from: Address,
    pub to: Vec<Address>,
    pub body: String,
}

impl Message {
    /// Build the MIME representation: `multipart/alternative` with a single
    /// `text/plain` part.
    pub fn to_email(&self) -> Result<lettre::Message, TransportError> {
        let mut builder = lettre::Message::builder()
            .from(Mailbox::new(None, self.from.clone()))
            .subject(self.subject.as_str());

        for address in &self.to {
            builder = builder.to(Mailbox::new(None, address.clone()));
        }

        let email = builder
            .multipart(MultiPart::alternative().singlepart(SinglePart::plain(self.body.clone())))?;

        Ok(email)
    }

    /// RFC 5322 bytes for the DATA phase
    pub fn formatted(&self) -> Result<Vec<u8>, TransportError> {
        Ok(self.to_email()?.formatted())
    }
}
