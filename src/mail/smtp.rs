use std::time::Duration;

use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{SmtpConnection, TlsParameters};
use lettre::transport::smtp::commands::{Data, Mail, Rcpt};
use lettre::transport::smtp::extension::ClientId;
use lettre::Address;

use super::transport::{RcptStatus, Relay, RelaySession};
use crate::config::RelayConfig;
use crate::error::TransportError;

/// SMTP submission relay: plain connect, STARTTLS, then AUTH.
pub struct SmtpRelay {
    host: String,
    port: u16,
    login: String,
    credentials: Credentials,
    timeout: Option<Duration>,
}

impl SmtpRelay {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            login: config.login().to_string(),
            credentials: Credentials::new(config.login().to_string(), config.password.clone()),
            timeout: config.timeout(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Relay for SmtpRelay {
    type Session = SmtpSession;

    fn open(&self) -> Result<SmtpSession, TransportError> {
        let hello = ClientId::default();

        tracing::debug!(relay = %self.endpoint(), "Connecting to mail relay");

        let mut conn = SmtpConnection::connect(
            (self.host.as_str(), self.port),
            self.timeout,
            &hello,
            None,
            None,
        )
        .map_err(|source| TransportError::Connect {
            relay: self.endpoint(),
            source,
        })?;

        let tls = TlsParameters::new(self.host.clone()).map_err(|source| {
            TransportError::StartTls {
                relay: self.endpoint(),
                source,
            }
        })?;

        conn.starttls(&tls, &hello)
            .map_err(|source| TransportError::StartTls {
                relay: self.endpoint(),
                source,
            })?;

        conn.auth(&[Mechanism::Plain, Mechanism::Login], &self.credentials)
            .map_err(|e| TransportError::Auth {
                user: self.login.clone(),
                reason: e.to_string(),
            })?;

        Ok(SmtpSession { conn })
    }
}

pub struct SmtpSession {
    conn: SmtpConnection,
}

impl RelaySession for SmtpSession {
    fn mail_from(&mut self, sender: &Address) -> Result<(), TransportError> {
        self.conn.command(Mail::new(Some(sender.clone()), vec![]))?;
        Ok(())
    }

    fn rcpt_to(&mut self, recipient: &Address) -> Result<RcptStatus, TransportError> {
        match self.conn.command(Rcpt::new(recipient.clone(), vec![])) {
            Ok(_) => Ok(RcptStatus::Accepted),
            // 4xx/5xx replies reject this address only
            Err(e) if e.is_permanent() || e.is_transient() => {
                Ok(RcptStatus::Rejected(e.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn data(&mut self, content: &[u8]) -> Result<(), TransportError> {
        self.conn.command(Data)?;
        self.conn.message(content)?;
        Ok(())
    }

    fn quit(&mut self) {
        if let Err(e) = self.conn.quit() {
            tracing::debug!("QUIT failed: {}", e);
        }
    }
}
