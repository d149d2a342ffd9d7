use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use du_mailer::error::{CollectionError, DuMailerError, TransportError};
use du_mailer::mail::{
    DeliveryReport, MailComposer, MailTransport, Mailer, Message, RcptStatus, Relay,
    RelaySession, NOTIFICATION_SUBJECT,
};
use du_mailer::monitor::{Notifier, NotifierState, TickOutcome};
use du_mailer::usage::{DiskSampler, DiskUsage, UsageRecord, UsageSource};
use lettre::Address;

struct FixedDisk {
    used: u64,
    total: u64,
}

impl DiskSampler for FixedDisk {
    fn sample(&self) -> du_mailer::Result<DiskUsage> {
        Ok(DiskUsage {
            path: PathBuf::from("/home"),
            total: self.total,
            used: self.used,
            free: self.total - self.used,
        })
    }
}

struct FixedUsage;

impl UsageSource for FixedUsage {
    fn collect(&self) -> Result<Vec<UsageRecord>, CollectionError> {
        Ok(vec![
            UsageRecord::new(2147483648, "alice"),
            UsageRecord::new(1048576, "bob"),
        ])
    }
}

/// Records every send; fails the usage notification with an auth error when asked
#[derive(Clone, Default)]
struct Outbox {
    sent: Arc<Mutex<Vec<(Message, Vec<Address>)>>>,
    refuse_notification: bool,
}

impl Outbox {
    fn sent(&self) -> Vec<(Message, Vec<Address>)> {
        self.sent.lock().unwrap().clone()
    }
}

impl MailTransport for Outbox {
    fn send(
        &self,
        message: &Message,
        recipients: &[Address],
    ) -> Result<DeliveryReport, TransportError> {
        if self.refuse_notification && message.subject == NOTIFICATION_SUBJECT {
            return Err(TransportError::Auth {
                user: "quota@example.org".into(),
                reason: "535 5.7.8 authentication failed".into(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((message.clone(), recipients.to_vec()));
        Ok(DeliveryReport::default())
    }
}

/// Relay that accepts everyone except the listed addresses
#[derive(Clone, Default)]
struct PickyRelay {
    reject: Vec<String>,
    delivered: Arc<Mutex<usize>>,
}

struct PickySession(PickyRelay);

impl Relay for PickyRelay {
    type Session = PickySession;

    fn open(&self) -> Result<PickySession, TransportError> {
        Ok(PickySession(self.clone()))
    }
}

impl RelaySession for PickySession {
    fn mail_from(&mut self, _sender: &Address) -> Result<(), TransportError> {
        Ok(())
    }

    fn rcpt_to(&mut self, recipient: &Address) -> Result<RcptStatus, TransportError> {
        if self.0.reject.contains(&recipient.to_string()) {
            Ok(RcptStatus::Rejected("550 5.1.1 user unknown".into()))
        } else {
            Ok(RcptStatus::Accepted)
        }
    }

    fn data(&mut self, _content: &[u8]) -> Result<(), TransportError> {
        *self.0.delivered.lock().unwrap() += 1;
        Ok(())
    }

    fn quit(&mut self) {}
}

fn addresses(list: &[&str]) -> Vec<Address> {
    list.iter().map(|a| a.parse().unwrap()).collect()
}

fn composer() -> MailComposer {
    MailComposer::new(
        "quota@example.org".parse().unwrap(),
        addresses(&["alice@example.org", "bob@example.org", "dan@example.org"]),
        addresses(&["carol@example.org", "erin@example.org"]),
    )
}

fn notifier(
    used: u64,
    total: u64,
    threshold: f64,
    transport: impl MailTransport + 'static,
) -> Notifier {
    Notifier::new(
        threshold,
        composer(),
        Box::new(FixedDisk { used, total }),
        Box::new(FixedUsage),
        Box::new(transport),
    )
}

#[test]
fn ratio_equal_to_threshold_sends_nothing() {
    let outbox = Outbox::default();
    let mut n = notifier(50, 100, 0.5, outbox.clone());

    let outcome = n.update().unwrap();

    assert_eq!(outcome, TickOutcome::BelowThreshold { ratio: 0.5 });
    assert!(outbox.sent().is_empty());
}

#[test]
fn ratio_one_unit_above_threshold_sends_once() {
    let outbox = Outbox::default();
    let mut n = notifier(51, 100, 0.5, outbox.clone());

    let outcome = n.update().unwrap();

    assert!(matches!(outcome, TickOutcome::Notified { .. }));
    let sent = outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0.subject, NOTIFICATION_SUBJECT);
    assert_eq!(sent[0].1, composer().users());
    assert!(sent[0].0.body.contains("alice       :  2048.00 GB"));
}

#[test]
fn consecutive_ticks_below_threshold_send_nothing() {
    let outbox = Outbox::default();
    let mut n = notifier(10, 100, 0.9, outbox.clone());

    n.update().unwrap();
    n.update().unwrap();

    assert!(outbox.sent().is_empty());
    assert_eq!(n.state(), NotifierState::Idle);
}

#[test]
fn one_rejected_recipient_is_logged_not_fatal() {
    let relay = PickyRelay {
        reject: vec!["bob@example.org".into()],
        ..Default::default()
    };
    let mailer = Mailer::new(relay.clone(), "quota@example.org".parse().unwrap());
    let mut n = notifier(95, 100, 0.9, mailer);

    let outcome = n.update().unwrap();

    let TickOutcome::Notified { report, .. } = outcome else {
        panic!("expected a notification");
    };
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures.contains_key("bob@example.org"));
    assert_eq!(*relay.delivered.lock().unwrap(), 1);
    assert_eq!(n.state(), NotifierState::Idle);
}

#[test]
fn auth_failure_reports_once_to_managers_and_fails() {
    let outbox = Outbox {
        refuse_notification: true,
        ..Default::default()
    };
    let mut n = notifier(95, 100, 0.9, outbox.clone());

    let err = n.update().unwrap_err();

    match err {
        DuMailerError::UpdateFailed(inner) => {
            assert!(matches!(*inner, DuMailerError::Transport(TransportError::Auth { .. })))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(n.state(), NotifierState::Failed);

    let sent = outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, composer().managers());
    assert!(sent[0].0.subject.ends_with(" : Sending Mail Failed"));
    assert!(sent[0].0.body.contains("Authentication as 'quota@example.org' failed"));
}
