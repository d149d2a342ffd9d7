use chrono::Local;

use crate::error::{DuMailerError, Result};
use crate::mail::{DeliveryReport, MailComposer, MailTransport};
use crate::usage::{DiskSampler, UsageSource};

/// Where the notifier is within one update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierState {
    Idle,
    Checking,
    Notifying,
    /// Terminal: an update failed and managers were told
    Failed,
}

/// What a successful tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    BelowThreshold { ratio: f64 },
    Notified { ratio: f64, report: DeliveryReport },
}

/// Checks disk usage and mails the per-user breakdown when it is too high.
pub struct Notifier {
    threshold: f64,
    composer: MailComposer,
    disk: Box<dyn DiskSampler>,
    usage: Box<dyn UsageSource>,
    transport: Box<dyn MailTransport>,
    state: NotifierState,
}

impl Notifier {
    pub fn new(
        threshold: f64,
        composer: MailComposer,
        disk: Box<dyn DiskSampler>,
        usage: Box<dyn UsageSource>,
        transport: Box<dyn MailTransport>,
    ) -> Self {
        Self {
            threshold,
            composer,
            disk,
            usage,
            transport,
            state: NotifierState::Idle,
        }
    }

    pub fn state(&self) -> NotifierState {
        self.state
    }

    /// Sample usage and notify users when `used / total > threshold`
    pub fn tick(&mut self) -> Result<TickOutcome> {
        self.state = NotifierState::Checking;

        let usage = self.disk.sample()?;
        let ratio = usage.ratio();

        tracing::debug!(
            "{} is {:.1}% full ({} of {})",
            usage.path.display(),
            ratio * 100.0,
            usage.used_human(),
            usage.total_human()
        );

        if ratio > self.threshold {
            tracing::info!(
                "{} usage {:.1}% exceeds threshold {:.1}%",
                usage.path.display(),
                ratio * 100.0,
                self.threshold * 100.0
            );
            let report = self.notify()?;
            Ok(TickOutcome::Notified { ratio, report })
        } else {
            self.state = NotifierState::Idle;
            Ok(TickOutcome::BelowThreshold { ratio })
        }
    }

    /// Collect usage and mail it to every user, regardless of the threshold
    pub fn notify(&mut self) -> Result<DeliveryReport> {
        self.state = NotifierState::Notifying;

        let records = self.usage.collect()?;
        let message = self.composer.notification(&records);
        let report = self.transport.send(&message, self.composer.users())?;

        tracing::info!("Home Directory Usage Notification sent");
        self.state = NotifierState::Idle;

        Ok(report)
    }

    /// One scheduled update: [`tick`](Self::tick) plus the failure policy.
    ///
    /// Any error moves the notifier to [`NotifierState::Failed`], mails an
    /// error report to the managers and comes back as
    /// [`DuMailerError::UpdateFailed`]. The caller is expected to exit.
    pub fn update(&mut self) -> Result<TickOutcome> {
        let result = self.tick();
        self.guard(result)
    }

    /// [`notify`](Self::notify) under the same failure policy as `update`
    pub fn force_update(&mut self) -> Result<DeliveryReport> {
        let result = self.notify();
        self.guard(result)
    }

    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        result.map_err(|err| {
            self.state = NotifierState::Failed;
            tracing::error!("update failed: {}", err);

            if let Err(report_err) = self.report_failure(&err) {
                tracing::error!("Failed to send error report: {}", report_err);
            }

            DuMailerError::UpdateFailed(Box::new(err))
        })
    }

    fn report_failure(&self, err: &DuMailerError) -> Result<()> {
        let subject = format!(
            "{} : Sending Mail Failed",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let message = self.composer.error_report(&subject, &err.to_string());
        self.transport.send(&message, self.composer.managers())?;
        Ok(())
    }
}
