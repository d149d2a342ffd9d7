//! Check command: one immediate update

use super::{build_notifier, Settings};
use crate::cli::CheckArgs;
use crate::error::Result;
use crate::mail::DeliveryReport;
use crate::monitor::TickOutcome;

pub fn run(args: CheckArgs, settings: Settings) -> Result<()> {
    let mut notifier = build_notifier(&settings.config, &settings.members)?;

    if args.force {
        let report = notifier.force_update()?;
        print_delivery(&report);
        return Ok(());
    }

    match notifier.update()? {
        TickOutcome::BelowThreshold { ratio } => {
            println!(
                "{} is {:.1}% full, threshold {:.1}%: no notification sent",
                settings.config.monitor.path.display(),
                ratio * 100.0,
                settings.config.monitor.notify_threshold * 100.0
            );
        }
        TickOutcome::Notified { report, .. } => print_delivery(&report),
    }

    Ok(())
}

fn print_delivery(report: &DeliveryReport) {
    if report.is_complete() {
        println!("Notification sent");
    } else {
        println!(
            "Notification sent, {} recipient(s) rejected",
            report.failures.len()
        );
    }
}
