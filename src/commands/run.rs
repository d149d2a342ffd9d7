//! Run command: the weekly scheduler loop

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveTime, Weekday};

use super::{build_notifier, Settings};
use crate::cli::RunArgs;
use crate::config::{parse_time, parse_weekday, MonitorConfig};
use crate::error::Result;
use crate::monitor::{
    install_signal_handlers, Clock, PidFile, Scheduler, SystemClock, WeeklySchedule,
};

/// Schedule after applying command line overrides to the config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPlan {
    pub weekday: Weekday,
    pub at: Option<NaiveTime>,
    pub poll_interval: Duration,
}

impl RunPlan {
    pub fn resolve(args: &RunArgs, monitor: &MonitorConfig) -> Result<Self> {
        let weekday = match &args.weekday {
            Some(day) => parse_weekday(day)?,
            None => monitor.weekday()?,
        };
        let at = match &args.at {
            Some(time) => Some(parse_time(time)?),
            None => monitor.at()?,
        };
        let poll_interval = args
            .interval
            .map(Duration::from_secs)
            .unwrap_or_else(|| monitor.poll_interval());

        Ok(Self {
            weekday,
            at,
            poll_interval: poll_interval.max(Duration::from_secs(1)),
        })
    }
}

pub fn run(args: RunArgs, settings: Settings, pid_path: &Path) -> Result<()> {
    let plan = RunPlan::resolve(&args, &settings.config.monitor)?;

    let running = Arc::new(AtomicBool::new(true));
    install_signal_handlers(Arc::clone(&running))?;

    let _pid_file = PidFile::acquire(pid_path)?;

    let mut notifier = build_notifier(&settings.config, &settings.members)?;

    let clock = SystemClock;
    let schedule = match plan.at {
        Some(at) => WeeklySchedule::new(plan.weekday, at),
        None => WeeklySchedule::starting_at(plan.weekday, clock.now()),
    };

    tracing::info!(
        config = %settings.config_path.display(),
        users = settings.members.users.len(),
        managers = settings.members.managers.len(),
        "Start"
    );

    let mut scheduler = Scheduler::new(clock, schedule, plan.poll_interval, running);
    scheduler.run(|| notifier.update().map(|_| ()))
}
