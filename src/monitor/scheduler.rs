use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDateTime, NaiveTime, Timelike, Weekday};

use crate::error::Result;

/// Slice used while sleeping so a cleared running flag is noticed quickly
const SLEEP_SLICE: Duration = Duration::from_secs(1);

/// Wall clock used by the scheduler
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
    fn sleep(&self, duration: Duration);
}

/// Local time and `thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Fires once a week on `weekday` at `at`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    pub weekday: Weekday,
    pub at: NaiveTime,
}

impl WeeklySchedule {
    pub fn new(weekday: Weekday, at: NaiveTime) -> Self {
        Self { weekday, at }
    }

    /// Schedule at the time of day of `now`, to the second
    pub fn starting_at(weekday: Weekday, now: NaiveDateTime) -> Self {
        let at = now.time().with_nanosecond(0).unwrap_or_else(|| now.time());
        Self::new(weekday, at)
    }

    /// First occurrence strictly after `now`
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let days_ahead = (self.weekday.num_days_from_monday() as i64
            - now.weekday().num_days_from_monday() as i64)
            .rem_euclid(7);

        let candidate = (now.date() + chrono::Duration::days(days_ahead)).and_time(self.at);

        if candidate <= now {
            candidate + chrono::Duration::days(7)
        } else {
            candidate
        }
    }
}

/// Cooperative single-job loop: run the job when due, then sleep.
pub struct Scheduler<C: Clock = SystemClock> {
    clock: C,
    schedule: WeeklySchedule,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    next_run: NaiveDateTime,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(
        clock: C,
        schedule: WeeklySchedule,
        poll_interval: Duration,
        running: Arc<AtomicBool>,
    ) -> Self {
        let next_run = schedule.next_after(clock.now());
        Self {
            clock,
            schedule,
            poll_interval,
            running,
            next_run,
        }
    }

    pub fn next_run(&self) -> NaiveDateTime {
        self.next_run
    }

    /// Run the job if it is due. Returns whether it ran.
    pub fn run_pending<F>(&mut self, job: &mut F) -> Result<bool>
    where
        F: FnMut() -> Result<()>,
    {
        if self.clock.now() < self.next_run {
            return Ok(false);
        }

        job()?;

        self.next_run = self.schedule.next_after(self.clock.now());
        tracing::info!("Next check scheduled for {}", self.next_run);

        Ok(true)
    }

    /// Loop until the running flag clears or the job fails
    pub fn run<F>(&mut self, mut job: F) -> Result<()>
    where
        F: FnMut() -> Result<()>,
    {
        tracing::info!(
            "Checking every {:?} at {} (poll interval {}s), next check {}",
            self.schedule.weekday,
            self.schedule.at,
            self.poll_interval.as_secs(),
            self.next_run
        );

        while self.running.load(Ordering::SeqCst) {
            self.run_pending(&mut job)?;
            self.pause();
        }

        tracing::info!("Shutdown");
        Ok(())
    }

    fn pause(&self) {
        let mut remaining = self.poll_interval;

        while remaining > Duration::ZERO && self.running.load(Ordering::SeqCst) {
            let slice = remaining.min(SLEEP_SLICE);
            self.clock.sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
    }
}
