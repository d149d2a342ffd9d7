pub mod notifier;
pub mod pidfile;
pub mod scheduler;
pub mod signals;

pub use notifier::{Notifier, NotifierState, TickOutcome};
pub use pidfile::{running_pid, stop_instance, PidFile, StopMode};
pub use scheduler::{Clock, Scheduler, SystemClock, WeeklySchedule};
pub use signals::install_signal_handlers;
