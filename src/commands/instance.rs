//! Status and stop commands for the running instance

use std::path::Path;
use std::time::Duration;

use crate::cli::StopArgs;
use crate::error::Result;
use crate::monitor::{running_pid, stop_instance, StopMode};

pub fn status(pid_path: &Path) -> Result<()> {
    match running_pid(pid_path) {
        Some(pid) => {
            println!("du-mailer running (PID: {})", pid);
            println!("PID file: {}", pid_path.display());
        }
        None => {
            println!("du-mailer not running");
        }
    }
    Ok(())
}

pub fn stop(args: StopArgs, pid_path: &Path) -> Result<()> {
    let mode = if args.force {
        StopMode::Force {
            grace: Duration::from_secs(args.grace),
        }
    } else {
        StopMode::Graceful
    };

    if running_pid(pid_path).is_some() && mode == StopMode::Graceful {
        println!("Waiting for the current check to finish...");
    }

    if stop_instance(pid_path, mode)? {
        println!("du-mailer stopped");
    } else {
        println!("No du-mailer instance running");
    }
    Ok(())
}
