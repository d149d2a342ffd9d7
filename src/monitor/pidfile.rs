use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;

use crate::error::{DuMailerError, Result};

/// PID file held by the running scheduler; removed on drop
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// `$XDG_RUNTIME_DIR/du-mailer.pid`, falling back to `/tmp`
    pub fn default_path() -> PathBuf {
        std::env::var("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
            .join("du-mailer.pid")
    }

    /// Claim the PID file, failing if a live process already holds it
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(pid) = read_pid_file(path) {
            if pid != std::process::id() as i32 && is_process_running(pid) {
                return Err(DuMailerError::AlreadyRunning(pid as u32));
            }
            // Stale PID file, remove it
            let _ = fs::remove_file(path);
        }

        write_pid_file(path)?;

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Write current PID to file
fn write_pid_file(path: &Path) -> Result<()> {
    let io_err = |source| DuMailerError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(io_err)?;
    writeln!(file, "{}", std::process::id()).map_err(io_err)?;
    Ok(())
}

/// Read PID from file
fn read_pid_file(path: &Path) -> Option<i32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Check if a process is running
fn is_process_running(pid: i32) -> bool {
    // Signal 0 only checks that the process exists
    match kill(Pid::from_raw(pid), None) {
        Ok(()) | Err(Errno::EPERM) => !is_zombie(pid),
        Err(_) => false,
    }
}

/// `(state, ppid)` from `/proc/<pid>/stat`
fn proc_stat(pid: i32) -> Option<(char, i32)> {
    let stat = fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    // comm may contain spaces; the fields after it are fixed
    let rest = &stat[stat.rfind(')')? + 1..];
    let mut fields = rest.split_whitespace();
    let state = fields.next()?.chars().next()?;
    let ppid = fields.next()?.parse().ok()?;
    Some((state, ppid))
}

/// Exited but not yet reaped by its parent
fn is_zombie(pid: i32) -> bool {
    matches!(proc_stat(pid), Some(('Z', _)))
}

/// Direct children of `pid`, found by scanning `/proc`
fn child_pids(pid: i32) -> Vec<i32> {
    let Ok(entries) = fs::read_dir("/proc") else {
        return Vec::new();
    };

    entries
        .filter_map(|entry| entry.ok()?.file_name().to_str()?.parse::<i32>().ok())
        .filter(|&candidate| matches!(proc_stat(candidate), Some((_, ppid)) if ppid == pid))
        .collect()
}

/// PID of the running instance, if any
pub fn running_pid(path: &Path) -> Option<u32> {
    read_pid_file(path)
        .filter(|&pid| is_process_running(pid))
        .map(|pid| pid as u32)
}

/// How [`stop_instance`] waits for the instance to exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// SIGTERM, then wait for the current cycle to finish however long it takes
    Graceful,
    /// SIGTERM, then SIGKILL the instance and its children after the grace period
    Force { grace: Duration },
}

/// Ask the running instance to shut down.
///
/// Returns false when nothing was running. On a graceful stop the instance
/// removes its own PID file.
pub fn stop_instance(path: &Path, mode: StopMode) -> Result<bool> {
    let Some(pid) = running_pid(path) else {
        return Ok(false);
    };
    let pid = Pid::from_raw(pid as i32);

    kill(pid, Signal::SIGTERM)?;
    tracing::info!("Sent SIGTERM to PID {}", pid);

    let deadline = match mode {
        StopMode::Graceful => None,
        StopMode::Force { grace } => Some(Instant::now() + grace),
    };

    // The scheduler notices the flag within one sleep slice, once the
    // in-flight cycle is done
    while is_process_running(pid.as_raw()) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            force_kill(pid);
            let _ = fs::remove_file(path);
            return Ok(true);
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    Ok(true)
}

/// SIGKILL the instance and the process groups of its children
fn force_kill(pid: Pid) {
    for child in child_pids(pid.as_raw()) {
        let child = Pid::from_raw(child);
        // Usage commands lead their own group
        if killpg(child, Signal::SIGKILL).is_err() {
            let _ = kill(child, Signal::SIGKILL);
        }
    }

    if let Err(e) = kill(pid, Signal::SIGKILL) {
        tracing::warn!("Failed to kill PID {}: {}", pid, e);
    } else {
        tracing::warn!("Killed PID {} after the grace period", pid);
    }
}
