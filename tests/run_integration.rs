use std::fs;
use std::path::Path;
use std::process::{Child, Command as StdCommand, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_settings(dir: &Path) {
    fs::write(
        dir.join("config.toml"),
        format!(
            r#"
[relay]
host = "127.0.0.1"
port = 1
sender = "quota@example.org"

[monitor]
path = "/"
weekday = "sunday"
usage_command = ["true"]

[logging]
directory = "{}"
"#,
            dir.join("log").display()
        ),
    )
    .unwrap();
    fs::write(
        dir.join("members.toml"),
        "[users]\nalice = \"alice@example.org\"\n\n[managers]\ncarol = \"carol@example.org\"\n",
    )
    .unwrap();
}

fn wait_for(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    condition()
}

fn pid_written(path: &Path) -> bool {
    fs::read_to_string(path).is_ok_and(|content| content.trim().parse::<u32>().is_ok())
}

fn wait_for_exit(child: &mut Child, timeout: Duration) -> Option<ExitStatus> {
    let mut status = None;
    wait_for(
        || {
            status = child.try_wait().unwrap();
            status.is_some()
        },
        timeout,
    );
    status
}

#[test]
fn run_stops_cleanly_on_sigterm() {
    let temp = TempDir::new().unwrap();
    write_settings(temp.path());
    let pid_path = temp.path().join("du-mailer.pid");

    let mut child = StdCommand::new(cargo_bin("du-mailer"))
        .arg("--config")
        .arg(temp.path().join("config.toml"))
        .arg("--pid-file")
        .arg(&pid_path)
        .args(["run", "--interval", "1"])
        .env_remove("RUST_LOG")
        .spawn()
        .unwrap();

    assert!(wait_for(|| pid_written(&pid_path), Duration::from_secs(10)));

    Command::cargo_bin("du-mailer")
        .unwrap()
        .arg("--pid-file")
        .arg(&pid_path)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("PID: {}", child.id())));

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).unwrap();

    let status = wait_for_exit(&mut child, Duration::from_secs(10));
    if status.is_none() {
        let _ = child.kill();
    }
    assert!(status.is_some_and(|s| s.success()));
    assert!(!pid_path.exists());

    let log: String = fs::read_dir(temp.path().join("log"))
        .unwrap()
        .map(|entry| fs::read_to_string(entry.unwrap().path()).unwrap())
        .collect();
    assert!(log.contains("Start"));
    assert!(log.contains("Shutdown"));
}

#[test]
fn run_refuses_second_instance() {
    let temp = TempDir::new().unwrap();
    write_settings(temp.path());
    let pid_path = temp.path().join("du-mailer.pid");
    // PID 1 always exists
    fs::write(&pid_path, "1\n").unwrap();

    Command::cargo_bin("du-mailer")
        .unwrap()
        .arg("--config")
        .arg(temp.path().join("config.toml"))
        .arg("--pid-file")
        .arg(&pid_path)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already running"));
}

#[test]
fn run_rejects_bad_weekday() {
    let temp = TempDir::new().unwrap();
    write_settings(temp.path());

    Command::cargo_bin("du-mailer")
        .unwrap()
        .arg("--config")
        .arg(temp.path().join("config.toml"))
        .arg("--pid-file")
        .arg(temp.path().join("du-mailer.pid"))
        .args(["run", "--weekday", "someday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a day of the week"));
}

#[test]
fn stop_terminates_running_instance() {
    let temp = TempDir::new().unwrap();
    write_settings(temp.path());
    let pid_path = temp.path().join("du-mailer.pid");

    let mut child = StdCommand::new(cargo_bin("du-mailer"))
        .arg("--config")
        .arg(temp.path().join("config.toml"))
        .arg("--pid-file")
        .arg(&pid_path)
        .args(["run", "--interval", "1"])
        .env_remove("RUST_LOG")
        .spawn()
        .unwrap();

    assert!(wait_for(|| pid_written(&pid_path), Duration::from_secs(10)));

    Command::cargo_bin("du-mailer")
        .unwrap()
        .arg("--pid-file")
        .arg(&pid_path)
        .arg("stop")
        .assert()
        .success()
        .stdout(predicate::str::contains("du-mailer stopped"));

    let status = wait_for_exit(&mut child, Duration::from_secs(10));
    if status.is_none() {
        let _ = child.kill();
    }
    // Exited on its own: clean status and the PID file removed by the instance
    assert!(status.is_some_and(|s| s.success()));
    assert!(!pid_path.exists());
}

#[test]
fn stop_grace_requires_force() {
    Command::cargo_bin("du-mailer")
        .unwrap()
        .args(["stop", "--grace", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}
