use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// du-mailer - Weekly home directory usage reports by email
#[derive(Parser, Debug)]
#[command(name = "du-mailer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (TOML, or JSON with a .json extension)
    #[arg(short, long, global = true, value_name = "PATH", env = "DU_MAILER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to members file [default: members.toml next to the config]
    #[arg(short, long, global = true, value_name = "PATH", env = "DU_MAILER_MEMBERS")]
    pub members: Option<PathBuf>,

    /// PID file guarding the running instance
    #[arg(long, global = true, value_name = "PATH")]
    pub pid_file: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Mirror log lines to stderr
    #[arg(long, global = true)]
    pub console: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the weekly usage check until interrupted
    Run(RunArgs),

    /// Check usage once and notify if above the threshold
    Check(CheckArgs),

    /// Print the current usage report without sending mail
    Report,

    /// Show whether an instance is running
    Status,

    /// Stop the running instance once its current check is done
    Stop(StopArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Day of the week to check on (overrides monitor.weekday)
    #[arg(short, long, value_name = "DAY")]
    pub weekday: Option<String>,

    /// Time of day to check at, HH:MM (overrides monitor.at)
    #[arg(short, long, value_name = "HH:MM")]
    pub at: Option<String>,

    /// Seconds between scheduler polls (overrides monitor.poll_interval)
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<u64>,
}

#[derive(Args, Debug)]
pub struct StopArgs {
    /// Kill the instance and its usage command if it is still running after --grace
    #[arg(short, long)]
    pub force: bool,

    /// Seconds to wait before killing with --force
    #[arg(long, value_name = "SECS", default_value_t = 120, requires = "force")]
    pub grace: u64,
}

impl Default for StopArgs {
    fn default() -> Self {
        Self {
            force: false,
            grace: 120,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Send the notification even when usage is below the threshold
    #[arg(short, long)]
    pub force: bool,
}
