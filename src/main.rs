use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing_appender::non_blocking::WorkerGuard;

use du_mailer::cli::{Cli, Command};
use du_mailer::commands::{self, Settings};
use du_mailer::config::LoggingConfig;
use du_mailer::monitor::PidFile;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let pid_path = cli.pid_file.clone().unwrap_or_else(PidFile::default_path);

    match cli.command {
        Command::Completions(args) => {
            let mut command = Cli::command();
            clap_complete::generate(args.shell, &mut command, "du-mailer", &mut std::io::stdout());
        }
        Command::Status => {
            let _guard = init_logging(cli.verbose, cli.quiet, None, true)?;
            commands::instance::status(&pid_path)?;
        }
        Command::Stop(args) => {
            let _guard = init_logging(cli.verbose, cli.quiet, None, true)?;
            commands::instance::stop(args, &pid_path)?;
        }
        Command::Run(args) => {
            let settings = Settings::load(cli.config.as_deref(), cli.members.as_deref())?;
            let console = cli.console || settings.config.logging.console;
            let _guard =
                init_logging(cli.verbose, cli.quiet, Some(&settings.config.logging), console)?;

            commands::run::run(args, settings, &pid_path)?;
        }
        Command::Check(args) => {
            let settings = Settings::load(cli.config.as_deref(), cli.members.as_deref())?;
            let console = cli.console || settings.config.logging.console;
            let _guard =
                init_logging(cli.verbose, cli.quiet, Some(&settings.config.logging), console)?;

            tracing::info!(?args, "Starting check");
            commands::check::run(args, settings)?;
        }
        Command::Report => {
            let settings = Settings::load(cli.config.as_deref(), cli.members.as_deref())?;
            let console = cli.console || settings.config.logging.console;
            let _guard =
                init_logging(cli.verbose, cli.quiet, Some(&settings.config.logging), console)?;

            commands::report::run(settings)?;
        }
    }

    Ok(())
}

/// Daily rotated log file plus an optional stderr mirror.
///
/// The returned guard flushes the file writer when dropped.
fn init_logging(
    verbosity: u8,
    quiet: bool,
    file: Option<&LoggingConfig>,
    console: bool,
) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if quiet {
        "warn"
    } else {
        match verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("du_mailer={}", level)));

    let (file_layer, guard) = match file {
        Some(logging) => {
            std::fs::create_dir_all(&logging.directory).with_context(|| {
                format!(
                    "Failed to create log directory '{}'",
                    logging.directory.display()
                )
            })?;
            let appender = tracing_appender::rolling::daily(&logging.directory, &logging.file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_layer = console.then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(filter)
        .init();

    Ok(guard)
}
