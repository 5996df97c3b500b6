mod cli;
mod error;
mod exporter_process;
mod summary;

use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use appdx_core::{Context, CoreError, Mode, Settings, run_export, run_migrate};

use crate::cli::Cli;
use crate::error::{CliError, exit_code};
use crate::exporter_process::ExporterProcess;
use crate::summary::{Painter, export_summary, migration_summary};

const LOG_FILE_PREFIX: &str = "appdx";
const LOG_FILE_SUFFIX: &str = "log";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let color = cli.color_enabled();

    if !color {
        let _ = miette::set_hook(Box::new(|_| {
            Box::new(miette::MietteHandlerOpts::new().color(false).build())
        }));
    }

    // Hold the guard so the log file is flushed before exit
    let log_guard = match init_tracing(&cli, color) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(exit_code::FATAL);
        }
    };

    let code = match run(&cli).await {
        Ok(()) => exit_code::SUCCESS,
        Err(err) => {
            error!("{err}");
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };

    drop(log_guard);
    std::process::exit(code);
}

/// Console layer on stderr plus a persistent `<log-dir>/appdx.log`.
fn init_tracing(cli: &Cli, color: bool) -> Result<WorkerGuard, CliError> {
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,appdx={level},appdx_core={level},appdx_api={level},appdx_config={level}"
        ))
    });

    let log_io_error = |source| CliError::Io {
        path: cli.log_dir.display().to_string(),
        source,
    };
    std::fs::create_dir_all(&cli.log_dir).map_err(log_io_error)?;
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(&cli.log_dir)
        .map_err(|e| log_io_error(std::io::Error::other(e.to_string())))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(color)
                .with_target(false),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Ok(guard)
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let mode = Mode::from(cli.mode);
    let settings = appdx_config::load_settings(&cli.config, mode)?;
    info!(%mode, config = %cli.config.display(), "configuration loaded");

    let exporter = cli.run.as_deref().map(ExporterProcess::spawn).transpose()?;

    let outcome = tokio::select! {
        result = execute(&settings, mode, cli) => result,
        () = shutdown_signal() => Err(CliError::Interrupted),
    };

    if let Some(process) = exporter {
        if outcome.is_ok() {
            process.detach();
        } else {
            process.terminate().await;
        }
    }
    outcome
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("cannot install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("cannot install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => warn!("interrupted, cleaning up"),
        () = terminate => warn!("terminated, cleaning up"),
    }
}

async fn execute(settings: &Settings, mode: Mode, cli: &Cli) -> Result<(), CliError> {
    let ctx = Context::new(settings)?;

    if cli.run.is_some() {
        info!(url = %settings.exporter_url, wait_secs = cli.exporter_wait, "waiting for config exporter");
        ctx.exporter
            .wait_until_ready(Duration::from_secs(cli.exporter_wait))
            .await
            .map_err(CoreError::from)?;
    }

    let paint = Painter::new(cli.color_enabled());
    match mode {
        Mode::Export => {
            let report = run_export(&ctx).await?;
            print!("{}", export_summary(&report, paint));
        }
        Mode::Migrate => {
            let report = run_migrate(&ctx).await?;
            print!("{}", migration_summary(&report, paint));
        }
    }
    Ok(())
}
