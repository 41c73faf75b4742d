//! Tracing setup. The interactive wizard owns the terminal, so it logs to
//! `<state>/logs/waypoint-<timestamp>.log`; subcommands log to stderr.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Keeps the file writer alive; dropping it flushes buffered lines
pub struct LoggingHandle {
    pub _guard: Option<WorkerGuard>,
    pub log_file_path: Option<PathBuf>,
}

fn log_filename() -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
    format!("waypoint-{}.log", timestamp)
}

fn logs_to_file(config: &Config, is_tui_mode: bool) -> bool {
    is_tui_mode && config.logging.to_file
}

/// Install the global subscriber. `RUST_LOG` wins over `--debug`, which wins
/// over `logging.level`.
pub fn init_logging(
    config: &Config,
    is_tui_mode: bool,
    debug_override: bool,
) -> Result<LoggingHandle> {
    let level = if debug_override {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (writer, handle) = if logs_to_file(config, is_tui_mode) {
        let logs_dir = config.logs_path();
        std::fs::create_dir_all(&logs_dir)?;
        let (path, guard, non_blocking) = file_writer(&logs_dir);
        let handle = LoggingHandle {
            _guard: Some(guard),
            log_file_path: Some(path),
        };
        (BoxMakeWriter::new(non_blocking), handle)
    } else {
        let handle = LoggingHandle {
            _guard: None,
            log_file_path: None,
        };
        (BoxMakeWriter::new(std::io::stderr), handle)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(handle.log_file_path.is_none())
                .with_writer(writer),
        )
        .init();

    Ok(handle)
}

fn file_writer(logs_dir: &Path) -> (PathBuf, WorkerGuard, NonBlocking) {
    let filename = log_filename();
    let path = logs_dir.join(&filename);
    let (non_blocking, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(logs_dir, &filename));
    (path, guard, non_blocking)
}
