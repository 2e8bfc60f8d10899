use std::path::Path;

use anyhow::Result;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "history_playback=info,warn";

/// Where log records go.
pub enum LogSink<'a> {
    /// Standard error; for commands that do not take over the terminal.
    Stderr,
    /// Daily rolling file in the given directory.
    File(&'a Path),
    /// Discard everything (interactive player without a log directory).
    Off,
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging(sink: LogSink<'_>) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match sink {
        LogSink::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
                .try_init()?;
        }
        LogSink::File(dir) => {
            let file_appender =
                RollingFileAppender::new(Rotation::DAILY, dir, "history-playback.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            // The writer must outlive the process; init happens once.
            std::mem::forget(guard);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .try_init()?;
        }
        LogSink::Off => {}
    }

    Ok(())
}
