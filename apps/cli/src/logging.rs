//! Subscriber setup for the `palabra` binary.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Context;
use palabra_config::{LogFormat, LoggingConfig};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Filter directive: `--verbose`/`--quiet` win, then `RUST_LOG`, then the
/// configured level.
fn filter(config: &LoggingConfig, verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()))
    }
}

pub fn init(config: &LoggingConfig, verbose: bool, quiet: bool) -> anyhow::Result<()> {
    let writer = match (&config.file, config.console) {
        (Some(path), _) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        (None, true) => BoxMakeWriter::new(std::io::stderr),
        (None, false) => BoxMakeWriter::new(std::io::sink),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(config, verbose, quiet))
        .with_writer(writer)
        .with_ansi(config.file.is_none());

    let installed = match config.format {
        LogFormat::Structured => builder.json().try_init(),
        LogFormat::Simple => builder.with_target(false).try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}
