//! Tracing setup: human-readable console output plus a JSON log file.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the level chosen by `debug`. A log file that cannot be
/// opened downgrades to console-only logging instead of failing the run.
pub fn init_tracing(debug: bool, log_file: &Path) -> Result<()> {
    let default_directive = if debug {
        "thumbwatch=debug"
    } else {
        "thumbwatch=info"
    };

    let (file_layer, file_error) = match open_log_file(log_file) {
        Ok(file) => (
            Some(fmt::layer().json().with_writer(Mutex::new(file))),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()))
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()?;

    if let Some(e) = file_error {
        warn!(path = %log_file.display(), error = %e, "Log file unavailable, logging to console only");
    }

    Ok(())
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    File::options().create(true).append(true).open(path)
}
