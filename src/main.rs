//! Thumbwatch entry point: one audit run over a single library section.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use thumbwatch::catalog::PlexClient;
use thumbwatch::cli::CliOptions;
use thumbwatch::config::Config;
use thumbwatch::jobs::ThumbnailAuditor;
use thumbwatch::logging;

/// Conventional status for a process ended by SIGINT (128 + 2)
const INTERRUPT_EXIT_CODE: i32 = 130;

#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// Finish the in-flight item, then stop
    Drain,
    /// Leave without waiting
    Abort,
}

fn on_interrupt(received: u32) -> Interrupt {
    if received <= 1 {
        Interrupt::Drain
    } else {
        Interrupt::Abort
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?.apply_cli(CliOptions::from_args())?;

    logging::init_tracing(config.debug, &config.log_file)?;

    info!(
        server = %config.base_url(),
        library_id = %config.library_id,
        time_diff_threshold_secs = config.analyzer.time_diff_threshold_secs,
        blackness_threshold = config.analyzer.blackness_threshold,
        force_black_check = config.analyzer.force_black_check,
        "Starting thumbnail audit"
    );

    let client = PlexClient::new(
        &config.base_url(),
        config.plex_token.clone(),
        config.request_timeout,
    )
    .context("Failed to create Plex client")?;

    let auditor = ThumbnailAuditor::new(Arc::new(client), config.analyzer.clone());

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        let mut received = 0;
        while tokio::signal::ctrl_c().await.is_ok() {
            received += 1;
            match on_interrupt(received) {
                Interrupt::Drain => {
                    warn!("Interrupt received, stopping after the current item");
                    signal_token.cancel();
                }
                Interrupt::Abort => {
                    warn!("Second interrupt received, exiting immediately");
                    std::process::exit(INTERRUPT_EXIT_CODE);
                }
            }
        }
    });

    let report = match auditor.run(&config.library_id, &cancel).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, library_id = %config.library_id, "Library listing failed");
            return Err(e).context("Library listing failed");
        }
    };

    info!(
        items = report.items_listed,
        processed = report.records.len(),
        failures = report.failures(),
        cancelled = report.cancelled,
        "Thumbnail audit finished"
    );

    Ok(())
}
