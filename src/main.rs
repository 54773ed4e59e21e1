//! Snowdrift CLI: drift destination connector writing per-stream CSV files.
//!
//! The full runtime normally hosts the destination; this binary is the
//! minimal stand-in it ships with. It frames newline-delimited record
//! messages from stdin onto the feed, drains the error sink onto the log
//! channel, and runs the pipeline to exhaustion.

use std::path::Path;
use std::process::ExitCode;

use bytes::Bytes;
use clap::Parser;
use serde::Deserialize;
use serde_json::value::RawValue;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use snowdrift::protocol::LOCAL_ROOT;
use snowdrift::{
    Catalog, CsvDestination, DestinationConfig, Record, TracingLogger, WorkerConfig, init_tracing,
};

/// Command-line arguments supplied by the surrounding runtime.
#[derive(Debug, Parser)]
#[command(name = "snowdrift", about = "CSV destination for the drift runtime")]
struct CliArgs {
    /// Path to the destination configuration JSON.
    #[arg(long)]
    config: std::path::PathBuf,

    /// Path to the configured catalog JSON.
    #[arg(long)]
    catalog: std::path::PathBuf,
}

/// One record message as framed on the feed.
#[derive(Debug, Deserialize)]
struct WireRecord {
    stream: String,
    id: String,
    emitted_at: i64,
    data: Box<RawValue>,
}

/// Channel capacity for the stdin record feed.
const RECORD_FEED_CAPACITY: usize = 256;

/// Channel capacity for the error sink.
const ERROR_SINK_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = CliArgs::parse();

    let config = match load_config(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let catalog = match load_catalog(&args.catalog) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load catalog: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        streams = catalog.streams.len(),
        destination_path = %config.destination_path,
        "Starting snowdrift csv destination"
    );

    let destination = match CsvDestination::new(LOCAL_ROOT, WorkerConfig::default()) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to build destination: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (record_tx, record_rx) = mpsc::channel(RECORD_FEED_CAPACITY);
    let (error_tx, mut error_rx) = mpsc::channel(ERROR_SINK_CAPACITY);

    // Frame newline-delimited record messages from stdin onto the feed;
    // dropping the sender at EOF closes the feed.
    let feeder = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<WireRecord>(&line) {
                        Ok(wire) => {
                            let record = Record {
                                stream: wire.stream,
                                id: wire.id,
                                emitted_at: wire.emitted_at,
                                data: Bytes::from(wire.data.get().to_owned()),
                            };
                            if record_tx.send(record).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!(error = %e, "Skipping unframeable input line"),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Record feed read failed, closing");
                    break;
                }
            }
        }
    });

    // Surface pipeline errors on the log channel until the sink closes.
    let drainer = tokio::spawn(async move {
        let mut reported = 0usize;
        while let Some(e) = error_rx.recv().await {
            error!(error = %e, "Pipeline error");
            reported += 1;
        }
        reported
    });

    let result = destination
        .write(&catalog, &config, &TracingLogger, record_rx, error_tx)
        .await;

    if result.is_err() {
        // Fatal startup errors drop the feed receiver; stop reading stdin.
        feeder.abort();
    }
    let _ = feeder.await;
    let reported = drainer.await.unwrap_or(0);

    match result {
        Ok(()) => {
            info!(errors = reported, "Destination finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Destination failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &Path) -> Result<DestinationConfig, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(DestinationConfig::from_json(&contents)?)
}

fn load_catalog(path: &Path) -> Result<Catalog, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
