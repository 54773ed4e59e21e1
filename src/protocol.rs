//! Types and constants exchanged with the drift runtime.
//!
//! The runtime owns the wire protocol; this module mirrors only the pieces
//! the destination consumes: the record feed item, the configured stream
//! catalog, and the single-message logging channel.

use bytes::Bytes;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::LogError;

/// Root directory the runtime mounts for local destinations.
pub const LOCAL_ROOT: &str = "/local";

/// Filename prefix for raw stream files.
pub const RAW_FILE_PREFIX: &str = "_drift_raw_";

/// Header label for the record identifier column.
pub const COLUMN_ID: &str = "_drift_id";

/// Header label for the emission timestamp column.
pub const COLUMN_EMITTED_AT: &str = "_drift_emitted_at";

/// Header label for the payload column.
pub const COLUMN_DATA: &str = "_drift_data";

/// A single record message from the runtime's record feed.
///
/// The producer owns a record until a marshal worker dequeues it.
#[derive(Debug, Clone)]
pub struct Record {
    /// Name of the stream the record belongs to.
    pub stream: String,
    /// Opaque identifier assigned by the runtime.
    pub id: String,
    /// Seconds since the Unix epoch when the runtime emitted the record.
    pub emitted_at: i64,
    /// Raw payload as framed off the wire; expected to hold a JSON document.
    pub data: Bytes,
}

/// One stream entry from the configured catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfiguredStream {
    /// Stream name; doubles as the output file key.
    pub name: String,
}

/// The configured stream catalog.
///
/// Negotiation order is preserved: header rows are emitted in this order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    pub streams: Vec<ConfiguredStream>,
}

impl Catalog {
    pub fn new(streams: Vec<ConfiguredStream>) -> Self {
        Self { streams }
    }
}

/// Severity of a runtime log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Single-message logging channel provided by the runtime.
///
/// Failures are non-fatal: the coordinator reports them on the error sink
/// and carries on.
pub trait MessageLogger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str) -> Result<(), LogError>;
}

/// Logger that forwards runtime messages to the local `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl MessageLogger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) -> Result<(), LogError> {
        match level {
            LogLevel::Info => info!("{message}"),
            LogLevel::Warn => warn!("{message}"),
            LogLevel::Error => error!("{message}"),
        }
        Ok(())
    }
}
