//! Error types for the snowdrift destination.

use std::path::PathBuf;

use snafu::prelude::*;

/// Errors that can occur during configuration parsing and validation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// Destination path is empty.
    #[snafu(display("Destination path cannot be empty"))]
    EmptyDestinationPath,

    /// Marshal worker count is zero.
    #[snafu(display("Marshal worker count must be at least 1"))]
    ZeroMarshalWorkers,

    /// Writer worker count is zero.
    #[snafu(display("Writer worker count must be at least 1"))]
    ZeroWriterWorkers,

    /// Failed to parse JSON configuration.
    #[snafu(display("Failed to parse destination configuration"))]
    JsonParse { source: serde_json::Error },
}

/// Errors that can occur while converting a record into a row.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MarshalError {
    /// Record payload is not a valid JSON document.
    #[snafu(display("Record {id} on stream {stream} carries an undecodable payload"))]
    PayloadDecode {
        stream: String,
        id: String,
        source: serde_json::Error,
    },

    /// Decoded payload could not be re-rendered as text.
    #[snafu(display("Record {id} on stream {stream} carries an unserializable payload"))]
    PayloadRender {
        stream: String,
        id: String,
        source: serde_json::Error,
    },
}

/// Errors that can occur while writing rows to stream files.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum WriteError {
    /// Failed to create a stream file.
    #[snafu(display("Failed to create stream file {}", path.display()))]
    CreateFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to append a row to a stream file.
    #[snafu(display("Failed to append row for stream {stream}"))]
    AppendRow { stream: String, source: csv::Error },

    /// Failed to flush a stream file at shutdown.
    #[snafu(display("Failed to flush stream file for {stream}"))]
    Flush {
        stream: String,
        source: std::io::Error,
    },
}

/// Error raised when the runtime's logging channel rejects a message.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[snafu(context(suffix(Context)))]
#[snafu(display("Logging channel failed: {message}"))]
pub struct LogError {
    pub message: String,
}

/// Top-level pipeline errors.
///
/// The config and directory variants are fatal and returned to the caller
/// before any worker starts; the rest are recoverable and travel over the
/// error sink while the pipeline keeps running.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PipelineError {
    /// Invalid destination configuration.
    #[snafu(display("Invalid destination configuration"))]
    Config { source: ConfigError },

    /// Failed to create the destination directory.
    #[snafu(display("Failed to create destination directory {}", path.display()))]
    CreateDestinationDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A record could not be converted into a row.
    #[snafu(display("Failed to marshal record"))]
    Marshal { source: MarshalError },

    /// A row could not be written to its stream file.
    #[snafu(display("Failed to write row"))]
    Write { source: WriteError },

    /// The runtime's logging channel failed.
    #[snafu(display("Failed to write log message"))]
    Log { source: LogError },

    /// A worker terminated without draining its queue.
    #[snafu(display("{stage} worker terminated abnormally"))]
    WorkerJoin {
        stage: &'static str,
        source: tokio::task::JoinError,
    },
}
