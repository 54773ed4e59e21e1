//! Configuration for the snowdrift destination.

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::{ConfigError, JsonParseSnafu};

/// Destination configuration negotiated by the runtime.
///
/// The runtime forwards the raw JSON it collected during the protocol
/// handshake; the only field this destination understands is the path where
/// stream files are placed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Path under the destination root where stream files are placed.
    pub destination_path: String,
}

impl DestinationConfig {
    /// Parse configuration from a JSON string.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(contents).context(JsonParseSnafu)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.destination_path.is_empty() {
            return Err(ConfigError::EmptyDestinationPath);
        }
        Ok(())
    }
}

/// Worker counts for the two pipeline stages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of workers converting records into rows.
    #[serde(default = "default_marshal_workers")]
    pub marshal_workers: usize,
    /// Number of workers appending rows to stream files.
    #[serde(default = "default_writer_workers")]
    pub writer_workers: usize,
}

fn default_marshal_workers() -> usize {
    4
}

fn default_writer_workers() -> usize {
    2
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            marshal_workers: default_marshal_workers(),
            writer_workers: default_writer_workers(),
        }
    }
}

impl WorkerConfig {
    /// Validate the worker counts.
    ///
    /// A zero-sized pool would leave its queue without consumers, so both
    /// counts must be at least 1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marshal_workers == 0 {
            return Err(ConfigError::ZeroMarshalWorkers);
        }
        if self.writer_workers == 0 {
            return Err(ConfigError::ZeroWriterWorkers);
        }
        Ok(())
    }
}
