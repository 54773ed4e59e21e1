//! Snowdrift: CSV destination leaf for the drift data-movement runtime.
//!
//! The runtime owns protocol handshake, message framing, configuration
//! loading, and catalog negotiation. This crate consumes what the runtime
//! hands it (a record feed, a stream catalog, a destination path, an error
//! sink, and a logger) and persists each stream as its own CSV file:
//!
//! - marshal workers convert records into text rows
//! - writer workers append rows to per-stream files through a shared sink
//! - a coordinator wires the stages and runs the shutdown handshake

pub mod config;
pub mod error;
pub mod pipeline;
pub mod protocol;
pub mod tracing;

mod row;
mod sink;

// Re-export commonly used items
pub use crate::tracing::init_tracing;
pub use config::{DestinationConfig, WorkerConfig};
pub use error::PipelineError;
pub use pipeline::CsvDestination;
pub use protocol::{Catalog, ConfiguredStream, Record, TracingLogger};
