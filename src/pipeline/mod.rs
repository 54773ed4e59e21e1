//! Pipeline coordination for the CSV destination.
//!
//! Wires the two worker stages around the shared row queue and executes the
//! shutdown handshake: drain the marshal stage, let the row queue close,
//! drain the writer stage, flush the sink, then close the error sink.

mod marshal;
mod queue;
mod writer;

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::{DestinationConfig, WorkerConfig};
use crate::error::PipelineError;
use crate::protocol::{Catalog, LogLevel, MessageLogger, Record};
use marshal::MarshalStage;
use queue::WorkQueue;
use writer::WriterStage;

/// Buffered rows between the marshal and writer stages.
const ROW_QUEUE_CAPACITY: usize = 64;

/// The CSV destination pipeline coordinator.
///
/// One instance serves one write session: it owns the destination root and
/// the worker counts, and [`CsvDestination::write`] drives the record feed
/// to exhaustion.
pub struct CsvDestination {
    root_path: PathBuf,
    workers: WorkerConfig,
}

impl CsvDestination {
    /// Create a destination rooted at `root_path`.
    ///
    /// Worker counts are validated here so a zero-sized pool can never
    /// stall the shutdown handshake later.
    pub fn new(
        root_path: impl Into<PathBuf>,
        workers: WorkerConfig,
    ) -> Result<Self, PipelineError> {
        workers
            .validate()
            .map_err(|source| PipelineError::Config { source })?;
        Ok(Self {
            root_path: root_path.into(),
            workers,
        })
    }

    /// Drain the record feed into per-stream CSV files.
    ///
    /// Fatal configuration and directory errors return before any worker
    /// starts. Everything after that point is recoverable: marshal and
    /// write failures travel over `error_tx` while the pipeline keeps
    /// going. The error sink closes exactly once, after the flush pass;
    /// that close is the runtime's signal that no further errors will
    /// arrive.
    pub async fn write(
        &self,
        catalog: &Catalog,
        config: &DestinationConfig,
        logger: &dyn MessageLogger,
        records: mpsc::Receiver<Record>,
        error_tx: mpsc::Sender<PipelineError>,
    ) -> Result<(), PipelineError> {
        if let Err(source) = logger.log(LogLevel::Info, "running write for csv destination") {
            // Log failures are reported, never fatal.
            let _ = error_tx.send(PipelineError::Log { source }).await;
        }

        let dest = self.create_destination_dir(config)?;
        info!(
            dest = %dest.display(),
            streams = catalog.streams.len(),
            marshal_workers = self.workers.marshal_workers,
            writer_workers = self.workers.writer_workers,
            "starting csv destination pipeline"
        );

        let (row_tx, row_rx) = mpsc::channel(ROW_QUEUE_CAPACITY);
        let row_queue = WorkQueue::new(row_rx);
        let feed = WorkQueue::new(records);

        let stage = MarshalStage::new(row_tx);
        let headers = stage.emit_headers(catalog);
        let marshal_workers: Vec<JoinHandle<()>> = (0..self.workers.marshal_workers)
            .map(|worker| stage.spawn_worker(feed.clone(), error_tx.clone(), worker))
            .collect();
        // The workers and the header task now hold the only row senders.
        drop(stage);

        let writer = WriterStage::new(dest);
        let writer_workers: Vec<JoinHandle<()>> = (0..self.workers.writer_workers)
            .map(|worker| writer.spawn_worker(row_queue.clone(), error_tx.clone(), worker))
            .collect();

        // Drain barrier: one completion per marshal worker plus the header
        // task. The row queue cannot close before this point.
        Self::join_stage("marshal", marshal_workers, &error_tx).await;
        if let Err(source) = headers.await {
            let report = PipelineError::WorkerJoin {
                stage: "header",
                source,
            };
            let _ = error_tx.send(report).await;
        }
        debug!("marshal stage drained, row queue closing");

        Self::join_stage("writer", writer_workers, &error_tx).await;
        debug!("writer stage drained");

        for failure in writer.finalize().await {
            let _ = error_tx.send(PipelineError::Write { source: failure }).await;
        }

        info!("csv destination pipeline finished");
        // Last sender drops here, closing the error sink.
        drop(error_tx);
        Ok(())
    }

    /// Await every completion signal for one stage's pool.
    ///
    /// A worker that dies without completing resolves its handle with a
    /// join error; that is reported and the handshake continues rather
    /// than hanging.
    async fn join_stage(
        stage: &'static str,
        handles: Vec<JoinHandle<()>>,
        error_tx: &mpsc::Sender<PipelineError>,
    ) {
        for handle in handles {
            if let Err(source) = handle.await {
                let report = PipelineError::WorkerJoin { stage, source };
                let _ = error_tx.send(report).await;
            }
        }
    }

    /// Resolve and create the destination directory.
    ///
    /// The configured path is normalized to begin with a separator before
    /// being appended to the root, and intermediate directories are created
    /// as needed. Failure is fatal: no worker has started yet.
    fn create_destination_dir(
        &self,
        config: &DestinationConfig,
    ) -> Result<PathBuf, PipelineError> {
        config
            .validate()
            .map_err(|source| PipelineError::Config { source })?;

        let mut destination_path = config.destination_path.clone();
        if !destination_path.starts_with('/') {
            destination_path.insert(0, '/');
        }

        let dest = PathBuf::from(format!("{}{}", self.root_path.display(), destination_path));
        std::fs::create_dir_all(&dest).map_err(|source| PipelineError::CreateDestinationDir {
            path: dest.clone(),
            source,
        })?;

        Ok(dest)
    }
}
