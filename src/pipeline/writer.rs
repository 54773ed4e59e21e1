//! Writer stage: drains the row queue into the shared file sink.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::queue::WorkQueue;
use crate::error::{PipelineError, WriteError};
use crate::row::Row;
use crate::sink::FileSink;

/// Worker pool writing rows through the shared sink.
pub(super) struct WriterStage {
    sink: Arc<Mutex<FileSink>>,
    dest: PathBuf,
}

impl WriterStage {
    pub fn new(dest: PathBuf) -> Self {
        Self {
            sink: Arc::new(Mutex::new(FileSink::new())),
            dest,
        }
    }

    /// Spawn one writer worker racing on the shared row queue.
    ///
    /// For each row the worker holds the sink lock across handle resolution
    /// and the append. A failed row is reported on the error sink and
    /// dropped; the worker exits once the queue is closed and drained.
    pub fn spawn_worker(
        &self,
        rows: WorkQueue<Row>,
        error_tx: mpsc::Sender<PipelineError>,
        worker: usize,
    ) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        let dest = self.dest.clone();

        tokio::spawn(async move {
            while let Some(row) = rows.recv().await {
                let result = {
                    let mut sink = sink.lock().await;
                    sink.resolve(&dest, &row.stream)
                        .and_then(|handle| handle.append(&row))
                };
                if let Err(e) = result {
                    warn!(worker, stream = %row.stream, error = %e, "dropping row");
                    let report = PipelineError::Write { source: e };
                    if error_tx.send(report).await.is_err() {
                        warn!(worker, "error sink closed, dropping write error");
                    }
                }
            }
            debug!(worker, "writer worker drained");
        })
    }

    /// Flush and close every stream file exactly once.
    ///
    /// Must run only after every writer worker has completed; returns the
    /// flush failures for the caller to report.
    pub async fn finalize(self) -> Vec<WriteError> {
        let mut sink = self.sink.lock().await;
        sink.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(stream: &str, id: &str) -> Row {
        Row::data(
            stream.to_string(),
            vec![id.to_string(), "0".to_string(), "{}".to_string()],
        )
    }

    #[tokio::test]
    async fn test_worker_writes_rows_per_stream() {
        let dir = TempDir::new().unwrap();
        let (row_tx, row_rx) = mpsc::channel(8);
        let (error_tx, _error_rx) = mpsc::channel(8);

        let stage = WriterStage::new(dir.path().to_path_buf());
        let worker = stage.spawn_worker(WorkQueue::new(row_rx), error_tx, 0);

        row_tx.send(row("users", "a")).await.unwrap();
        row_tx.send(row("orders", "b")).await.unwrap();
        drop(row_tx);
        worker.await.unwrap();

        assert!(stage.finalize().await.is_empty());

        let users = std::fs::read_to_string(dir.path().join("_drift_raw_users.csv")).unwrap();
        assert_eq!(users, "a,0,{}\n");
        let orders = std::fs::read_to_string(dir.path().join("_drift_raw_orders.csv")).unwrap();
        assert_eq!(orders, "b,0,{}\n");
    }

    #[tokio::test]
    async fn test_failed_row_is_reported_and_dropped() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent");
        let (row_tx, row_rx) = mpsc::channel(8);
        let (error_tx, mut error_rx) = mpsc::channel(8);

        let stage = WriterStage::new(missing);
        let worker = stage.spawn_worker(WorkQueue::new(row_rx), error_tx, 0);

        row_tx.send(row("users", "a")).await.unwrap();
        row_tx.send(row("users", "b")).await.unwrap();
        drop(row_tx);
        worker.await.unwrap();

        // Both rows fail and are reported; neither aborts the worker.
        assert!(matches!(
            error_rx.recv().await,
            Some(PipelineError::Write { .. })
        ));
        assert!(matches!(
            error_rx.recv().await,
            Some(PipelineError::Write { .. })
        ));
        assert!(stage.finalize().await.is_empty());
    }
}
