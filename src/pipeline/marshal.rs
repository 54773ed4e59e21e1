//! Marshal stage: converts records from the feed into rows.

use snafu::ResultExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::queue::WorkQueue;
use crate::error::{MarshalError, PayloadDecodeSnafu, PayloadRenderSnafu, PipelineError};
use crate::protocol::{Catalog, Record};
use crate::row::Row;

/// Head of the row queue, handed to marshal workers and the header task.
///
/// Dropping the stage after spawning leaves the spawned tasks holding the
/// only senders, so the row queue closes exactly when the stage is drained.
pub(super) struct MarshalStage {
    row_tx: mpsc::Sender<Row>,
}

impl MarshalStage {
    pub fn new(row_tx: mpsc::Sender<Row>) -> Self {
        Self { row_tx }
    }

    /// Enqueue one header row per configured stream, in catalog order.
    ///
    /// Runs as its own task so the caller is never blocked on queue
    /// capacity.
    pub fn emit_headers(&self, catalog: &Catalog) -> JoinHandle<()> {
        let rows: Vec<Row> = catalog.streams.iter().map(|s| Row::header(&s.name)).collect();
        let row_tx = self.row_tx.clone();

        tokio::spawn(async move {
            for row in rows {
                if row_tx.send(row).await.is_err() {
                    debug!("row queue closed before headers finished");
                    return;
                }
            }
        })
    }

    /// Spawn one marshal worker racing on the shared record feed.
    ///
    /// The worker exits only once the feed is closed and exhausted. A record
    /// that fails to convert is reported on the error sink and dropped; the
    /// worker keeps going.
    pub fn spawn_worker(
        &self,
        feed: WorkQueue<Record>,
        error_tx: mpsc::Sender<PipelineError>,
        worker: usize,
    ) -> JoinHandle<()> {
        let row_tx = self.row_tx.clone();

        tokio::spawn(async move {
            while let Some(record) = feed.recv().await {
                match marshal(record) {
                    Ok(row) => {
                        if row_tx.send(row).await.is_err() {
                            warn!(worker, "row queue closed with records still arriving");
                            break;
                        }
                    }
                    Err(e) => {
                        let report = PipelineError::Marshal { source: e };
                        if error_tx.send(report).await.is_err() {
                            warn!(worker, "error sink closed, dropping marshal error");
                        }
                    }
                }
            }
            debug!(worker, "marshal worker drained");
        })
    }
}

/// Convert one record into a data row.
///
/// The id is copied verbatim, emitted-at is rendered as decimal text, and
/// the payload is decoded from the raw wire bytes and re-rendered as compact
/// JSON. Field order matches the header labels.
fn marshal(record: Record) -> Result<Row, MarshalError> {
    let payload: serde_json::Value =
        serde_json::from_slice(&record.data).context(PayloadDecodeSnafu {
            stream: record.stream.as_str(),
            id: record.id.as_str(),
        })?;
    let data = serde_json::to_string(&payload).context(PayloadRenderSnafu {
        stream: record.stream.as_str(),
        id: record.id.as_str(),
    })?;

    Ok(Row::data(
        record.stream,
        vec![record.id, record.emitted_at.to_string(), data],
    ))
}
