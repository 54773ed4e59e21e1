//! Shared file sink: one lazily-created CSV file per stream.

use std::fs::File;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use indexmap::map::Entry;
use snafu::ResultExt;
use tracing::debug;

use crate::error::{AppendRowSnafu, CreateFileSnafu, FlushSnafu, WriteError};
use crate::protocol::RAW_FILE_PREFIX;
use crate::row::Row;

/// Open file plus CSV encoder for one stream.
#[derive(Debug)]
pub(crate) struct FileHandle {
    writer: csv::Writer<File>,
}

impl FileHandle {
    /// Create the stream file, truncating any previous run's output.
    fn create(path: &Path) -> Result<Self, WriteError> {
        let file = File::create(path).context(CreateFileSnafu { path })?;
        Ok(Self {
            writer: csv::Writer::from_writer(file),
        })
    }

    /// Append one row as a single CSV record.
    pub fn append(&mut self, row: &Row) -> Result<(), WriteError> {
        self.writer.write_record(&row.fields).context(AppendRowSnafu {
            stream: row.stream.as_str(),
        })
    }

    fn flush(&mut self, stream: &str) -> Result<(), WriteError> {
        self.writer.flush().context(FlushSnafu { stream })
    }
}

/// Map of stream name to open file handle.
///
/// Shared by every writer worker behind a single lock; the critical section
/// spans both handle resolution and the append, so only one write happens at
/// any instant regardless of stream.
pub(crate) struct FileSink {
    handles: IndexMap<String, FileHandle>,
}

impl FileSink {
    pub fn new() -> Self {
        Self {
            handles: IndexMap::new(),
        }
    }

    /// Return the handle for a stream, creating its file on first use.
    ///
    /// Files are named `<dir>/<RAW_FILE_PREFIX><stream>.csv`. Creation
    /// failure propagates to the caller and no partial handle is retained,
    /// so a later row for the same stream retries the create.
    pub fn resolve(&mut self, dir: &Path, stream: &str) -> Result<&mut FileHandle, WriteError> {
        match self.handles.entry(stream.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = stream_file_path(dir, stream);
                debug!(stream, path = %path.display(), "creating stream file");
                Ok(entry.insert(FileHandle::create(&path)?))
            }
        }
    }

    /// Flush and close every open handle exactly once.
    ///
    /// Flush failures do not stop the pass; each one is collected so the
    /// caller can report them while the remaining handles still close.
    pub fn finalize(&mut self) -> Vec<WriteError> {
        let mut failures = Vec::new();
        for (stream, mut handle) in self.handles.drain(..) {
            if let Err(e) = handle.flush(&stream) {
                failures.push(e);
            }
        }
        failures
    }
}

/// Deterministic output path for a stream's file.
fn stream_file_path(dir: &Path, stream: &str) -> PathBuf {
    dir.join(format!("{RAW_FILE_PREFIX}{stream}.csv"))
}
