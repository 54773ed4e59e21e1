//! Rows flowing between the marshal and writer stages.

use crate::protocol::{COLUMN_DATA, COLUMN_EMITTED_AT, COLUMN_ID};

/// A stream-tagged line of text fields, ready to be written.
///
/// Either the fixed header for a stream or one record's data fields.
/// Ownership passes from the marshal worker that produced it to whichever
/// writer worker dequeues it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Row {
    /// Stream whose file this row belongs to.
    pub stream: String,
    /// Ordered text fields of one CSV record.
    pub fields: Vec<String>,
}

impl Row {
    /// The fixed header row for a stream.
    pub fn header(stream: &str) -> Self {
        Self {
            stream: stream.to_string(),
            fields: vec![
                COLUMN_ID.to_string(),
                COLUMN_EMITTED_AT.to_string(),
                COLUMN_DATA.to_string(),
            ],
        }
    }

    /// A data row carrying one record's rendered fields.
    pub fn data(stream: String, fields: Vec<String>) -> Self {
        Self { stream, fields }
    }
}
