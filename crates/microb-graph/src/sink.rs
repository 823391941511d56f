//! Bulk-insert targets for graph records.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use crate::records::InsertBatch;

/// Error writing a batch.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Receiver of record batches.
///
/// Called concurrently from one thread per source.
pub trait GraphSink: Send + Sync {
    /// Insert every record of `batch` as part of one run.
    fn insert(&self, batch: &InsertBatch) -> Result<(), SinkError>;
}

/// Writes each batch as one JSON line.
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        let mut writer = self.writer.into_inner().unwrap_or_else(PoisonError::into_inner);
        writer.flush()?;
        Ok(writer)
    }
}

impl<W: Write + Send> GraphSink for JsonLinesSink<W> {
    fn insert(&self, batch: &InsertBatch) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(batch)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&line)?;
        Ok(())
    }
}

/// Collects batches in memory.
#[derive(Default)]
pub struct MemorySink {
    batches: Mutex<Vec<InsertBatch>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches received so far, in arrival order.
    pub fn batches(&self) -> Vec<InsertBatch> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl GraphSink for MemorySink {
    fn insert(&self, batch: &InsertBatch) -> Result<(), SinkError> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(batch.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{DnsRecord, GraphRecord};
    use chrono::{TimeZone, Utc};

    fn batch() -> InsertBatch {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        InsertBatch {
            command_name: "binary_edge".to_owned(),
            run_key: "example.com".to_owned(),
            run_timestamp: ts,
            records: vec![GraphRecord::Dns(DnsRecord {
                hostname: "www.example.com".to_owned(),
                address: String::new(),
                record_type: String::new(),
                asset_type: String::new(),
                timestamp: ts,
            })],
        }
    }

    #[test]
    fn test_json_lines_one_line_per_batch() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.insert(&batch()).unwrap();
        sink.insert(&batch()).unwrap();

        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["command_name"], "binary_edge");
        assert_eq!(value["records"][0]["type"], "dns");
        assert_eq!(value["records"][0]["hostname"], "www.example.com");
    }

    #[test]
    fn test_memory_sink_keeps_batches() {
        let sink = MemorySink::new();
        sink.insert(&batch()).unwrap();
        assert_eq!(sink.batches(), vec![batch()]);
    }
}
