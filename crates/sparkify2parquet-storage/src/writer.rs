// Partitioned Parquet writer with full-overwrite semantics
//
// Serializes Arrow RecordBatches, computes a Blake3 content hash while
// encoding, and uploads the resulting Parquet bytes to OpenDAL storage.
// Every write first clears the destination subtree.

use crate::encoding::writer_properties;
use crate::error::{Result, StorageError};
use crate::location::Location;
use crate::partition::split_by_partition;
use crate::table_mapping::Table;
use arrow::record_batch::RecordBatch;
use futures::{stream, StreamExt, TryStreamExt};
use opendal::{ErrorKind, Operator};
use parquet::arrow::ArrowWriter;
use sparkify2parquet_config::TableNames;
use std::io::{self, Write};

const FILE_PREFIX: &str = "part-00000";
const WRITE_CONCURRENCY: usize = 8;

struct HashingBuffer {
    buffer: Vec<u8>,
    hasher: blake3::Hasher,
}

impl HashingBuffer {
    fn new() -> Self {
        Self {
            buffer: Vec::new(),
            hasher: blake3::Hasher::new(),
        }
    }

    fn finish(self) -> (Vec<u8>, String) {
        let hash = self.hasher.finalize();
        (self.buffer, hex::encode(hash.as_bytes()))
    }
}

impl Write for HashingBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.hasher.update(buf);
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Outcome of one table write, for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub table: String,
    /// Destination as seen by the user (root + table directory)
    pub destination: String,
    pub rows: usize,
    pub files: usize,
}

/// Writes tables below an output root
#[derive(Clone)]
pub struct TableWriter {
    operator: Operator,
    location: Location,
    tables: TableNames,
    row_group_size: usize,
}

impl TableWriter {
    pub fn new(
        operator: Operator,
        location: Location,
        tables: TableNames,
        row_group_size: usize,
    ) -> Self {
        Self {
            operator,
            location,
            tables,
            row_group_size,
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Write one of the star-schema tables to its configured destination
    pub async fn write_table(&self, table: Table, batch: &RecordBatch) -> Result<WriteSummary> {
        self.write_named(
            table.name(),
            batch,
            table.destination(&self.tables),
            table.partition_columns(),
        )
        .await
    }

    /// Write `batch` to `destination`, partitioned by `partition_columns` in order
    ///
    /// Anything already under `destination` is removed first. Without partition
    /// columns a single file is written, even for an empty batch; with
    /// partition columns an empty batch leaves an empty destination.
    pub async fn write(
        &self,
        batch: &RecordBatch,
        destination: &str,
        partition_columns: &[&str],
    ) -> Result<WriteSummary> {
        let destination = destination.trim_matches('/');
        self.write_named(destination, batch, destination, partition_columns)
            .await
    }

    async fn write_named(
        &self,
        table: &str,
        batch: &RecordBatch,
        destination: &str,
        partition_columns: &[&str],
    ) -> Result<WriteSummary> {
        let target = self.location.display_path(destination);
        if destination.is_empty() {
            return Err(StorageError::sink_write(table, target, "empty destination"));
        }
        let sink_err = |reason: String| StorageError::sink_write(table, target.clone(), reason);

        let files: Vec<(String, Vec<u8>)> = if partition_columns.is_empty() {
            let (bytes, hash) = self.encode(table, batch).map_err(sink_err)?;
            vec![(file_path(destination, None, &hash), bytes)]
        } else {
            let slices = split_by_partition(batch, partition_columns)
                .map_err(|e| sink_err(e.to_string()))?;
            let mut files = Vec::with_capacity(slices.len());
            for slice in &slices {
                let (bytes, hash) = self.encode(table, &slice.batch).map_err(sink_err)?;
                files.push((file_path(destination, Some(&slice.path), &hash), bytes));
            }
            files
        };

        self.clear(destination).await.map_err(|e| sink_err(e.to_string()))?;

        let file_count = files.len();
        let operator = &self.operator;
        stream::iter(files)
            .map(Ok::<_, opendal::Error>)
            .try_for_each_concurrent(WRITE_CONCURRENCY, |(path, bytes)| async move {
                tracing::debug!(path = %path, bytes = bytes.len(), "Uploading Parquet file");
                operator.write(&path, bytes).await.map(|_| ())
            })
            .await
            .map_err(|e| sink_err(e.to_string()))?;

        tracing::info!(
            table,
            destination = %target,
            rows = batch.num_rows(),
            files = file_count,
            "Wrote table"
        );

        Ok(WriteSummary {
            table: table.to_string(),
            destination: target,
            rows: batch.num_rows(),
            files: file_count,
        })
    }

    fn encode(&self, table: &str, batch: &RecordBatch) -> std::result::Result<(Vec<u8>, String), String> {
        let mut sink = HashingBuffer::new();
        let props = writer_properties(self.row_group_size, table);
        {
            let mut writer = ArrowWriter::try_new(&mut sink, batch.schema(), Some(props))
                .map_err(|e| e.to_string())?;
            writer.write(batch).map_err(|e| e.to_string())?;
            writer.close().map_err(|e| e.to_string())?;
        }
        Ok(sink.finish())
    }

    /// Remove everything under `destination`; a missing destination is fine
    async fn clear(&self, destination: &str) -> opendal::Result<()> {
        let dir = format!("{}/", destination);
        let entries = match self.operator.list_with(&dir).recursive(true).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        let (mut dirs, files): (Vec<String>, Vec<String>) = entries
            .into_iter()
            .map(|entry| entry.path().to_string())
            .partition(|path| path.ends_with('/'));

        for path in &files {
            delete_if_present(&self.operator, path).await?;
        }

        // Deepest directories first so each is empty when removed
        dirs.push(dir);
        dirs.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        dirs.dedup();
        for path in &dirs {
            delete_if_present(&self.operator, path).await?;
        }

        if !files.is_empty() {
            tracing::debug!(
                destination,
                removed = files.len(),
                "Cleared previous output"
            );
        }
        Ok(())
    }
}

async fn delete_if_present(operator: &Operator, path: &str) -> opendal::Result<()> {
    match operator.delete(path).await {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn file_path(destination: &str, partition: Option<&str>, hash: &str) -> String {
    let name = format!("{}-{}.parquet", FILE_PREFIX, &hash[..16.min(hash.len())]);
    match partition {
        Some(partition) => format!("{}/{}/{}", destination, partition, name),
        None => format!("{}/{}", destination, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path() {
        let hash = "0123456789abcdef0123456789abcdef";
        assert_eq!(
            file_path("songs", Some("year=2018/artist_id=AR1"), hash),
            "songs/year=2018/artist_id=AR1/part-00000-0123456789abcdef.parquet"
        );
        assert_eq!(
            file_path("users", None, hash),
            "users/part-00000-0123456789abcdef.parquet"
        );
    }

    #[test]
    fn test_hashing_buffer_matches_blake3() {
        let mut sink = HashingBuffer::new();
        sink.write_all(b"PAR1").unwrap();
        let (bytes, hash) = sink.finish();
        assert_eq!(bytes, b"PAR1");
        assert_eq!(hash, blake3::hash(b"PAR1").to_hex().to_string());
    }
}
