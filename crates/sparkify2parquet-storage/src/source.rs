// Source discovery and reading
//
// Catalog files live anywhere below `song_data/`; activity logs sit directly
// in `log_data/`. Files are fetched concurrently and decoded in path order.

use crate::error::{Result, StorageError};
use crate::location::Location;
use futures::{stream, StreamExt, TryStreamExt};
use opendal::{ErrorKind, Operator};
use sparkify2parquet_core::{
    parse_activity_records, parse_catalog_records, ActivityRecord, CatalogRecord,
};

pub const CATALOG_DIR: &str = "song_data/";
pub const ACTIVITY_DIR: &str = "log_data/";
const JSON_EXTENSION: &str = ".json";

type ParseFn<T> = fn(&str, &[u8]) -> sparkify2parquet_core::Result<Vec<T>>;

/// Read side of the dataset context
#[derive(Clone)]
pub struct DatasetSource {
    operator: Operator,
    location: Location,
    read_concurrency: usize,
}

impl DatasetSource {
    pub fn new(operator: Operator, location: Location, read_concurrency: usize) -> Self {
        Self {
            operator,
            location,
            read_concurrency: read_concurrency.max(1),
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Sorted paths of every catalog file, at any depth below `song_data/`
    pub async fn catalog_files(&self) -> Result<Vec<String>> {
        self.list_json(CATALOG_DIR, true).await
    }

    /// Sorted paths of the activity log files directly inside `log_data/`
    pub async fn activity_files(&self) -> Result<Vec<String>> {
        self.list_json(ACTIVITY_DIR, false).await
    }

    /// Load every catalog record. Each call re-reads the source.
    pub async fn read_catalog(&self) -> Result<Vec<CatalogRecord>> {
        let files = self.catalog_files().await?;
        let records = self.read_files(files, parse_catalog_records).await?;
        tracing::info!(
            source = %self.location.display_path(CATALOG_DIR),
            records = records.len(),
            "Read catalog records"
        );
        Ok(records)
    }

    /// Load every activity record
    pub async fn read_activity(&self) -> Result<Vec<ActivityRecord>> {
        let files = self.activity_files().await?;
        let records = self.read_files(files, parse_activity_records).await?;
        tracing::info!(
            source = %self.location.display_path(ACTIVITY_DIR),
            records = records.len(),
            "Read activity records"
        );
        Ok(records)
    }

    async fn list_json(&self, dir: &str, recursive: bool) -> Result<Vec<String>> {
        let target = self.location.display_path(dir);
        let entries = match self.operator.list_with(dir).recursive(recursive).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StorageError::source_read(target, e)),
        };

        let mut paths: Vec<String> = entries
            .into_iter()
            .map(|entry| entry.path().to_string())
            .filter(|path| path.ends_with(JSON_EXTENSION))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(StorageError::no_source_files(target));
        }
        tracing::debug!(source = %target, files = paths.len(), "Discovered source files");
        Ok(paths)
    }

    async fn read_files<T>(&self, paths: Vec<String>, parse: ParseFn<T>) -> Result<Vec<T>> {
        let operator = &self.operator;
        let location = &self.location;

        let contents: Vec<(String, Vec<u8>)> = stream::iter(paths)
            .map(|path| async move {
                match operator.read(&path).await {
                    Ok(buffer) => Ok((path, buffer.to_vec())),
                    Err(e) => Err(StorageError::source_read(location.display_path(&path), e)),
                }
            })
            .buffered(self.read_concurrency)
            .try_collect()
            .await?;

        let mut records = Vec::new();
        for (path, bytes) in &contents {
            records.extend(parse(path, bytes).map_err(StorageError::record)?);
        }
        Ok(records)
    }
}
