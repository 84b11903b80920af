//! Hive-style partition layout
//!
//! Splits a batch into one slice per distinct combination of partition values:
//! `year=2018/artist_id=ARJIE2Y1187B994AB7/part-00000-<hash>.parquet`.
//! Partition columns are dropped from the slices; their values live in the path.

use arrow::array::{Array, UInt32Array};
use arrow::compute::take_record_batch;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use std::collections::BTreeMap;

/// Directory value used for null or empty partition values
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// One partition directory and the rows that belong in it
#[derive(Debug)]
pub(crate) struct PartitionSlice {
    /// Relative directory, e.g. `year=2018/month=11`
    pub path: String,
    pub batch: RecordBatch,
}

/// Group the rows of `batch` by the values of `columns`, in the given order
///
/// Slices come back sorted by partition path so output is deterministic.
pub(crate) fn split_by_partition(
    batch: &RecordBatch,
    columns: &[&str],
) -> Result<Vec<PartitionSlice>, ArrowError> {
    let schema = batch.schema();
    let mut partition_indices = Vec::with_capacity(columns.len());
    for name in columns {
        let (index, _) = schema.column_with_name(name).ok_or_else(|| {
            ArrowError::InvalidArgumentError(format!("partition column '{}' not in table", name))
        })?;
        partition_indices.push(index);
    }

    let keep: Vec<usize> = (0..schema.fields().len())
        .filter(|i| !partition_indices.contains(i))
        .collect();
    let data = batch.project(&keep)?;

    let mut groups: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let mut segments = Vec::with_capacity(columns.len());
        for (name, &index) in columns.iter().zip(&partition_indices) {
            let value = partition_value(batch.column(index).as_ref(), row)?;
            segments.push(format!("{}={}", escape_path_name(name), value));
        }
        let row = u32::try_from(row).map_err(|_| {
            ArrowError::InvalidArgumentError("batch too large to partition".to_string())
        })?;
        groups.entry(segments.join("/")).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(path, rows)| {
            let indices = UInt32Array::from(rows);
            Ok(PartitionSlice {
                path,
                batch: take_record_batch(&data, &indices)?,
            })
        })
        .collect()
}

fn partition_value(array: &dyn Array, row: usize) -> Result<String, ArrowError> {
    if array.is_null(row) {
        return Ok(HIVE_DEFAULT_PARTITION.to_string());
    }
    let value = array_value_to_string(array, row)?;
    if value.is_empty() {
        Ok(HIVE_DEFAULT_PARTITION.to_string())
    } else {
        Ok(escape_path_name(&value))
    }
}

fn needs_escape(c: char) -> bool {
    c.is_ascii_control()
        || matches!(
            c,
            '"' | '#' | '%' | '\'' | '*' | '/' | ':' | '=' | '?' | '\\' | '{' | '[' | ']' | '^'
        )
}

/// Percent-escape characters that would break a `key=value` path segment
pub fn escape_path_name(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if needs_escape(c) {
            escaped.push_str(&format!("%{:02X}", c as u32));
        } else {
            escaped.push(c);
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn songs_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("song_id", DataType::Utf8, false),
            Field::new("year", DataType::Int32, false),
            Field::new("artist_id", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["S1", "S2", "S3", "S4"])),
                Arc::new(Int32Array::from(vec![2001, 0, 2001, 2001])),
                Arc::new(StringArray::from(vec![Some("AR1"), Some("AR2"), Some("AR1"), None])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_split_by_partition() {
        let slices = split_by_partition(&songs_batch(), &["year", "artist_id"]).unwrap();
        let paths: Vec<&str> = slices.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "year=0/artist_id=AR2",
                "year=2001/artist_id=AR1",
                "year=2001/artist_id=__HIVE_DEFAULT_PARTITION__",
            ]
        );

        let ar1 = &slices[1].batch;
        assert_eq!(ar1.num_rows(), 2);
        assert_eq!(ar1.num_columns(), 1);
        assert_eq!(ar1.schema().field(0).name(), "song_id");
        let ids = ar1
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(ids.value(0), "S1");
        assert_eq!(ids.value(1), "S3");
    }

    #[test]
    fn test_unknown_partition_column() {
        assert!(split_by_partition(&songs_batch(), &["month"]).is_err());
    }

    #[test]
    fn test_empty_batch_has_no_partitions() {
        let batch = songs_batch().slice(0, 0);
        assert!(split_by_partition(&batch, &["year"]).unwrap().is_empty());
    }

    #[test]
    fn test_escape_path_name() {
        assert_eq!(escape_path_name("ARJIE2Y1187B994AB7"), "ARJIE2Y1187B994AB7");
        assert_eq!(escape_path_name("a/b=c"), "a%2Fb%3Dc");
        assert_eq!(escape_path_name("50%"), "50%25");
        assert_eq!(escape_path_name("Beyoncé"), "Beyoncé");
    }
}
