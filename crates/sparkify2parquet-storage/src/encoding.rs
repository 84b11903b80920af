use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;

fn compression_setting() -> Compression {
    let level = ZstdLevel::try_new(2).unwrap_or_default();
    Compression::ZSTD(level)
}

/// Writer properties for one output table
///
/// - ZSTD(2) compression
/// - Dictionary encoding enabled
/// - Page-level statistics for partition-pruned scans
/// - Writer version and table name embedded in the file footer
pub(crate) fn writer_properties(row_group_size: usize, table: &str) -> WriterProperties {
    let metadata = vec![
        KeyValue {
            key: "sparkify2parquet.version".to_string(),
            value: Some(env!("CARGO_PKG_VERSION").to_string()),
        },
        KeyValue {
            key: "sparkify2parquet.table".to_string(),
            value: Some(table.to_string()),
        },
    ];

    WriterProperties::builder()
        .set_dictionary_enabled(true)
        .set_statistics_enabled(EnabledStatistics::Page)
        .set_compression(compression_setting())
        .set_data_page_size_limit(256 * 1024)
        .set_write_batch_size(32 * 1024)
        .set_max_row_group_size(row_group_size.max(1))
        .set_dictionary_page_size_limit(128 * 1024)
        .set_key_value_metadata(Some(metadata))
        .build()
}
