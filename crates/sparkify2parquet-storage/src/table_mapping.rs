//! Output tables, their destinations and partition columns

use sparkify2parquet_config::TableNames;
use sparkify2parquet_core::schema::column;
use std::fmt;

/// The five star-schema tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Songs,
    Artists,
    Users,
    Time,
    Songplays,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Songs,
        Table::Artists,
        Table::Users,
        Table::Time,
        Table::Songplays,
    ];

    /// Canonical table name, embedded in Parquet metadata
    pub fn name(&self) -> &'static str {
        match self {
            Table::Songs => "songs",
            Table::Artists => "artists",
            Table::Users => "users",
            Table::Time => "time",
            Table::Songplays => "songplays",
        }
    }

    pub fn partition_columns(&self) -> &'static [&'static str] {
        match self {
            Table::Songs => &[column::YEAR, column::ARTIST_ID],
            Table::Artists | Table::Users => &[],
            Table::Time | Table::Songplays => &[column::YEAR, column::MONTH],
        }
    }

    /// Destination directory under the output root
    pub fn destination<'a>(&self, names: &'a TableNames) -> &'a str {
        let name = match self {
            Table::Songs => &names.songs,
            Table::Artists => &names.artists,
            Table::Users => &names.users,
            Table::Time => &names.time,
            Table::Songplays => &names.songplays,
        };
        name.trim_matches('/')
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
