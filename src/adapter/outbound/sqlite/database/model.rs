//! Diesel row types for raw SQL queries against map tables.
//!
//! Map tables are named at runtime, so they have no `table!` schema and are
//! read through `sql_query` with these `QueryableByName` rows.

use diesel::sql_types::{BigInt, Nullable, Text};
use diesel::QueryableByName;

use crate::port::StoredRow;

/// One `(key, value)` row of a map table.
#[derive(Debug, QueryableByName)]
pub struct MapRow {
    #[diesel(sql_type = Text)]
    pub key: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub value: Option<String>,
}

impl From<MapRow> for StoredRow {
    fn from(row: MapRow) -> Self {
        Self {
            key: row.key,
            value: row.value,
        }
    }
}

/// Result of a `count(*) AS count` query.
#[derive(Debug, QueryableByName)]
pub struct RowCount {
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}
