//! Purpose: Plain data model for rows returned by a row store.
//! Exports: `Column`, `Row`, `ResultSet`, `zero_version`.
//! Role: Owned values handed from stores to the shell; no behavior beyond construction.
//! Invariants: Column order is the store's order and is never re-sorted here.
//! Invariants: `ResultSet` is produced fresh per query and owned by its caller.
use time::OffsetDateTime;
use time::macros::datetime;

/// Version used for cells that carry no timestamp (`0001-01-01T00:00:00Z`).
pub fn zero_version() -> OffsetDateTime {
    datetime!(0001-01-01 00:00:00 UTC)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub family: String,
    /// Fully-qualified column name, `family:name`.
    pub qualifier: String,
    pub value: Vec<u8>,
    pub version: OffsetDateTime,
}

impl Column {
    pub fn new(
        family: impl Into<String>,
        qualifier: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            family: family.into(),
            qualifier: qualifier.into(),
            value: value.into(),
            version: zero_version(),
        }
    }

    pub fn with_version(mut self, version: OffsetDateTime) -> Self {
        self.version = version;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub key: String,
    pub columns: Vec<Column>,
}

impl Row {
    pub fn new(key: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            key: key.into(),
            columns,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    pub table: String,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(table: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            table: table.into(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
