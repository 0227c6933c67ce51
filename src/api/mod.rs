//! Purpose: Define the row-store capability consumed by the shell.
//! Exports: `RowStore`, `MemoryStore`, `RemoteClient`, `RemoteStore`, snapshot loading, core types.
//! Role: Seam between command interpretation and whatever actually holds the rows.
//! Invariants: Store errors are opaque to callers; only kind and Display are used.
//! Invariants: Every call returns a freshly owned `ResultSet`.
#![allow(clippy::result_large_err)]

mod memory;
mod remote;
mod snapshot;

use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

pub use crate::core::error::{Error, ErrorKind, to_exit_code};
pub use crate::core::query::{QuerySpec, ReadOption, RowKeyFilter, RowRange};
pub use crate::core::row::{Column, ResultSet, Row, zero_version};
pub use memory::MemoryStore;
pub use remote::{RemoteClient, RemoteStore};
pub use snapshot::{load_snapshot, parse_snapshot};

pub type StoreResult<T> = Result<T, Error>;

/// Read-only access to a wide-column row store.
pub trait RowStore {
    fn list_tables(&self) -> StoreResult<Vec<String>>;

    /// Fetches a single row by exact key; a missing row is an empty result.
    fn get_row(&self, table: &str, key: &str) -> StoreResult<ResultSet>;

    /// Fetches every row in `range` that satisfies all of `options`.
    fn get_rows(
        &self,
        table: &str,
        range: &RowRange,
        options: &[ReadOption],
    ) -> StoreResult<ResultSet>;
}

impl<S: RowStore + ?Sized> RowStore for Box<S> {
    fn list_tables(&self) -> StoreResult<Vec<String>> {
        (**self).list_tables()
    }

    fn get_row(&self, table: &str, key: &str) -> StoreResult<ResultSet> {
        (**self).get_row(table, key)
    }

    fn get_rows(
        &self,
        table: &str,
        range: &RowRange,
        options: &[ReadOption],
    ) -> StoreResult<ResultSet> {
        (**self).get_rows(table, range, options)
    }
}

/// Offset of the process's local time zone, falling back to UTC when the
/// platform cannot determine it safely.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub(crate) fn parse_version(value: &str, offset: UtcOffset) -> StoreResult<OffsetDateTime> {
    let parsed = OffsetDateTime::parse(value, &Rfc3339).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("invalid cell version {value:?}"))
            .with_source(err)
    })?;
    Ok(parsed.to_offset(offset))
}
