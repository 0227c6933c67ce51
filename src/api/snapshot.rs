//! Purpose: Load a JSON table snapshot into a `MemoryStore`.
//! Exports: `load_snapshot`, `parse_snapshot`.
//! Role: Offline inspection input for the shell (`--snapshot FILE`).
//! Invariants: Cell values are UTF-8 text or raw byte arrays; versions are RFC3339.
//! Invariants: A cell without a version gets the zero version.
use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use time::UtcOffset;

use super::{MemoryStore, StoreResult, parse_version};
use crate::core::error::{Error, ErrorKind};
use crate::core::row::{Column, Row, zero_version};

#[derive(Deserialize)]
struct SnapshotFile {
    tables: BTreeMap<String, Vec<SnapshotRow>>,
}

#[derive(Deserialize)]
struct SnapshotRow {
    key: String,
    #[serde(default)]
    columns: Vec<SnapshotColumn>,
}

#[derive(Deserialize)]
struct SnapshotColumn {
    family: String,
    qualifier: String,
    value: SnapshotValue,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotValue {
    Text(String),
    Bytes(Vec<u8>),
}

pub fn load_snapshot(path: impl AsRef<Path>, offset: UtcOffset) -> StoreResult<MemoryStore> {
    let path = path.as_ref();
    let body = std::fs::read_to_string(path).map_err(|err| {
        Error::from(err)
            .with_message(format!("failed to read snapshot {}", path.display()))
    })?;
    parse_snapshot(&body, offset)
        .map_err(|err| err.with_hint(format!("Check the JSON layout of {}.", path.display())))
}

pub fn parse_snapshot(body: &str, offset: UtcOffset) -> StoreResult<MemoryStore> {
    let file: SnapshotFile = serde_json::from_str(body).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("invalid snapshot json: {err}"))
            .with_source(err)
    })?;

    let mut store = MemoryStore::new();
    for (table, rows) in file.tables {
        store.create_table(table.clone());
        for row in rows {
            let columns = row
                .columns
                .into_iter()
                .map(|column| snapshot_column(column, offset))
                .collect::<StoreResult<Vec<_>>>()?;
            store.put_row(table.clone(), Row::new(row.key, columns));
        }
    }
    Ok(store)
}

fn snapshot_column(column: SnapshotColumn, offset: UtcOffset) -> StoreResult<Column> {
    let value = match column.value {
        SnapshotValue::Text(text) => text.into_bytes(),
        SnapshotValue::Bytes(bytes) => bytes,
    };
    let version = match column.version.as_deref() {
        Some(version) => parse_version(version, offset)?,
        None => zero_version(),
    };
    Ok(Column::new(column.family, column.qualifier, value).with_version(version))
}

#[cfg(test)]
mod tests {
    use super::parse_snapshot;
    use crate::api::{ReadOption, RowRange, RowStore};
    use crate::core::error::ErrorKind;
    use crate::core::row::zero_version;
    use time::UtcOffset;

    const SNAPSHOT: &str = r#"{
        "tables": {
            "users": [
                {"key": "1", "columns": [
                    {"family": "d", "qualifier": "d:row", "value": "madoka",
                     "version": "2018-01-01T00:00:00Z"}
                ]},
                {"key": "2", "columns": [
                    {"family": "d", "qualifier": "d:age", "value": [0, 0, 0, 0, 0, 0, 0, 14]}
                ]}
            ],
            "empty": []
        }
    }"#;

    #[test]
    fn snapshot_loads_text_and_byte_values() {
        let store = parse_snapshot(SNAPSHOT, UtcOffset::UTC).expect("snapshot");
        assert_eq!(
            store.list_tables().expect("tables"),
            vec!["empty".to_string(), "users".to_string()]
        );

        let rows = store
            .get_rows("users", &RowRange::Infinite, &[])
            .expect("rows")
            .rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].columns[0].value, b"madoka".to_vec());
        assert_eq!(rows[0].columns[0].version.year(), 2018);
        assert_eq!(rows[1].columns[0].value, vec![0, 0, 0, 0, 0, 0, 0, 14]);
        assert_eq!(rows[1].columns[0].version, zero_version());
    }

    #[test]
    fn malformed_snapshot_is_usage_error() {
        let err = parse_snapshot("{\"tables\": 3}", UtcOffset::UTC).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn oldest_first_cells_still_yield_latest_version() {
        let body = r#"{"tables": {"users": [{"key": "4", "columns": [
            {"family": "d", "qualifier": "d:row", "value": "old", "version": "2018-01-01T00:00:00Z"},
            {"family": "d", "qualifier": "d:row", "value": "new", "version": "2018-01-01T01:00:00Z"}
        ]}]}}"#;
        let store = parse_snapshot(body, UtcOffset::UTC).expect("snapshot");
        let rows = store
            .get_rows("users", &RowRange::Infinite, &[ReadOption::LatestVersions(1)])
            .expect("rows")
            .rows;
        assert_eq!(rows[0].columns.len(), 1);
        assert_eq!(rows[0].columns[0].value, b"new".to_vec());
    }
}
