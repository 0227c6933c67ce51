//! Purpose: In-process row store used for offline snapshots and as a test double.
//! Exports: `MemoryStore`.
//! Role: Reference semantics for ranges and read modifiers without a network.
//! Invariants: Rows within a table are kept sorted by key bytes.
//! Invariants: Tables are listed in name order.
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::{RowStore, StoreResult};
use crate::core::error::{Error, ErrorKind};
use crate::core::query::{ReadOption, RowRange};
use crate::core::row::{ResultSet, Row};

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: BTreeMap<String, BTreeMap<String, Row>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty table; existing rows are kept.
    pub fn create_table(&mut self, table: impl Into<String>) {
        self.tables.entry(table.into()).or_default();
    }

    /// Inserts or replaces a row, creating the table when needed.
    pub fn put_row(&mut self, table: impl Into<String>, row: Row) {
        self.tables
            .entry(table.into())
            .or_default()
            .insert(row.key.clone(), row);
    }

    pub fn with_row(mut self, table: impl Into<String>, row: Row) -> Self {
        self.put_row(table, row);
        self
    }

    fn table(&self, table: &str) -> StoreResult<&BTreeMap<String, Row>> {
        self.tables.get(table).ok_or_else(|| {
            Error::new(ErrorKind::NotFound).with_message(format!("table {table:?} not found"))
        })
    }
}

impl RowStore for MemoryStore {
    fn list_tables(&self) -> StoreResult<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    fn get_row(&self, table: &str, key: &str) -> StoreResult<ResultSet> {
        let rows = self.table(table)?.get(key).cloned().into_iter().collect();
        Ok(ResultSet::new(table, rows))
    }

    fn get_rows(
        &self,
        table: &str,
        range: &RowRange,
        options: &[ReadOption],
    ) -> StoreResult<ResultSet> {
        let mut limit = None;
        let mut filters = Vec::new();
        let mut latest = None;
        for option in options {
            match option {
                ReadOption::LimitRows(rows) => limit = Some(*rows),
                ReadOption::RowKeyFilter(filter) => filters.push(filter),
                ReadOption::LatestVersions(versions) => latest = Some(*versions),
            }
        }

        let rows = self
            .table(table)?
            .values()
            .filter(|row| range.contains(row.key.as_bytes()))
            .filter(|row| filters.iter().all(|filter| filter.is_match(&row.key)))
            .map(|row| match latest {
                Some(versions) => keep_latest(row, versions),
                None => row.clone(),
            })
            .take(limit.map_or(usize::MAX, |rows| {
                usize::try_from(rows).unwrap_or(usize::MAX)
            }))
            .collect();
        Ok(ResultSet::new(table, rows))
    }
}

// Keeps the `versions` newest cells of each qualifier; ties keep stored order.
// Surviving columns stay in their stored order.
fn keep_latest(row: &Row, versions: u32) -> Row {
    let mut by_qualifier: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, column) in row.columns.iter().enumerate() {
        by_qualifier
            .entry(column.qualifier.as_str())
            .or_default()
            .push(index);
    }
    let cap = usize::try_from(versions).unwrap_or(usize::MAX);
    let mut kept = HashSet::new();
    for indices in by_qualifier.values_mut() {
        indices.sort_by_key(|&index| Reverse(row.columns[index].version));
        kept.extend(indices.iter().take(cap).copied());
    }
    let columns = row
        .columns
        .iter()
        .enumerate()
        .filter(|(index, _)| kept.contains(index))
        .map(|(_, column)| column.clone())
        .collect();
    Row::new(row.key.clone(), columns)
}
