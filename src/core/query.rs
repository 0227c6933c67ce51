//! Purpose: Turn `key=value` shell arguments into a row range plus read modifiers.
//! Exports: `RowRange`, `ReadOption`, `RowKeyFilter`, `QuerySpec`, `parse_args`, `build_query`.
//! Role: Validation boundary for `read`; nothing reaches a store unless this succeeds.
//! Invariants: `prefix` wins over `start`/`end`; no range argument means every key.
//! Invariants: Modifiers come out in a fixed order regardless of argument order.
use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

use crate::core::error::{Error, ErrorKind};

pub const ARG_PREFIX: &str = "prefix";
pub const ARG_START: &str = "start";
pub const ARG_END: &str = "end";
pub const ARG_COUNT: &str = "count";
pub const ARG_REGEX: &str = "regex";
pub const ARG_VERSION: &str = "version";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RowRange {
    /// Every key.
    Infinite,
    /// Keys starting with the given bytes.
    Prefix(Vec<u8>),
    /// `[start, end)`; `None` leaves that side open.
    Range {
        start: Option<Vec<u8>>,
        end: Option<Vec<u8>>,
    },
}

impl RowRange {
    pub fn prefix(prefix: impl Into<Vec<u8>>) -> Self {
        RowRange::Prefix(prefix.into())
    }

    pub fn between(start: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>) -> Self {
        RowRange::Range {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    /// Inclusive start key; empty means the beginning of the table.
    pub fn start_key(&self) -> &[u8] {
        match self {
            RowRange::Infinite => &[],
            RowRange::Prefix(prefix) => prefix,
            RowRange::Range { start, .. } => start.as_deref().unwrap_or(&[]),
        }
    }

    /// Exclusive end key; `None` means the end of the table.
    pub fn end_key(&self) -> Option<Vec<u8>> {
        match self {
            RowRange::Infinite => None,
            RowRange::Prefix(prefix) => prefix_successor(prefix),
            RowRange::Range { end, .. } => end.clone(),
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        match self {
            RowRange::Infinite => true,
            RowRange::Prefix(prefix) => key.starts_with(prefix),
            RowRange::Range { start, end } => {
                start.as_deref().is_none_or(|start| key >= start)
                    && end.as_deref().is_none_or(|end| key < end)
            }
        }
    }
}

/// Smallest key greater than every key sharing `prefix`.
///
/// Trailing `0xFF` bytes cannot be incremented and are dropped first; a prefix
/// made only of `0xFF` (or an empty prefix) has no upper bound.
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let keep = prefix.iter().rposition(|byte| *byte != u8::MAX)?;
    let mut end = prefix[..=keep].to_vec();
    end[keep] += 1;
    Some(end)
}

#[derive(Clone, Debug)]
pub struct RowKeyFilter {
    regex: Regex,
}

impl RowKeyFilter {
    pub fn new(pattern: &str) -> Result<Self, Error> {
        let regex = Regex::new(pattern).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("invalid {ARG_REGEX} pattern: {pattern}"))
                .with_source(err)
        })?;
        Ok(Self { regex })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}

impl PartialEq for RowKeyFilter {
    fn eq(&self, other: &Self) -> bool {
        self.pattern() == other.pattern()
    }
}

impl fmt::Display for RowKeyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReadOption {
    LimitRows(u64),
    RowKeyFilter(RowKeyFilter),
    LatestVersions(u32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct QuerySpec {
    pub range: RowRange,
    pub options: Vec<ReadOption>,
}

/// Collects `name=value` tokens; tokens without `=` are skipped and a repeated
/// name keeps its last value.
pub fn parse_args<'a, I>(tokens: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = &'a str>,
{
    tokens
        .into_iter()
        .filter_map(|token| token.split_once('='))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

pub fn build_query(args: &BTreeMap<String, String>) -> Result<QuerySpec, Error> {
    Ok(QuerySpec {
        range: row_range(args),
        options: read_options(args)?,
    })
}

pub fn row_range(args: &BTreeMap<String, String>) -> RowRange {
    if let Some(prefix) = args.get(ARG_PREFIX) {
        return RowRange::prefix(prefix.as_bytes());
    }
    let start = args.get(ARG_START).map(|value| value.as_bytes().to_vec());
    let end = args.get(ARG_END).map(|value| value.as_bytes().to_vec());
    if start.is_none() && end.is_none() {
        return RowRange::Infinite;
    }
    RowRange::Range { start, end }
}

pub fn read_options(args: &BTreeMap<String, String>) -> Result<Vec<ReadOption>, Error> {
    let mut options = Vec::new();
    if let Some(count) = args.get(ARG_COUNT) {
        let limit = count.parse::<u64>().map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("{ARG_COUNT} must be a non-negative integer, got {count:?}"))
                .with_source(err)
        })?;
        options.push(ReadOption::LimitRows(limit));
    }
    if let Some(pattern) = args.get(ARG_REGEX) {
        options.push(ReadOption::RowKeyFilter(RowKeyFilter::new(pattern)?));
    }
    if let Some(version) = args.get(ARG_VERSION) {
        let latest = version
            .parse::<u32>()
            .ok()
            .filter(|latest| *latest > 0)
            .ok_or_else(|| {
                Error::new(ErrorKind::Usage).with_message(format!(
                    "{ARG_VERSION} must be a positive integer, got {version:?}"
                ))
            })?;
        options.push(ReadOption::LatestVersions(latest));
    }
    Ok(options)
}
