//! Purpose: Render rows as the stable, line-oriented text shown to operators.
//! Exports: `write_row`, `render_row`, `format_version`, `SEPARATOR_WIDTH`, `QUALIFIER_WIDTH`.
//! Role: Output contract for `lookup` and `read`; downstream tooling parses it.
//! Invariants: Output is byte-for-byte stable; every line ends with `\n`.
//! Invariants: Versions render in their own offset with microsecond precision.
use std::io::{self, Write};

use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

use crate::core::row::Row;
use crate::core::value::classify;

pub const SEPARATOR_WIDTH: usize = 40;
pub const QUALIFIER_WIDTH: usize = 40;

const VERSION_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]/[month]/[day]-[hour]:[minute]:[second].[subsecond digits:6]"
);

pub fn format_version(version: OffsetDateTime) -> String {
    // The static description only uses components every OffsetDateTime has.
    version
        .format(VERSION_FORMAT)
        .unwrap_or_else(|_| version.to_string())
}

pub fn write_row<W: Write + ?Sized>(out: &mut W, row: &Row) -> io::Result<()> {
    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
    writeln!(out, "{}", row.key)?;
    for column in &row.columns {
        writeln!(
            out,
            "  {:<width$} @ {}",
            column.qualifier,
            format_version(column.version),
            width = QUALIFIER_WIDTH
        )?;
        writeln!(out, "    {}", classify(&column.value))?;
    }
    Ok(())
}

pub fn render_row(row: &Row) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_row(&mut buf, row);
    String::from_utf8_lossy(&buf).into_owned()
}
