use crate::table::Table;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Prefix cells that a spreadsheet would evaluate as a formula.
///
/// `-` is left alone so negative values stay numeric.
fn sanitize_cell(cell: &str) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '@' | '\t' | '\r') => format!("'{cell}"),
        _ => cell.to_string(),
    }
}

/// Write a table as CSV with a header row.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(table.columns().iter().map(|c| sanitize_cell(c)))?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(|c| sanitize_cell(c)))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save a table as CSV with header.
pub fn save_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_csv(table, f)
}

/// Save a table as a pretty JSON array of objects keyed by column.
pub fn save_json<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let s = serde_json::to_string_pretty(&table.to_records())?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
