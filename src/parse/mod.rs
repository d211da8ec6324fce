//! Response parsers: turn a Valet body in one of the three wire formats into [`Table`]s.
//!
//! Every entry point takes the raw body and the declared [`ResponseFormat`] and returns the
//! same table shapes whatever the format, so callers never branch on format themselves:
//!
//! | entry point        | tables returned                                  |
//! |--------------------|--------------------------------------------------|
//! | [`catalog`]        | one row per series or group                      |
//! | [`series_detail`]  | single-row detail                                |
//! | [`group_detail`]   | single-row group detail, member series           |
//! | [`observations`]   | series detail, observations (`date` + series)    |

mod csv;
mod json;
mod xml;

use crate::error::{Error, Result};
use crate::models::ResponseFormat;
use crate::table::Table;

/// Parse a `/lists/series` or `/lists/groups` body.
///
/// [`Interpreter`](crate::Interpreter) always requests catalogs as JSON; the CSV and XML
/// branches serve callers that fetched a catalog body themselves.
pub fn catalog(body: &str, format: ResponseFormat) -> Result<Table> {
    match format {
        ResponseFormat::Json => json::catalog(body),
        ResponseFormat::Csv => csv::catalog(body),
        ResponseFormat::Xml => xml::catalog(body),
    }
}

/// Parse a `/series/{name}` body into a single-row table.
pub fn series_detail(body: &str, format: ResponseFormat) -> Result<Table> {
    let detail = match format {
        ResponseFormat::Json => json::series_detail(body),
        ResponseFormat::Csv => csv::series_detail(body),
        ResponseFormat::Xml => xml::series_detail(body),
    }?;
    single_named(format, "series", detail)
}

/// Parse a `/groups/{name}` body into (group, member series).
pub fn group_detail(body: &str, format: ResponseFormat) -> Result<(Table, Table)> {
    let (group, series) = match format {
        ResponseFormat::Json => json::group_detail(body),
        ResponseFormat::Csv => csv::group_detail(body),
        ResponseFormat::Xml => xml::group_detail(body),
    }?;
    Ok((single_named(format, "group", group)?, series))
}

/// Parse an `/observations/...` body (series or group) into (series detail, observations).
pub fn observations(body: &str, format: ResponseFormat) -> Result<(Table, Table)> {
    match format {
        ResponseFormat::Json => json::observations(body),
        ResponseFormat::Csv => csv::observations(body),
        ResponseFormat::Xml => xml::observations(body),
    }
}

/// A detail table must hold exactly one row with a non-empty `name`.
fn single_named(format: ResponseFormat, kind: &str, detail: Table) -> Result<Table> {
    if detail.len() == 1 && detail.get(0, "name").is_some_and(|n| !n.is_empty()) {
        return Ok(detail);
    }
    Err(Error::parse(
        format.as_str(),
        format!(
            "expected one named {kind} row, found {} row(s) with columns {:?}",
            detail.len(),
            detail.columns()
        ),
    ))
}

/// Table built from (column, value) records, columns in first-seen order.
fn table_from_records(records: impl IntoIterator<Item = Vec<(String, String)>>) -> Table {
    let mut table = Table::default();
    for record in records {
        table.push_record(record);
    }
    table
}

/// Column name used for a record's identifying attribute/key.
fn key_column(key: &str) -> &str {
    match key {
        "id" => "name",
        "d" => "date",
        other => other,
    }
}
