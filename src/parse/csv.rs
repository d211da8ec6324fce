use crate::error::{Error, Result};
use crate::table::Table;

/// One block of a Valet CSV body: a quoted upper-case heading line, a header record
/// and data records.
#[derive(Debug, Default)]
struct Section {
    heading: String,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Section {
    fn into_table(self) -> Table {
        let mut table = Table::new(self.header);
        for row in self.rows {
            table.push_row(row);
        }
        if table.columns().first().is_some_and(|c| c == "id") {
            table.rename_column("id", "name");
        }
        table
    }
}

fn is_heading(cell: &str) -> bool {
    !cell.is_empty()
        && cell.chars().any(|c| c.is_ascii_uppercase())
        && cell
            .chars()
            .all(|c| c.is_ascii_uppercase() || c == ' ' || c == '_')
}

/// Split a body into sections. A body without headings is one unnamed section.
fn sections(body: &str) -> Result<Vec<Section>> {
    let body = body.trim_start_matches('\u{feff}');
    let mut rdr = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut out: Vec<Section> = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| Error::parse("csv", e.to_string()))?;
        let cells: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        if cells.len() == 1 && is_heading(&cells[0]) {
            out.push(Section {
                heading: cells[0].clone(),
                ..Section::default()
            });
            continue;
        }
        if out.is_empty() {
            out.push(Section::default());
        }
        if let Some(section) = out.last_mut() {
            if section.header.is_empty() {
                section.header = cells;
            } else {
                section.rows.push(cells);
            }
        }
    }
    Ok(out)
}

/// Sections carrying data, i.e. everything but the terms and conditions preamble.
fn data_sections(body: &str) -> Result<Vec<Section>> {
    let mut all = sections(body)?;
    all.retain(|s| !s.heading.starts_with("TERMS") && !s.header.is_empty());
    Ok(all)
}

pub(super) fn catalog(body: &str) -> Result<Table> {
    data_sections(body)?
        .into_iter()
        .next()
        .map(Section::into_table)
        .ok_or_else(|| Error::parse("csv", "no catalog section in body"))
}

pub(super) fn series_detail(body: &str) -> Result<Table> {
    catalog(body)
}

pub(super) fn group_detail(body: &str) -> Result<(Table, Table)> {
    let mut data = data_sections(body)?.into_iter();
    match (data.next(), data.next()) {
        (Some(group), Some(series)) => Ok((group.into_table(), series.into_table())),
        (Some(group), None) => Ok((group.into_table(), Table::new(["name", "label", "link"]))),
        _ => Err(Error::parse("csv", "no group details section in body")),
    }
}

pub(super) fn observations(body: &str) -> Result<(Table, Table)> {
    let mut data = data_sections(body)?;
    let obs_idx = data
        .iter()
        .position(|s| s.heading.contains("OBSERVATIONS"))
        .ok_or_else(|| Error::parse("csv", "no OBSERVATIONS section in body"))?;
    let detail_idx = data
        .iter()
        .position(|s| s.heading == "SERIES")
        .or_else(|| obs_idx.checked_sub(1));

    let observations = data.remove(obs_idx).into_table();
    let detail = match detail_idx {
        Some(i) => {
            let i = if i > obs_idx { i - 1 } else { i };
            data.remove(i).into_table()
        }
        None => Table::new(["name", "label", "description"]),
    };
    Ok((detail, observations))
}
