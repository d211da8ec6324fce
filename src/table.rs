//! Column-named rows of string cells, the shape every Valet response is reshaped into.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A rectangular table: ordered column names and rows of string cells.
///
/// Missing cells are stored as empty strings so every row has one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` in column `column`, if both exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| r[idx].as_str())
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Append a positional row. Short rows are padded, long rows truncated.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Index of `name`, appending it (with empty cells) when absent.
    fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for r in &mut self.rows {
            r.push(String::new());
        }
        self.columns.len() - 1
    }

    /// Append a row given as (column, value) pairs. Unknown columns are added on the
    /// fly and earlier rows get an empty cell for them.
    pub fn push_record<K, V>(&mut self, record: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut row = vec![String::new(); self.columns.len()];
        for (key, value) in record {
            let idx = self.ensure_column(key.as_ref());
            row.resize(self.columns.len(), String::new());
            row[idx] = value.into();
        }
        self.rows.push(row);
    }

    /// Add (or overwrite) a column holding the same value on every row.
    pub fn with_constant_column(mut self, name: &str, value: &str) -> Self {
        let idx = self.ensure_column(name);
        for r in &mut self.rows {
            r[idx] = value.to_string();
        }
        self
    }

    /// Fill the empty cells of `column` (added if absent) with `f(row)`.
    pub fn fill_empty_with(&mut self, column: &str, mut f: impl FnMut(&[String]) -> String) {
        let idx = self.ensure_column(column);
        for row in &mut self.rows {
            if row[idx].is_empty() {
                let value = f(row);
                row[idx] = value;
            }
        }
    }

    pub fn rename_column(&mut self, from: &str, to: &str) {
        if self.column_index(to).is_some() {
            return;
        }
        if let Some(idx) = self.column_index(from) {
            self.columns[idx] = to.to_string();
        }
    }

    /// Rows as JSON objects keyed by column name, in column order.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(c, v)| (c.clone(), Value::String(v.clone())))
                    .collect()
            })
            .collect()
    }

    /// Deserialize each row into `T`. Empty cells are passed as absent fields so
    /// `Option` fields come out as `None`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.to_records()
            .into_iter()
            .map(|mut record| {
                record.retain(|_, v| v.as_str().is_some_and(|s| !s.is_empty()));
                serde_json::from_value(Value::Object(record))
                    .map_err(|e| Error::parse("table", format!("row does not fit record: {e}")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_record_backfills_new_columns() {
        let mut t = Table::new(["name"]);
        t.push_record([("name", "A")]);
        t.push_record([("name", "B"), ("label", "Bee")]);
        assert_eq!(t.columns(), ["name", "label"]);
        assert_eq!(t.get(0, "label"), Some(""));
        assert_eq!(t.get(1, "label"), Some("Bee"));
        assert_eq!(t.column("name").unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn constant_column_and_rename() {
        let mut t = Table::new(["id", "label"]);
        t.push_row(vec!["X".into()]);
        t.rename_column("id", "name");
        let t = t.with_constant_column("group", "G");
        assert_eq!(t.columns(), ["name", "label", "group"]);
        assert_eq!(t.get(0, "group"), Some("G"));
        assert_eq!(t.get(0, "label"), Some(""));
    }

    #[test]
    fn unfit_rows_are_parse_errors() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Point {
            value: f64,
        }
        let mut t = Table::new(["value"]);
        t.push_row(vec!["not-a-number".into()]);
        let err = t.deserialize::<Point>().unwrap_err();
        assert!(matches!(err, Error::Parse { format: "table", .. }), "{err:?}");
    }
}
