use super::{key_column, table_from_records};
use crate::error::{Error, Result};
use crate::table::Table;
use serde_json::Value;

type Record = Vec<(String, String)>;

fn parse_value(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| Error::parse("json", e.to_string()))
}

fn scalar(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Flatten nested objects with dotted column names. Arrays are kept as JSON text.
fn flatten_into(prefix: &str, v: &Value, out: &mut Record) {
    match v {
        Value::Object(map) => {
            for (k, child) in map {
                flatten_into(&join(prefix, k), child, out);
            }
        }
        other => out.push((prefix.to_string(), scalar(other))),
    }
}

fn flatten(v: &Value) -> Record {
    let mut out = Vec::new();
    match v {
        Value::Object(_) => flatten_into("", v, &mut out),
        other => out.push(("value".to_string(), scalar(other))),
    }
    out
}

/// Rows from either an object keyed by identifier or an array of objects.
fn keyed_rows(v: &Value) -> Result<Table> {
    match v {
        Value::Object(map) => Ok(table_from_records(map.iter().map(|(name, fields)| {
            let mut record = vec![("name".to_string(), name.clone())];
            record.extend(flatten(fields));
            record
        }))),
        Value::Array(items) => Ok(table_from_records(items.iter().map(flatten))),
        other => Err(Error::parse(
            "json",
            format!("expected an object or array of records, found {other}"),
        )),
    }
}

/// First of `keys` present on `root`.
fn section<'a>(root: &'a Value, keys: &[&str]) -> Result<&'a Value> {
    keys.iter()
        .find_map(|k| root.get(*k))
        .ok_or_else(|| Error::parse("json", format!("missing '{}' section", keys.join("' or '"))))
}

pub(super) fn catalog(body: &str) -> Result<Table> {
    let root = parse_value(body)?;
    match &root {
        Value::Array(_) => keyed_rows(&root),
        _ => keyed_rows(section(&root, &["series", "groups"])?),
    }
}

pub(super) fn series_detail(body: &str) -> Result<Table> {
    let root = parse_value(body)?;
    let detail = section(&root, &["seriesDetails", "seriesDetail"])?;
    Ok(table_from_records([flatten(detail)]))
}

pub(super) fn group_detail(body: &str) -> Result<(Table, Table)> {
    let root = parse_value(body)?;
    let detail = section(&root, &["groupDetails", "groupDetail"])?;
    let Value::Object(fields) = detail else {
        return Err(Error::parse("json", "groupDetails is not an object"));
    };

    let mut group = Vec::new();
    for (k, v) in fields.iter().filter(|(k, _)| k.as_str() != "groupSeries") {
        flatten_into(k, v, &mut group);
    }
    let series = match fields.get("groupSeries") {
        Some(v) => keyed_rows(v)?,
        None => Table::new(["name", "label", "link"]),
    };
    Ok((table_from_records([group]), series))
}

/// One observation row: `d` becomes `date`, `{"v": x}` cells collapse to `x`.
fn observation_record(v: &Value) -> Record {
    let Value::Object(map) = v else {
        return flatten(v);
    };
    let mut out = Vec::new();
    for (k, cell) in map {
        match cell.get("v") {
            Some(inner) => out.push((k.clone(), scalar(inner))),
            None => flatten_into(key_column(k), cell, &mut out),
        }
    }
    out
}

pub(super) fn observations(body: &str) -> Result<(Table, Table)> {
    let root = parse_value(body)?;
    let detail = keyed_rows(section(&root, &["seriesDetail", "seriesDetails"])?)?;
    let Value::Array(obs) = section(&root, &["observations"])? else {
        return Err(Error::parse("json", "observations is not an array"));
    };
    Ok((detail, table_from_records(obs.iter().map(observation_record))))
}
