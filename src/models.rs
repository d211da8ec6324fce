use crate::error::{Error, Result};
use crate::table::Table;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Body format requested from Valet. Selects the path segment and the parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Json,
    Csv,
    Xml,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
            ResponseFormat::Csv => "csv",
            ResponseFormat::Xml => "xml",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ResponseFormat::Json),
            "csv" => Ok(ResponseFormat::Csv),
            "xml" => Ok(ResponseFormat::Xml),
            other => Err(Error::InvalidArgument(format!(
                "unsupported response format '{other}', expected json, csv or xml"
            ))),
        }
    }
}

/// Sort direction of returned observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// Optional filters for the observations endpoints.
///
/// Valet accepts either a date window (`start_date`/`end_date`) or exactly one of the
/// `recent*` counters. The combination is checked by [`ObservationQuery::to_query_pairs`]
/// before anything goes on the wire.
///
/// ```
/// # use valet_rs::ObservationQuery;
/// let q = ObservationQuery::between("2024-01-01", "2024-01-31")?;
/// assert_eq!(q.to_query_pairs()?.len(), 2);
/// assert!(ObservationQuery::between("2024-02-01", "2024-01-01")?.to_query_pairs().is_err());
/// # Ok::<(), valet_rs::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub recent: Option<u32>,
    pub recent_weeks: Option<u32>,
    pub recent_months: Option<u32>,
    pub recent_years: Option<u32>,
    pub order_dir: Option<Order>,
}

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(field: &str, s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|e| {
        Error::InvalidArgument(format!("{field} '{s}' is not a YYYY-MM-DD date: {e}"))
    })
}

impl ObservationQuery {
    /// Inclusive date window parsed from `YYYY-MM-DD` strings.
    pub fn between(start: &str, end: &str) -> Result<Self> {
        Ok(Self {
            start_date: Some(parse_date("start_date", start)?),
            end_date: Some(parse_date("end_date", end)?),
            ..Self::default()
        })
    }

    /// Most recent `n` observations.
    pub fn latest(n: u32) -> Self {
        Self {
            recent: Some(n),
            ..Self::default()
        }
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn recent(mut self, n: u32) -> Self {
        self.recent = Some(n);
        self
    }

    pub fn recent_weeks(mut self, n: u32) -> Self {
        self.recent_weeks = Some(n);
        self
    }

    pub fn recent_months(mut self, n: u32) -> Self {
        self.recent_months = Some(n);
        self
    }

    pub fn recent_years(mut self, n: u32) -> Self {
        self.recent_years = Some(n);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order_dir = Some(order);
        self
    }

    /// Validate and render as URL query pairs.
    pub fn to_query_pairs(&self) -> Result<Vec<(&'static str, String)>> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(Error::InvalidArgument(format!(
                    "start_date {start} is after end_date {end}"
                )));
            }
        }

        let recents: Vec<(&'static str, u32)> = [
            ("recent", self.recent),
            ("recent_weeks", self.recent_weeks),
            ("recent_months", self.recent_months),
            ("recent_years", self.recent_years),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|n| (k, n)))
        .collect();

        if recents.len() > 1 {
            return Err(Error::InvalidArgument(
                "only one of recent, recent_weeks, recent_months, recent_years may be set".into(),
            ));
        }
        if !recents.is_empty() && (self.start_date.is_some() || self.end_date.is_some()) {
            return Err(Error::InvalidArgument(
                "recent* parameters cannot be combined with start_date/end_date".into(),
            ));
        }
        if let Some((key, 0)) = recents.first() {
            return Err(Error::InvalidArgument(format!("{key} must be at least 1")));
        }

        let mut pairs = Vec::new();
        if let Some(d) = self.start_date {
            pairs.push(("start_date", d.format(DATE_FORMAT).to_string()));
        }
        if let Some(d) = self.end_date {
            pairs.push(("end_date", d.format(DATE_FORMAT).to_string()));
        }
        pairs.extend(recents.into_iter().map(|(k, n)| (k, n.to_string())));
        if let Some(o) = self.order_dir {
            pairs.push(("order_dir", o.as_str().to_string()));
        }
        Ok(pairs)
    }
}

/// One row of the series or groups catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

pub type SeriesListEntry = CatalogEntry;
pub type GroupListEntry = CatalogEntry;

/// Details of one series as returned by `/series/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesDetail {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "dimension.key", default)]
    pub dimension_key: Option<String>,
    #[serde(rename = "dimension.name", default)]
    pub dimension_name: Option<String>,
}

/// Details of one group as returned by `/groups/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDetail {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Values of every series on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: String,
    /// Series name -> value; `None` when the cell is empty or not numeric.
    pub values: BTreeMap<String, Option<f64>>,
}

impl Observation {
    /// Read an observations table (`date` column plus one column per series).
    pub fn from_table(table: &Table) -> Vec<Observation> {
        let Some(date_idx) = table.column_index("date") else {
            return Vec::new();
        };
        table
            .rows()
            .iter()
            .map(|row| Observation {
                date: row[date_idx].clone(),
                values: table
                    .columns()
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != date_idx)
                    .map(|(i, c)| (c.clone(), row[i].trim().parse::<f64>().ok()))
                    .collect(),
            })
            .collect()
    }
}
