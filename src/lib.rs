//! valet_rs
//!
//! A lightweight Rust client for the Bank of Canada **Valet** statistical-data API.
//! Pairs with the `valet` CLI.
//!
//! ### Features
//! - List every published series and group (cached after the first call)
//! - Series and group details in JSON, CSV or XML
//! - Observations for a series, several series or a whole group, filtered by date window
//!   or by the most recent N periods
//! - Raw FX RSS feeds
//! - Every response reshaped into a [`Table`] and savable as CSV or JSON
//!
//! ### Example
//! ```no_run
//! use valet_rs::{Interpreter, ObservationQuery, ResponseFormat};
//!
//! let valet = Interpreter::default();
//! let series = valet.list_series()?;
//! println!("{} series available", series.len());
//!
//! let (group, members) = valet.get_group_detail("FX_RATES_DAILY", ResponseFormat::Csv)?;
//! let (_detail, obs) = valet.get_series_observations(
//!     "FXUSDCAD",
//!     &ObservationQuery::between("2024-01-01", "2024-01-31")?,
//! )?;
//! valet_rs::storage::save_csv(&obs, "usdcad_jan_2024.csv")?;
//! # let _ = (group, members);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod error;
pub mod models;
pub mod parse;
pub mod storage;
pub mod table;

pub use api::Interpreter;
pub use error::{Error, Result};
pub use models::{
    CatalogEntry, GroupDetail, GroupListEntry, Observation, ObservationQuery, Order,
    ResponseFormat, SeriesDetail, SeriesListEntry,
};
pub use table::Table;
