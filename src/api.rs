//! Synchronous client for the **Bank of Canada Valet API**.
//!
//! One public method per endpoint. Each call builds the URL, performs a single blocking
//! GET and reshapes the body into [`Table`]s; the series and group catalogs are fetched
//! once and kept for the lifetime of the interpreter.
//!
//! ### Notes
//! - No retries: a failed request surfaces immediately as an [`Error`].
//! - Catalog caches live in `OnceCell`s, so an `Interpreter` is `!Sync`. Use one per thread.
//! - Identifiers are percent-encoded; `-`, `_` and `.` are left as is.
//!
//! Typical usage:
//! ```no_run
//! # use valet_rs::{Interpreter, ObservationQuery, ResponseFormat};
//! let valet = Interpreter::default();
//! let detail = valet.get_series_detail("FXUSDCAD", ResponseFormat::Json)?;
//! let (_series, obs) = valet.get_series_observations("FXUSDCAD", &ObservationQuery::latest(5))?;
//! println!("{} -> {} rows", detail.get(0, "label").unwrap_or(""), obs.len());
//! # Ok::<(), valet_rs::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::models::{GroupListEntry, ObservationQuery, ResponseFormat, SeriesListEntry};
use crate::parse;
use crate::table::Table;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_BASE_URL: &str = "https://www.bankofcanada.ca/valet";

const LOG_TARGET: &str = "valet_rs::api";

// Allow -, _, . unescaped in identifiers (series names use _ and .)
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

fn enc_join<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(|s| percent_encoding::utf8_percent_encode(s.trim(), SAFE).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn check_names(names: &[&str]) -> Result<()> {
    if names.is_empty() || names.iter().any(|n| n.trim().is_empty()) {
        return Err(Error::InvalidArgument(
            "series/group names must be non-empty".into(),
        ));
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Catalog {
    Series,
    Groups,
}

impl Catalog {
    fn segment(self) -> &'static str {
        match self {
            Catalog::Series => "series",
            Catalog::Groups => "groups",
        }
    }

    fn kind(self) -> &'static str {
        match self {
            Catalog::Series => "series",
            Catalog::Groups => "group",
        }
    }
}

/// Valet client: base URL, HTTP client, optional logging hook and the two catalog caches.
pub struct Interpreter {
    base_url: String,
    http: HttpClient,
    logger: Option<Arc<dyn log::Log>>,
    catalog_check: bool,
    series_list: OnceCell<Table>,
    groups_list: OnceCell<Table>,
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("base_url", &self.base_url)
            .field("logger", &self.logger.is_some())
            .field("catalog_check", &self.catalog_check)
            .field("series_cached", &self.series_list.get().is_some())
            .field("groups_cached", &self.groups_list.get().is_some())
            .finish()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter against the public Valet endpoint.
    ///
    /// # Panics
    /// If the TLS backend cannot be initialised, like `reqwest::blocking::Client::new`.
    pub fn new() -> Self {
        let http = HttpClient::builder()
            .redirect(Policy::limited(5)) // cap redirects
            .user_agent(concat!("valet_rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client build");
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            http,
            logger: None,
            catalog_check: false,
            series_list: OnceCell::new(),
            groups_list: OnceCell::new(),
        }
    }

    /// Talk to another host, e.g. a mirror or a local stub. Trailing `/` is ignored.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a preconfigured HTTP client (proxy, TLS or timeout settings).
    pub fn with_http_client(mut self, http: HttpClient) -> Self {
        self.http = http;
        self
    }

    /// Route request/response tracing to `logger` instead of the global `log` facade.
    pub fn with_logger(mut self, logger: Arc<dyn log::Log>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Check names against the cached catalogs before requesting details, observations
    /// or RSS feeds. Costs one catalog fetch on first use.
    pub fn with_catalog_check(mut self, enabled: bool) -> Self {
        self.catalog_check = enabled;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn debug(&self, args: fmt::Arguments<'_>) {
        match &self.logger {
            Some(logger) => {
                let record = log::Record::builder()
                    .args(args)
                    .level(log::Level::Debug)
                    .target(LOG_TARGET)
                    .module_path_static(Some(module_path!()))
                    .build();
                if logger.enabled(record.metadata()) {
                    logger.log(&record);
                }
            }
            None => log::debug!(target: LOG_TARGET, "{args}"),
        }
    }

    /// GET `{base}/{path}` and return the body. Non-2xx becomes `Error::Http`.
    fn get_text(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        resource: &str,
    ) -> Result<String> {
        let url = format!("{}/{}", self.base_url, path);
        self.debug(format_args!("GET {url} {query:?}"));
        let resp = self.http.get(&url).query(query).send()?;
        let status = resp.status();
        self.debug(format_args!("query for {resource} returned {status}"));
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                resource: resource.to_string(),
            });
        }
        Ok(resp.text()?)
    }

    fn cache(&self, catalog: Catalog) -> &OnceCell<Table> {
        match catalog {
            Catalog::Series => &self.series_list,
            Catalog::Groups => &self.groups_list,
        }
    }

    fn list(&self, catalog: Catalog) -> Result<&Table> {
        let cell = self.cache(catalog);
        if let Some(table) = cell.get() {
            return Ok(table);
        }
        let segment = catalog.segment();
        let body = self.get_text(
            &format!("lists/{segment}/{}", ResponseFormat::Json),
            &[],
            &format!("{segment} list"),
        )?;
        let mut table = parse::catalog(&body, ResponseFormat::Json)?;
        self.fill_links(&mut table, segment);
        self.debug(format_args!("there are {} {segment} in this list", table.len()));
        Ok(cell.get_or_init(|| table))
    }

    /// Catalog rows without a link point at their detail endpoint.
    fn fill_links(&self, table: &mut Table, segment: &str) {
        let Some(name_idx) = table.column_index("name") else {
            return;
        };
        let base = &self.base_url;
        table.fill_empty_with("link", |row| {
            format!("{base}/{segment}/{}", enc_join([row[name_idx].as_str()]))
        });
    }

    /// List every series Valet publishes: columns `name`, `label`, `description`, `link`.
    ///
    /// The first successful call fetches `/lists/series/json`; later calls return the
    /// cached table without touching the network.
    pub fn list_series(&self) -> Result<&Table> {
        self.list(Catalog::Series)
    }

    /// List every series group: columns `name`, `label`, `description`, `link`. Cached like
    /// [`Interpreter::list_series`].
    pub fn list_groups(&self) -> Result<&Table> {
        self.list(Catalog::Groups)
    }

    /// Typed view of the cached series list.
    pub fn series_entries(&self) -> Result<Vec<SeriesListEntry>> {
        self.list_series()?.deserialize()
    }

    /// Typed view of the cached groups list.
    pub fn group_entries(&self) -> Result<Vec<GroupListEntry>> {
        self.list_groups()?.deserialize()
    }

    /// Forget both catalogs; the next `list_*` call fetches again.
    pub fn clear_cache(&mut self) {
        self.series_list.take();
        self.groups_list.take();
    }

    fn ensure_listed(&self, catalog: Catalog, names: &[&str]) -> Result<()> {
        check_names(names)?;
        if !self.catalog_check {
            return Ok(());
        }
        let known = self.list(catalog)?.column("name").unwrap_or_default();
        match names.iter().find(|n| !known.contains(&n.trim())) {
            Some(missing) => {
                self.debug(format_args!(
                    "{} '{missing}' does not exist in the current Valet list",
                    catalog.kind()
                ));
                Err(Error::NotFound {
                    kind: catalog.kind(),
                    name: missing.trim().to_string(),
                })
            }
            None => Ok(()),
        }
    }

    /// Details for one series as a single-row table (`name`, `label`, `description`, ...).
    ///
    /// ### Errors
    /// - `Error::Http` (404) when Valet does not know `name`
    /// - `Error::Parse` when the body does not match `format` or holds no single named series
    pub fn get_series_detail(&self, name: &str, format: ResponseFormat) -> Result<Table> {
        self.ensure_listed(Catalog::Series, &[name])?;
        let body = self.get_text(
            &format!("series/{}/{format}", enc_join([name])),
            &[],
            &format!("series/{name}"),
        )?;
        parse::series_detail(&body, format)
    }

    /// Details for one group plus its member series.
    ///
    /// The member table carries a `group` column set to `name` on every row.
    pub fn get_group_detail(&self, name: &str, format: ResponseFormat) -> Result<(Table, Table)> {
        self.ensure_listed(Catalog::Groups, &[name])?;
        let body = self.get_text(
            &format!("groups/{}/{format}", enc_join([name])),
            &[],
            &format!("groups/{name}"),
        )?;
        let (group, series) = parse::group_detail(&body, format)?;
        self.debug(format_args!(
            "the {name} group has {} series contained within it",
            series.len()
        ));
        Ok((group, series.with_constant_column("group", name.trim())))
    }

    /// Observations of one series as JSON: (series detail, observations).
    pub fn get_series_observations(
        &self,
        name: &str,
        query: &ObservationQuery,
    ) -> Result<(Table, Table)> {
        self.get_series_observations_as(name, query, ResponseFormat::Json)
    }

    /// Observations of one series in the given format.
    pub fn get_series_observations_as(
        &self,
        name: &str,
        query: &ObservationQuery,
        format: ResponseFormat,
    ) -> Result<(Table, Table)> {
        self.get_multi_series_observations(&[name], query, format)
    }

    /// Observations of several series in one request; the observations table has one
    /// column per series.
    pub fn get_multi_series_observations(
        &self,
        names: &[&str],
        query: &ObservationQuery,
        format: ResponseFormat,
    ) -> Result<(Table, Table)> {
        let pairs = query.to_query_pairs()?;
        self.ensure_listed(Catalog::Series, names)?;
        let joined = enc_join(names.iter().copied());
        let body = self.get_text(
            &format!("observations/{joined}/{format}"),
            &pairs,
            &format!("observations/{joined}"),
        )?;
        let (detail, obs) = parse::observations(&body, format)?;
        self.debug(format_args!("the {joined} series has {} observations", obs.len()));
        Ok((detail, obs))
    }

    /// Observations of every series in a group as JSON: (series details, observations).
    pub fn get_group_observations(
        &self,
        name: &str,
        query: &ObservationQuery,
    ) -> Result<(Table, Table)> {
        self.get_group_observations_as(name, query, ResponseFormat::Json)
    }

    /// Observations of every series in a group in the given format.
    pub fn get_group_observations_as(
        &self,
        name: &str,
        query: &ObservationQuery,
        format: ResponseFormat,
    ) -> Result<(Table, Table)> {
        let pairs = query.to_query_pairs()?;
        self.ensure_listed(Catalog::Groups, &[name])?;
        let body = self.get_text(
            &format!("observations/group/{}/{format}", enc_join([name])),
            &pairs,
            &format!("observations/group/{name}"),
        )?;
        let (detail, obs) = parse::observations(&body, format)?;
        self.debug(format_args!("the {name} group has {} observations", obs.len()));
        Ok((detail, obs))
    }

    /// Raw RSS feed of one FX series.
    pub fn get_fx_rss(&self, series_name: &str) -> Result<String> {
        self.get_fx_rss_multi(&[series_name])
    }

    /// Raw RSS feed covering several FX series.
    pub fn get_fx_rss_multi(&self, names: &[&str]) -> Result<String> {
        self.ensure_listed(Catalog::Series, names)?;
        let joined = enc_join(names.iter().copied());
        self.get_text(&format!("fx_rss/{joined}"), &[], &format!("fx_rss/{joined}"))
    }
}
