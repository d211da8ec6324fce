use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io;
use std::path::{Path, PathBuf};
use valet_rs::{Interpreter, ObservationQuery, Order, ResponseFormat, Table, storage};

#[derive(Parser, Debug)]
#[command(
    name = "valet",
    version,
    about = "Fetch Bank of Canada Valet series, groups and observations as tables"
)]
struct Cli {
    /// Valet API root.
    #[arg(long, global = true, default_value = valet_rs::api::DEFAULT_BASE_URL)]
    base_url: String,
    /// Log requests and responses (same as RUST_LOG=debug).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every series.
    Series(OutputArgs),
    /// List every series group.
    Groups(OutputArgs),
    /// Details of one series.
    SeriesDetail(DetailArgs),
    /// Details of one group and its member series.
    GroupDetail(DetailArgs),
    /// Observations of one or more series.
    Observations(ObservationArgs),
    /// Observations of every series in a group.
    GroupObservations(ObservationArgs),
    /// Raw RSS feed of one or more FX series.
    FxRss {
        /// Series names (e.g., FXUSDCAD FXEURCAD)
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Wire {
    Json,
    Csv,
    Xml,
}

impl From<Wire> for ResponseFormat {
    fn from(w: Wire) -> Self {
        match w {
            Wire::Json => ResponseFormat::Json,
            Wire::Csv => ResponseFormat::Csv,
            Wire::Xml => ResponseFormat::Xml,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortOrder {
    Asc,
    Desc,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Save results to file instead of printing CSV to stdout.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    save_as: Option<OutFormat>,
}

#[derive(Args, Debug)]
struct DetailArgs {
    /// Series or group name (e.g., FXUSDCAD or FX_RATES_DAILY)
    name: String,
    /// Body format requested from Valet.
    #[arg(long, value_enum, default_value = "json")]
    format: Wire,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct ObservationArgs {
    /// Series names, or a single group name for group-observations.
    #[arg(required = true)]
    names: Vec<String>,
    /// First date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,
    /// Last date (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,
    /// Most recent N observations.
    #[arg(long)]
    recent: Option<u32>,
    #[arg(long)]
    recent_weeks: Option<u32>,
    #[arg(long)]
    recent_months: Option<u32>,
    #[arg(long)]
    recent_years: Option<u32>,
    #[arg(long, value_enum)]
    order: Option<SortOrder>,
    /// Body format requested from Valet.
    #[arg(long, value_enum, default_value = "json")]
    format: Wire,
    /// Also print the series detail table before the observations.
    #[arg(long, default_value_t = false)]
    with_detail: bool,
    #[command(flatten)]
    output: OutputArgs,
}

impl ObservationArgs {
    fn query(&self) -> Result<ObservationQuery> {
        let mut q = match (&self.start, &self.end) {
            (Some(s), Some(e)) => ObservationQuery::between(s, e)?,
            (Some(s), None) => ObservationQuery::default().start_date(parse_day(s)?),
            (None, Some(e)) => ObservationQuery::default().end_date(parse_day(e)?),
            (None, None) => ObservationQuery::default(),
        };
        q.recent = self.recent;
        q.recent_weeks = self.recent_weeks;
        q.recent_months = self.recent_months;
        q.recent_years = self.recent_years;
        q.order_dir = self.order.map(|o| match o {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        });
        // surface combination errors before any request
        q.to_query_pairs()?;
        Ok(q)
    }
}

fn parse_day(s: &str) -> Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let valet = Interpreter::new().with_base_url(&cli.base_url);

    match cli.cmd {
        Command::Series(out) => emit(valet.list_series()?, &out),
        Command::Groups(out) => emit(valet.list_groups()?, &out),
        Command::SeriesDetail(args) => {
            let t = valet.get_series_detail(&args.name, args.format.into())?;
            emit(&t, &args.output)
        }
        Command::GroupDetail(args) => {
            let (group, series) = valet.get_group_detail(&args.name, args.format.into())?;
            eprintln!(
                "{} • {}",
                group.get(0, "name").unwrap_or(args.name.as_str()),
                group.get(0, "label").unwrap_or("")
            );
            emit(&series, &args.output)
        }
        Command::Observations(args) => {
            let names: Vec<&str> = args.names.iter().map(String::as_str).collect();
            let (detail, obs) =
                valet.get_multi_series_observations(&names, &args.query()?, args.format.into())?;
            if args.with_detail {
                storage::write_csv(&detail, io::stdout())?;
            }
            emit(&obs, &args.output)
        }
        Command::GroupObservations(args) => {
            let [name] = args.names.as_slice() else {
                anyhow::bail!("group-observations takes exactly one group name");
            };
            let (detail, obs) =
                valet.get_group_observations_as(name, &args.query()?, args.format.into())?;
            if args.with_detail {
                storage::write_csv(&detail, io::stdout())?;
            }
            emit(&obs, &args.output)
        }
        Command::FxRss { names } => {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            println!("{}", valet.get_fx_rss_multi(&names)?);
            Ok(())
        }
    }
}

fn emit(table: &Table, out: &OutputArgs) -> Result<()> {
    let Some(path) = out.out.as_deref() else {
        return storage::write_csv(table, io::stdout());
    };
    save(table, path, out.save_as)?;
    eprintln!("Saved {} rows to {}", table.len(), path.display());
    Ok(())
}

fn save(table: &Table, path: &Path, save_as: Option<OutFormat>) -> Result<()> {
    let fmt = match save_as {
        Some(OutFormat::Csv) => "csv",
        Some(OutFormat::Json) => "json",
        None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
    }
    .to_ascii_lowercase();
    match fmt.as_str() {
        "csv" => storage::save_csv(table, path),
        "json" => storage::save_json(table, path),
        other => anyhow::bail!("unsupported format: {}", other),
    }
}
