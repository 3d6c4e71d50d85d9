//! CLI entry point.
//!
//! Argument validation happens before any network I/O and exits 1;
//! runtime failures exit 2 and leave the preserved run log behind. A
//! successful run (including the skip when the output file already
//! exists) removes its log.

use std::path::{Path, PathBuf};
use std::process;
use std::thread;

use chrono::{Days, NaiveDate};
use clap::Parser;

use jma_hourly::assemble::{self, DateRange};
use jma_hourly::catalog::{self, ObservatoryIndex};
use jma_hourly::config::{Config, DEFAULT_CONFIG_PATH};
use jma_hourly::ingest::geocode::HeartRailsGeocoder;
use jma_hourly::ingest::hourly::{self, HourlyClient};
use jma_hourly::ingest::{self, RetryPolicy};
use jma_hourly::logging::Logger;
use jma_hourly::model::{StationKind, WeatherError};
use jma_hourly::output;
use jma_hourly::resolve::PostalResolver;
use jma_hourly::schema;

const COMMAND: &str = "jma_hourly";

#[derive(Parser, Debug)]
#[command(
    name = "jma_hourly",
    version,
    about = "Fetches hourly JMA observations for the station nearest a postal code"
)]
struct Args {
    /// 7-digit postal code.
    postal_code: String,
    /// "check", "all", or an "officeCol,amedasCol" pair of 0-based
    /// column indices (column 0 is the hour; the resolved station's
    /// kind picks which index of the pair applies).
    mode: String,
    /// Output directory; must already exist.
    out_dir: PathBuf,
    /// Start date, YYYYMMDD. Ignored in check mode.
    start_date: Option<String>,
    /// End date, YYYYMMDD. Ignored in check mode.
    end_date: Option<String>,
    /// First data row of the scraped tables (rows above are headers).
    start_row: Option<usize>,
    /// Config file path.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

/// What the validated command line asks for.
enum Action {
    /// Resolve only, emit the station identity.
    Check,
    Series {
        /// None keeps every column; Some holds the (office, amedas)
        /// target pair.
        columns: Option<(usize, usize)>,
        start_date: String,
        end_date: String,
        range: DateRange,
        start_row: usize,
    },
}

struct Request {
    postal: String,
    out_dir: PathBuf,
    action: Action,
}

fn main() {
    let args = Args::parse();
    let context = std::env::args().collect::<Vec<_>>().join(" ");
    let log = match Logger::open(COMMAND, &context) {
        Ok(log) => log,
        Err(err) => {
            eprintln!("failed to open run log: {}", err);
            process::exit(2);
        }
    };
    log.info("start process.");

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(err) => abort(log, &Config::default().log_dir, err),
    };

    log.info("start checking arguments.");
    let request = match validate(&args) {
        Ok(request) => request,
        Err(err) => abort(log, &config.log_dir, err),
    };
    log.info("end checking arguments.");

    match run(&request, &config, &log) {
        Ok(()) => {
            log.info("end process.");
            log.discard();
        }
        Err(err) => abort(log, &config.log_dir, err),
    }
}

fn abort(log: Logger, log_dir: &Path, err: WeatherError) -> ! {
    let code = err.exit_code();
    log.error(&err.to_string());
    if let Err(preserve_err) = log.preserve(log_dir) {
        eprintln!("failed to preserve run log: {}", preserve_err);
    }
    process::exit(code);
}

// ---------------------------------------------------------------------------
// Argument validation
// ---------------------------------------------------------------------------

fn validate(args: &Args) -> Result<Request, WeatherError> {
    let argument = |msg: &str| WeatherError::Argument(msg.to_string());

    if args.postal_code.len() != 7 || !args.postal_code.chars().all(|c| c.is_ascii_digit()) {
        return Err(argument("postal code must be exactly 7 digits"));
    }
    if !args.out_dir.is_dir() {
        return Err(argument("output directory does not exist"));
    }

    if args.mode == "check" {
        return Ok(Request {
            postal: args.postal_code.clone(),
            out_dir: args.out_dir.clone(),
            action: Action::Check,
        });
    }

    let columns = if args.mode == "all" {
        None
    } else {
        let parts: Vec<&str> = args.mode.split(',').collect();
        let [office, amedas] = parts.as_slice() else {
            return Err(argument(
                "mode must be \"check\", \"all\", or two comma-separated column indices",
            ));
        };
        let office: usize =
            office.trim().parse().map_err(|_| argument("office column index is not a number"))?;
        let amedas: usize =
            amedas.trim().parse().map_err(|_| argument("amedas column index is not a number"))?;
        Some((office, amedas))
    };

    let start_date =
        args.start_date.clone().ok_or_else(|| argument("start date is required"))?;
    let end_date = args.end_date.clone().ok_or_else(|| argument("end date is required"))?;
    let start = NaiveDate::parse_from_str(&start_date, "%Y%m%d")
        .map_err(|_| argument("start date is not YYYYMMDD"))?;
    let end = NaiveDate::parse_from_str(&end_date, "%Y%m%d")
        .map_err(|_| argument("end date is not YYYYMMDD"))?;

    let start_row = args.start_row.ok_or_else(|| argument("start row is required"))?;
    if start_row < 1 {
        return Err(argument("start row must be at least 1"));
    }

    Ok(Request {
        postal: args.postal_code.clone(),
        out_dir: args.out_dir.clone(),
        action: Action::Series {
            columns,
            start_date,
            end_date,
            range: DateRange { start, end },
            start_row,
        },
    })
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

fn run(request: &Request, config: &Config, log: &Logger) -> Result<(), WeatherError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(config.http_timeout())
        .build()?;

    let index = load_or_rebuild_catalog(&client, config, log)?;

    log.info("start getting postal code data.");
    let geocoder = HeartRailsGeocoder::with_base_url(&client, &config.geocode_base_url);
    let resolver =
        PostalResolver::new(&geocoder, &index).with_retry_delay(config.request_delay());
    let (resolved_code, station) = resolver.resolve(&request.postal, log)?;
    log.info(&format!(
        "acquired postal code {}, nearest station: {} {} (prec_no {}, block_no {}, {})",
        resolved_code, station.pref, station.area, station.prec_no, station.block_no, station.kind
    ));
    log.info("end getting postal code data.");

    let Action::Series { columns, start_date, end_date, range, start_row } = &request.action
    else {
        log.info("start output file.");
        let path = output::check_file(&request.out_dir, &request.postal);
        output::write_check(&path, &resolved_code, &station.pref, &station.area)?;
        log.info("end output file.");
        return Ok(());
    };

    let template = schema::template_for(station.kind);
    let (target, tag) = match columns {
        None => (None, "all".to_string()),
        Some((office, amedas)) => {
            let column = match station.kind {
                StationKind::Office => *office,
                StationKind::Amedas => *amedas,
            };
            (Some(column), column.to_string())
        }
    };

    let out_file = output::series_file(
        &request.out_dir,
        &station.pref,
        &station.area,
        &tag,
        start_date,
        end_date,
    );
    if out_file.exists() {
        log.warn("output file already exists.");
        return Ok(());
    }

    // One lookback day so the prior day's hour-24 row can supply the
    // start day's midnight.
    let lookback = range
        .start
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| WeatherError::Argument("start date is too early".to_string()))?;

    log.info("start getting weather data.");
    let fetcher = HourlyClient::new(
        &client,
        &config.hourly_base_url,
        RetryPolicy::once_after(config.request_delay()),
    );
    let mut schema_ok = true;
    let mut days = Vec::new();
    let mut day = lookback;
    while day <= range.end {
        let table =
            fetcher.fetch_day(station.kind, &station.prec_no, &station.block_no, day, log)?;
        schema_ok &= hourly::validate(&table, station.kind, *start_row, log);
        days.push((day, table));
        log.info(&format!("getting data of {} done.", day));
        thread::sleep(config.request_delay());
        day = day
            .checked_add_days(Days::new(1))
            .ok_or_else(|| WeatherError::Table("date overflow".to_string()))?;
    }
    log.info("end getting weather data.");

    log.info("start processing data.");
    let series = assemble::assemble(&days, *start_row, target, *range, template, schema_ok)?;
    log.info("end processing data.");

    log.info("start output file.");
    output::write_series(&out_file, &series)?;
    log.info("end output file.");
    Ok(())
}

/// Loads the catalog, rebuilding it once through the portal's station
/// pages when the file is missing or unreadable.
fn load_or_rebuild_catalog(
    client: &reqwest::blocking::Client,
    config: &Config,
    log: &Logger,
) -> Result<ObservatoryIndex, WeatherError> {
    match ObservatoryIndex::load(&config.catalog_dir) {
        Ok(index) => Ok(index),
        Err(err @ WeatherError::CatalogUnavailable(_)) => {
            log.warn(&err.to_string());
            log.warn("try (re)creating the observatory catalog.");
            let records = ingest::select::build_catalog(
                client,
                &config.select_base_url,
                config.request_delay(),
                RetryPolicy::once_after(config.request_delay()),
                log,
            )?;
            catalog::write_catalog(&config.catalog_dir, &records)?;
            log.info(&format!("catalog rebuilt with {} stations.", records.len()));
            ObservatoryIndex::load(&config.catalog_dir)
        }
        Err(err) => Err(err),
    }
}
