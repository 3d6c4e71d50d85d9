//! Core data types for the hourly observation fetcher.
//!
//! This module defines the shared domain model imported by all other
//! modules — station classification and metadata, resolution results,
//! raw daily tables, and the crate-wide error type. It contains no I/O.

// ---------------------------------------------------------------------------
// Station classification
// ---------------------------------------------------------------------------

/// Observation-end sentinel on the portal meaning "still active".
pub const ACTIVE_END_DATE: &str = "9999/99/99";

/// Station classification on the JMA etrn portal.
///
/// Weather offices (portal type "s") publish the full 17-column hourly
/// table; AMeDAS posts (portal type "a") publish the reduced 8-column
/// table. The two kinds use different endpoints and different column
/// positions for the same logical measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationKind {
    Office,
    Amedas,
}

impl StationKind {
    /// Parses the portal's single-letter type code.
    pub fn from_code(code: &str) -> Option<StationKind> {
        match code {
            "s" => Some(StationKind::Office),
            "a" => Some(StationKind::Amedas),
            _ => None,
        }
    }

    /// The portal's single-letter type code.
    pub fn code(&self) -> &'static str {
        match self {
            StationKind::Office => "s",
            StationKind::Amedas => "a",
        }
    }
}

impl std::fmt::Display for StationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StationKind::Office => write!(f, "office"),
            StationKind::Amedas => write!(f, "amedas"),
        }
    }
}

// ---------------------------------------------------------------------------
// Observatory metadata
// ---------------------------------------------------------------------------

/// Which measurements a station takes, from the portal's "1"/"0" flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub rain: bool,
    pub wind: bool,
    pub temperature: bool,
    pub solar: bool,
    pub snow: bool,
}

/// One station from the observatory catalog.
///
/// Built once by the catalog builder, loaded read-only per run, never
/// mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservatoryRecord {
    pub pref: String,
    pub area: String,
    /// Prefecture-level numeric code used in portal URLs.
    pub prec_no: String,
    /// Station-level numeric code used in portal URLs.
    pub block_no: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_m: f64,
    pub kind: StationKind,
    pub caps: Capabilities,
    /// "YYYY/MM/DD", or [`ACTIVE_END_DATE`] for stations still observing.
    pub end_date: String,
}

impl ObservatoryRecord {
    /// A station is active until the portal publishes an observation-end
    /// date for it.
    pub fn is_active(&self) -> bool {
        self.end_date == ACTIVE_END_DATE
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Immutable result of postal-code resolution, carrying exactly what the
/// fetch stage needs to parameterize its URLs and templates.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStation {
    pub pref: String,
    pub area: String,
    pub prec_no: String,
    pub block_no: String,
    pub kind: StationKind,
}

impl From<&ObservatoryRecord> for ResolvedStation {
    fn from(rec: &ObservatoryRecord) -> Self {
        ResolvedStation {
            pref: rec.pref.clone(),
            area: rec.area.clone(),
            prec_no: rec.prec_no.clone(),
            block_no: rec.block_no.clone(),
            kind: rec.kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw daily tables
// ---------------------------------------------------------------------------

/// The raw rows of one calendar day's table as scraped from the portal,
/// header rows included. Every row is padded to `column_count` so that
/// positional access never goes out of bounds; cells the page leaves
/// blank are empty strings.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTable {
    pub column_count: usize,
    pub rows: Vec<Vec<String>>,
}

impl DailyTable {
    /// Builds a table from extracted rows, padding every row to the
    /// widest row's cell count.
    pub fn new(rows: Vec<Vec<String>>) -> DailyTable {
        let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(column_count, String::new());
                row
            })
            .collect();
        DailyTable { column_count, rows }
    }

    /// Data rows below the header block.
    pub fn data_rows(&self, start_row: usize) -> &[Vec<String>] {
        if start_row >= self.rows.len() {
            &[]
        } else {
            &self.rows[start_row..]
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Everything that can abort a run.
///
/// Schema drift is deliberately absent: a table that does not match its
/// template only disables friendly header naming and is reported through
/// the log, not through this type.
#[derive(Debug)]
pub enum WeatherError {
    /// Malformed or missing CLI input. Raised before any network I/O.
    Argument(String),
    /// The observatory catalog file is missing or unreadable; the caller
    /// may rebuild it once and retry.
    CatalogUnavailable(String),
    /// The geocoding service errored or returned no usable coordinates
    /// for a postal code (e.g. an unassigned one).
    Geocode { postal: String, reason: String },
    /// Every fallback candidate for a postal code failed.
    ResolutionExhausted { attempts: u32, last_candidate: String },
    /// Transport failure on a portal page, after the single retry.
    Fetch { url: String, reason: String },
    /// The active-station subset is empty, so nearest-lookup is undefined.
    EmptyIndex,
    /// A fetched data row could not be interpreted (non-numeric hour
    /// label where one is required).
    Table(String),
    Io(std::io::Error),
    Csv(csv::Error),
}

impl WeatherError {
    /// Process exit code: argument errors exit 1 before any I/O, every
    /// runtime failure exits 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            WeatherError::Argument(_) => 1,
            _ => 2,
        }
    }
}

impl std::fmt::Display for WeatherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherError::Argument(msg) => write!(f, "argument error: {}", msg),
            WeatherError::CatalogUnavailable(msg) => {
                write!(f, "observatory catalog unavailable: {}", msg)
            }
            WeatherError::Geocode { postal, reason } => {
                write!(f, "geocoding failed for postal code {}: {}", postal, reason)
            }
            WeatherError::ResolutionExhausted { attempts, last_candidate } => write!(
                f,
                "postal resolution exhausted after {} attempts (last candidate {})",
                attempts, last_candidate
            ),
            WeatherError::Fetch { url, reason } if url.is_empty() => {
                write!(f, "fetch failed: {}", reason)
            }
            WeatherError::Fetch { url, reason } => {
                write!(f, "fetch failed for {}: {}", url, reason)
            }
            WeatherError::EmptyIndex => {
                write!(f, "no active temperature stations in the catalog")
            }
            WeatherError::Table(msg) => write!(f, "malformed table data: {}", msg),
            WeatherError::Io(err) => write!(f, "I/O error: {}", err),
            WeatherError::Csv(err) => write!(f, "CSV error: {}", err),
        }
    }
}

impl std::error::Error for WeatherError {}

impl From<std::io::Error> for WeatherError {
    fn from(err: std::io::Error) -> Self {
        WeatherError::Io(err)
    }
}

impl From<csv::Error> for WeatherError {
    fn from(err: csv::Error) -> Self {
        WeatherError::Csv(err)
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        WeatherError::Fetch {
            url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            reason: err.to_string(),
        }
    }
}
