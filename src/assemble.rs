//! Stitches per-day tables into one normalized hourly series.
//!
//! The portal writes the next day's midnight as hour "24" of the
//! current day. To cover hour 0 of the first requested day, fetching
//! starts one calendar day early; assembly then reassigns every hour-24
//! row to hour 0 of the following day, filters back down to the
//! requested range, and normalizes the portal's symbol vocabulary into
//! plain strings. Assembly itself is pure — it sees only pre-fetched
//! tables — so the whole pipeline is deterministic for a given input.

use chrono::{Days, NaiveDate, NaiveDateTime};

use crate::model::{DailyTable, WeatherError};
use crate::schema::TableTemplate;

/// Inclusive date range selected for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One output row: a timestamp plus the selected measurement cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRow {
    pub timestamp: NaiveDateTime,
    pub values: Vec<String>,
}

/// The final normalized series, ascending by timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledSeries {
    pub headers: Vec<String>,
    pub rows: Vec<SeriesRow>,
}

struct PendingRow {
    date: NaiveDate,
    hour: String,
    values: Vec<String>,
}

/// Assembles daily tables into the output series.
///
/// `days` is the fetched sequence in request order (lookback day
/// first). `target_column` selects one measurement column (the hour
/// column always rides along); `None` keeps every column. Friendly
/// header names apply only when every column was kept and every fetched
/// day matched the template (`schema_ok`).
pub fn assemble(
    days: &[(NaiveDate, DailyTable)],
    start_row: usize,
    target_column: Option<usize>,
    range: DateRange,
    template: &TableTemplate,
    schema_ok: bool,
) -> Result<AssembledSeries, WeatherError> {
    // Column selection, with the request date attached to every row.
    let mut pending: Vec<PendingRow> = Vec::new();
    for (date, table) in days {
        for row in table.data_rows(start_row) {
            let cells: Vec<String> = match target_column {
                None => row.clone(),
                Some(target) => vec![
                    row.first().cloned().unwrap_or_default(),
                    row.get(target).cloned().unwrap_or_default(),
                ],
            };
            let mut cells = cells.into_iter();
            let hour = cells.next().unwrap_or_default();
            pending.push(PendingRow { date: *date, hour, values: cells.collect() });
        }
    }

    // Hour-24 rollover: converted copies go to the end, then the
    // originals drop, so a raw hour-0 row for the next day keeps its
    // place ahead of the converted one through the stable sort.
    let mut converted = Vec::new();
    for row in pending.iter().filter(|r| r.hour == "24") {
        let date = row
            .date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| WeatherError::Table(format!("date overflow after {}", row.date)))?;
        converted.push(PendingRow { date, hour: "0".to_string(), values: row.values.clone() });
    }
    pending.extend(converted);
    pending.retain(|r| r.hour != "24");

    // Range filter on the derived date, then date+hour into one
    // timestamp.
    pending.retain(|r| r.date >= range.start && r.date <= range.end);

    let mut rows = Vec::with_capacity(pending.len());
    for row in pending {
        let hour: u32 = row
            .hour
            .parse()
            .map_err(|_| WeatherError::Table(format!("unexpected hour label {:?}", row.hour)))?;
        let timestamp = row
            .date
            .and_hms_opt(hour, 0, 0)
            .ok_or_else(|| WeatherError::Table(format!("hour {} out of range", hour)))?;
        rows.push(SeriesRow { timestamp, values: row.values });
    }
    rows.sort_by_key(|r| r.timestamp);

    // Symbol normalization, and uniform width for the CSV writer.
    let width = rows.iter().map(|r| r.values.len()).max().unwrap_or_else(|| {
        match target_column {
            None => template.column_count.saturating_sub(1),
            Some(_) => 1,
        }
    });
    for row in &mut rows {
        row.values.resize(width, String::new());
        for value in &mut row.values {
            *value = normalize_cell(value);
        }
    }

    let headers = build_headers(target_column, schema_ok, template, width);
    Ok(AssembledSeries { headers, rows })
}

/// Normalizes one cell: the portal's symbol vocabulary collapses to
/// plain numbers or empty strings, and stray scrape artifacts are
/// stripped.
///
///   "--"  no phenomenon        -> "0"
///   "0+"  rounds to zero       -> "0"
///   "10-" just under ten       -> "10"
///   "×" "///" "#" "*" missing  -> ""
fn normalize_cell(raw: &str) -> String {
    match raw {
        "--" | "0+" => "0".to_string(),
        "10-" => "10".to_string(),
        "×" | "///" | "#" | "*" => String::new(),
        other => other.replace(" ]", "").replace(" )", ""),
    }
}

fn build_headers(
    target_column: Option<usize>,
    schema_ok: bool,
    template: &TableTemplate,
    width: usize,
) -> Vec<String> {
    match target_column {
        None if schema_ok => template.output_columns.iter().map(|s| s.to_string()).collect(),
        // Positional labels keep the source column indices: the hour
        // column was folded into the timestamp, so values start at 1.
        None => std::iter::once("日時".to_string())
            .chain((1..=width).map(|i| i.to_string()))
            .collect(),
        Some(target) => vec!["日時".to_string(), target.to_string()],
    }
}
