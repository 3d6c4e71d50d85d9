//! Hourly observation pages on the etrn portal.
//!
//! One page per station and day. Weather offices and AMeDAS posts use
//! different endpoints and layouts; both embed the measurements as the
//! first data table in the page. Hours run "1" through "24" — the
//! portal writes the next day's midnight as hour 24 of the current day,
//! which the assembler folds back later.

use chrono::{Datelike, NaiveDate};
use scraper::{Html, Selector};

use super::RetryPolicy;
use crate::logging::Logger;
use crate::model::{DailyTable, StationKind, WeatherError};
use crate::schema::{self, template_for};

pub const HOURLY_BASE_URL: &str = "https://www.data.jma.go.jp/obd/stats/etrn/view";

/// Fetches daily tables for one resolved station.
pub struct HourlyClient<'a> {
    client: &'a reqwest::blocking::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl<'a> HourlyClient<'a> {
    pub fn new(
        client: &'a reqwest::blocking::Client,
        base_url: &str,
        retry: RetryPolicy,
    ) -> Self {
        HourlyClient { client, base_url: base_url.to_string(), retry }
    }

    /// Page URL for one station-day. Month and day are unpadded, the
    /// way the portal's own links write them.
    pub fn day_url(
        &self,
        kind: StationKind,
        prec_no: &str,
        block_no: &str,
        date: NaiveDate,
    ) -> String {
        format!(
            "{}/{}?prec_no={}&block_no={}&year={}&month={}&day={}&view=p1",
            self.base_url,
            template_for(kind).endpoint,
            prec_no,
            block_no,
            date.year(),
            date.month(),
            date.day()
        )
    }

    /// Fetches one day's table. A transport failure (or a page with no
    /// data table) gets exactly one retry after the policy's pause; the
    /// second failure is fatal for the whole run.
    pub fn fetch_day(
        &self,
        kind: StationKind,
        prec_no: &str,
        block_no: &str,
        date: NaiveDate,
        log: &Logger,
    ) -> Result<DailyTable, WeatherError> {
        let url = self.day_url(kind, prec_no, block_no, date);
        self.retry.run(
            || {
                let body = super::get_text(self.client, &url)?;
                extract_first_table(&body).ok_or_else(|| WeatherError::Fetch {
                    url: url.clone(),
                    reason: "no data table in page".to_string(),
                })
            },
            |err| {
                log.warn(&format!("failed to get data of {}: {}", date, err));
                log.warn(&format!("retry getting data of {}.", date));
            },
        )
    }
}

/// Pulls the first embedded data table out of a portal page. The data
/// table carries the `data2_s` class on etrn pages; when that is absent
/// the first `<table>` is taken, mirroring a first-table scrape.
pub fn extract_first_table(html: &str) -> Option<DailyTable> {
    let document = Html::parse_document(html);
    let data_table = Selector::parse("table.data2_s").expect("CSS selector should be valid");
    let any_table = Selector::parse("table").expect("CSS selector should be valid");
    let table = document
        .select(&data_table)
        .next()
        .or_else(|| document.select(&any_table).next())?;

    let tr = Selector::parse("tr").expect("CSS selector should be valid");
    let cell = Selector::parse("th, td").expect("CSS selector should be valid");
    let mut rows = Vec::new();
    for row in table.select(&tr) {
        let cells: Vec<String> = row.select(&cell).map(cell_text).collect();
        if !cells.is_empty() {
            rows.push(cells);
        }
    }
    if rows.is_empty() {
        return None;
    }
    Some(DailyTable::new(rows))
}

/// Collapses a cell's text nodes into one whitespace-normalized string.
fn cell_text(cell: scraper::ElementRef<'_>) -> String {
    cell.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Checks a fetched table against the station kind's template. Drift is
/// not fatal — it only disables friendly header naming — so the first
/// difference is logged and a flag comes back.
pub fn validate(table: &DailyTable, kind: StationKind, start_row: usize, log: &Logger) -> bool {
    match schema::template_for(kind).matches(table, start_row) {
        Ok(()) => true,
        Err(reason) => {
            log.warn(&format!("{} table layout differs from template: {}", kind, reason));
            false
        }
    }
}
