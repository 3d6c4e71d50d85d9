//! Station catalog pages on the etrn portal.
//!
//! The portal's station picker is a clickable map: a master page whose
//! `<area>` elements link one prefecture each, then one page per
//! prefecture whose `<area>` elements carry the station metadata inside
//! an `onmouseover="javascript:viewPoint(...)"` payload. The builder
//! walks all of it sequentially and emits `ObservatoryRecord`s.

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use scraper::{Html, Selector};

use super::RetryPolicy;
use crate::logging::Logger;
use crate::model::{Capabilities, ObservatoryRecord, StationKind, WeatherError};

pub const SELECT_BASE_URL: &str = "https://www.data.jma.go.jp/obd/stats/etrn/select";

/// Scrapes the full station catalog: master page first (with the single
/// retry), then one page per prefecture with the courtesy pause between
/// requests. Duplicate map regions pointing at the same station are
/// dropped.
pub fn build_catalog(
    client: &reqwest::blocking::Client,
    base_url: &str,
    delay: Duration,
    retry: RetryPolicy,
    log: &Logger,
) -> Result<Vec<ObservatoryRecord>, WeatherError> {
    let master_url = format!(
        "{}/prefecture00.php?prec_no=&block_no=&year=&month=&day=&view=",
        base_url
    );
    let master = retry.run(
        || super::get_text(client, &master_url),
        |err| {
            log.warn(&format!("failed scraping station master page: {}", err));
            log.warn("retry scraping station master page.");
        },
    )?;

    let prefectures = parse_prefecture_links(&master);
    log.info(&format!("found {} prefecture pages.", prefectures.len()));

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for (pref, prec_no) in prefectures {
        let url = format!(
            "{}/prefecture.php?prec_no={}&block_no=&year=&month=&day=&view=",
            base_url, prec_no
        );
        let page = super::get_text(client, &url)?;
        for record in parse_station_areas(&page, &pref, &prec_no) {
            let key = format!(
                "{}|{}|{}|{}|{}|{}",
                record.pref,
                record.area,
                record.prec_no,
                record.block_no,
                record.kind.code(),
                record.end_date
            );
            if seen.insert(key) {
                records.push(record);
            }
        }
        thread::sleep(delay);
    }
    Ok(records)
}

/// (prefecture name, prec_no) pairs from the master map page.
pub fn parse_prefecture_links(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let area = Selector::parse("area").expect("CSS selector should be valid");
    let mut links = Vec::new();
    for element in document.select(&area) {
        let Some(alt) = element.value().attr("alt") else { continue };
        let Some(prec_no) = query_value(element.value().attr("href").unwrap_or(""), "prec_no=")
        else {
            continue;
        };
        links.push((alt.to_string(), prec_no));
    }
    links
}

/// Stations from one prefecture page. Map regions without a parseable
/// `viewPoint` payload (prefecture navigation arrows, unknown station
/// types) are skipped, as are payloads that fail numeric parsing.
pub fn parse_station_areas(html: &str, pref: &str, prec_no: &str) -> Vec<ObservatoryRecord> {
    let document = Html::parse_document(html);
    let area = Selector::parse("area").expect("CSS selector should be valid");
    let mut records = Vec::new();
    for element in document.select(&area) {
        let Some(alt) = element.value().attr("alt") else { continue };
        let Some(block_no) = query_value(element.value().attr("href").unwrap_or(""), "block_no=")
        else {
            continue;
        };
        let Some(payload) = element.value().attr("onmouseover") else { continue };
        let Some(parsed) = parse_view_point(payload) else { continue };
        records.push(ObservatoryRecord {
            pref: pref.to_string(),
            area: alt.to_string(),
            prec_no: prec_no.to_string(),
            block_no,
            latitude: parsed.latitude,
            longitude: parsed.longitude,
            elevation_m: parsed.elevation_m,
            kind: parsed.kind,
            caps: parsed.caps,
            end_date: parsed.end_date,
        });
    }
    records
}

fn query_value(href: &str, key: &str) -> Option<String> {
    let tail = href.split(key).nth(1)?;
    let value = tail.split('&').next()?;
    if value.is_empty() { None } else { Some(value.to_string()) }
}

struct ViewPointFields {
    kind: StationKind,
    latitude: f64,
    longitude: f64,
    elevation_m: f64,
    caps: Capabilities,
    end_date: String,
}

/// Decodes a `javascript:viewPoint('s','47662','東京',...)` payload.
///
/// Field layout, splitting on `','`:
///   0  "javascript:viewPoint('s"   (kind after the first quote)
///   4  latitude degrees            5  latitude minutes
///   6  longitude degrees           7  longitude minutes
///   8  elevation (m)
///   9-13  rain / wind / temperature / solar / snow flags
///   14-16 observation end year / month / day
fn parse_view_point(payload: &str) -> Option<ViewPointFields> {
    let fields: Vec<&str> = payload.split("','").collect();
    if fields.len() < 17 {
        return None;
    }
    let kind = StationKind::from_code(fields[0].split('\'').nth(1)?)?;

    let lat_deg: f64 = fields[4].parse().ok()?;
    let lat_min: f64 = fields[5].parse().ok()?;
    let lon_deg: f64 = fields[6].parse().ok()?;
    let lon_min: f64 = fields[7].parse().ok()?;
    let elevation_m: f64 = fields[8].parse().ok()?;

    Some(ViewPointFields {
        kind,
        latitude: lat_deg + lat_min / 60.0,
        longitude: lon_deg + lon_min / 60.0,
        elevation_m,
        caps: Capabilities {
            rain: fields[9] == "1",
            wind: fields[10] == "1",
            temperature: fields[11] == "1",
            solar: fields[12] == "1",
            snow: fields[13] == "1",
        },
        end_date: format!(
            "{}/{}/{}",
            fields[14],
            fields[15],
            fields[16].trim_end_matches(|c: char| !c.is_ascii_digit())
        ),
    })
}
