//! Observatory catalog: persistence and nearest-station lookup.
//!
//! The catalog builder writes two CSV files into the catalog directory:
//! the full station table, and the "active temperature stations" subset
//! that resolution searches. The subset file keeps only the identifying
//! columns — capability flags and end date are dropped because every row
//! in it already passed the temperature/active filter.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geo;
use crate::model::{
    Capabilities, ObservatoryRecord, StationKind, WeatherError, ACTIVE_END_DATE,
};

/// Full catalog file name inside the catalog directory.
pub const CATALOG_ALL_FILE: &str = "area_catalog_all.csv";

/// Active-temperature subset file name; this is what resolution loads.
pub const CATALOG_ACTIVE_FILE: &str = "area_catalog_temp_active.csv";

// ---------------------------------------------------------------------------
// CSV row shapes
// ---------------------------------------------------------------------------

/// Row of the full catalog file. Flags stay "1"/"0" strings on disk,
/// matching what the portal's map pages carry.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogRow {
    pref: String,
    area: String,
    prec_no: String,
    block_no: String,
    latitude: f64,
    longitude: f64,
    elevation_m: f64,
    kind: String,
    rain: String,
    wind: String,
    temperature: String,
    solar: String,
    snow: String,
    end_date: String,
}

/// Row of the active-subset file: the first seven logical columns only.
#[derive(Debug, Serialize, Deserialize)]
struct ActiveRow {
    pref: String,
    area: String,
    prec_no: String,
    block_no: String,
    latitude: f64,
    longitude: f64,
    elevation_m: f64,
    kind: String,
}

fn flag(b: bool) -> String {
    if b { "1".to_string() } else { "0".to_string() }
}

impl From<&ObservatoryRecord> for CatalogRow {
    fn from(rec: &ObservatoryRecord) -> Self {
        CatalogRow {
            pref: rec.pref.clone(),
            area: rec.area.clone(),
            prec_no: rec.prec_no.clone(),
            block_no: rec.block_no.clone(),
            latitude: rec.latitude,
            longitude: rec.longitude,
            elevation_m: rec.elevation_m,
            kind: rec.kind.code().to_string(),
            rain: flag(rec.caps.rain),
            wind: flag(rec.caps.wind),
            temperature: flag(rec.caps.temperature),
            solar: flag(rec.caps.solar),
            snow: flag(rec.caps.snow),
            end_date: rec.end_date.clone(),
        }
    }
}

impl From<&ObservatoryRecord> for ActiveRow {
    fn from(rec: &ObservatoryRecord) -> Self {
        ActiveRow {
            pref: rec.pref.clone(),
            area: rec.area.clone(),
            prec_no: rec.prec_no.clone(),
            block_no: rec.block_no.clone(),
            latitude: rec.latitude,
            longitude: rec.longitude,
            elevation_m: rec.elevation_m,
            kind: rec.kind.code().to_string(),
        }
    }
}

impl ActiveRow {
    /// Rebuilds a record from the subset file. Flags beyond temperature
    /// are not carried by that file; rows in it are active temperature
    /// stations by construction.
    fn into_record(self) -> Result<ObservatoryRecord, String> {
        let kind = StationKind::from_code(&self.kind)
            .ok_or_else(|| format!("unexpected station kind {:?}", self.kind))?;
        Ok(ObservatoryRecord {
            pref: self.pref,
            area: self.area,
            prec_no: self.prec_no,
            block_no: self.block_no,
            latitude: self.latitude,
            longitude: self.longitude,
            elevation_m: self.elevation_m,
            kind,
            caps: Capabilities { temperature: true, ..Default::default() },
            end_date: ACTIVE_END_DATE.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Writes both catalog files. The subset file keeps rows whose
/// temperature flag is set and whose end date is the active sentinel.
pub fn write_catalog(dir: &Path, records: &[ObservatoryRecord]) -> Result<(), WeatherError> {
    let mut all = csv::Writer::from_path(dir.join(CATALOG_ALL_FILE))?;
    for rec in records {
        all.serialize(CatalogRow::from(rec))?;
    }
    all.flush()?;

    let mut active = csv::Writer::from_path(dir.join(CATALOG_ACTIVE_FILE))?;
    for rec in records.iter().filter(|r| r.caps.temperature && r.is_active()) {
        active.serialize(ActiveRow::from(rec))?;
    }
    active.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

/// In-memory station table with lookup-by-nearest.
#[derive(Debug)]
pub struct ObservatoryIndex {
    records: Vec<ObservatoryRecord>,
}

impl ObservatoryIndex {
    /// Loads the active-subset file from the catalog directory. Any
    /// failure — missing file, malformed row, unknown kind — reports as
    /// `CatalogUnavailable` so the caller can rebuild and retry.
    pub fn load(dir: &Path) -> Result<ObservatoryIndex, WeatherError> {
        let path = dir.join(CATALOG_ACTIVE_FILE);
        let unavailable =
            |reason: String| WeatherError::CatalogUnavailable(format!("{}: {}", path.display(), reason));

        let mut reader =
            csv::Reader::from_path(&path).map_err(|e| unavailable(e.to_string()))?;
        let mut records = Vec::new();
        for row in reader.deserialize::<ActiveRow>() {
            let row = row.map_err(|e| unavailable(e.to_string()))?;
            records.push(row.into_record().map_err(unavailable)?);
        }
        Ok(ObservatoryIndex { records })
    }

    /// Index over records already in memory (catalog builder output,
    /// tests).
    pub fn from_records(records: Vec<ObservatoryRecord>) -> ObservatoryIndex {
        ObservatoryIndex { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The only subset resolution may search: temperature-observing
    /// stations that are still active.
    pub fn active_temperature_stations(&self) -> impl Iterator<Item = &ObservatoryRecord> {
        self.records
            .iter()
            .filter(|r| r.caps.temperature && r.is_active())
    }

    /// Nearest active temperature station to `point` (latitude,
    /// longitude). Strict `<` keeps the first record in load order on
    /// exact ties, so the result is deterministic for a deterministic
    /// input order.
    pub fn nearest(&self, point: (f64, f64)) -> Result<&ObservatoryRecord, WeatherError> {
        let mut best: Option<(&ObservatoryRecord, f64)> = None;
        for rec in self.active_temperature_stations() {
            let d = geo::distance(point, rec.coords());
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((rec, d)),
            }
        }
        best.map(|(rec, _)| rec).ok_or(WeatherError::EmptyIndex)
    }
}
