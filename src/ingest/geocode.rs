//! HeartRails GeoAPI postal geocoder.
//!
//! `searchByPostal` returns the localities covered by a postal code as
//! XML; each location carries `x` (longitude) and `y` (latitude). A
//! payload without both coordinates means the code is unassigned, which
//! feeds the resolver's coarsening fallback rather than aborting.

use serde::Deserialize;

use crate::model::WeatherError;
use crate::resolve::PostalGeocoder;

pub const GEOCODE_BASE_URL: &str = "http://geoapi.heartrails.com/api/xml";

// ---------------------------------------------------------------------------
// Response payload
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(rename = "location", default)]
    locations: Vec<GeoLocation>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeoLocation {
    /// Longitude.
    #[serde(default)]
    x: Option<f64>,
    /// Latitude.
    #[serde(default)]
    y: Option<f64>,
}

/// Extracts (latitude, longitude) from the API payload. Public so the
/// parsing contract can be exercised against canned payloads without a
/// network.
pub fn parse_response(xml: &str) -> Result<(f64, f64), String> {
    let parsed: GeoResponse =
        quick_xml::de::from_str(xml).map_err(|e| format!("malformed XML: {}", e))?;
    if let Some(message) = parsed.error {
        return Err(format!("service error: {}", message));
    }
    let location = parsed
        .locations
        .first()
        .ok_or_else(|| "no locations in response".to_string())?;
    match (location.y, location.x) {
        (Some(lat), Some(lon)) => Ok((lat, lon)),
        _ => Err("location missing x/y coordinates".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking HeartRails client. No per-request retry here: a failed
/// lookup is handled by the resolver's postal fallback, not by
/// re-asking for the same code.
pub struct HeartRailsGeocoder<'a> {
    client: &'a reqwest::blocking::Client,
    base_url: String,
}

impl<'a> HeartRailsGeocoder<'a> {
    pub fn new(client: &'a reqwest::blocking::Client) -> Self {
        Self::with_base_url(client, GEOCODE_BASE_URL)
    }

    pub fn with_base_url(client: &'a reqwest::blocking::Client, base_url: &str) -> Self {
        HeartRailsGeocoder { client, base_url: base_url.to_string() }
    }

    pub fn lookup_url(&self, postal: &str) -> String {
        format!("{}?method=searchByPostal&postal={}", self.base_url, postal)
    }
}

impl PostalGeocoder for HeartRailsGeocoder<'_> {
    fn locate(&self, postal: &str) -> Result<(f64, f64), WeatherError> {
        let geocode_err = |reason: String| WeatherError::Geocode {
            postal: postal.to_string(),
            reason,
        };
        let body = super::get_text(self.client, &self.lookup_url(postal))
            .map_err(|e| geocode_err(e.to_string()))?;
        parse_response(&body).map_err(geocode_err)
    }
}
