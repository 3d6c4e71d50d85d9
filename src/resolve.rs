//! Postal-code to nearest-station resolution.
//!
//! A postal code is geocoded to a point, and the nearest active
//! temperature station wins. Codes that fail to geocode (unassigned
//! blocks, service hiccups) are coarsened and retried: first the last
//! four digits are zeroed, then the three-digit prefix steps down one at
//! a time. This approximates "nearest valid postal prefix" without a
//! reverse-postal database; it carries no correctness guarantee against
//! the real postal hierarchy and is preserved as-is on purpose.

use std::thread;
use std::time::Duration;

use crate::catalog::ObservatoryIndex;
use crate::logging::Logger;
use crate::model::{ResolvedStation, WeatherError};

/// Total failed attempts (initial code included) before giving up.
pub const MAX_ATTEMPTS: u32 = 20;

/// Coordinate lookup collaborator. The production implementation lives
/// in `ingest::geocode`; tests substitute scripted ones.
pub trait PostalGeocoder {
    /// Returns (latitude, longitude) for a 7-digit postal code.
    fn locate(&self, postal: &str) -> Result<(f64, f64), WeatherError>;
}

/// Next fallback candidate for a code that failed: zero the last four
/// digits if any of them is nonzero, otherwise step the three-digit
/// prefix down by one (zero-padded).
pub fn next_candidate(postal: &str) -> String {
    let (prefix, suffix) = postal.split_at(3);
    if suffix == "0000" {
        let n = prefix.parse::<u32>().unwrap_or(0);
        format!("{:03}{}", n.saturating_sub(1), suffix)
    } else {
        format!("{}0000", prefix)
    }
}

/// Drives geocoding plus nearest-lookup with the coarsening fallback.
pub struct PostalResolver<'a, G: PostalGeocoder> {
    geocoder: &'a G,
    index: &'a ObservatoryIndex,
    retry_delay: Duration,
}

impl<'a, G: PostalGeocoder> PostalResolver<'a, G> {
    pub fn new(geocoder: &'a G, index: &'a ObservatoryIndex) -> Self {
        PostalResolver { geocoder, index, retry_delay: Duration::from_secs(1) }
    }

    /// Overrides the pause between fallback attempts (tests use zero;
    /// production keeps the courtesy second toward the geocoder).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Resolves a postal code to its nearest station, returning the
    /// candidate code that finally succeeded alongside the station.
    pub fn resolve(
        &self,
        postal: &str,
        log: &Logger,
    ) -> Result<(String, ResolvedStation), WeatherError> {
        let mut candidate = postal.to_string();
        let mut attempts: u32 = 0;
        loop {
            match self.attempt(&candidate) {
                Ok(station) => return Ok((candidate, station)),
                Err(err) => {
                    attempts += 1;
                    log.warn(&format!("failed to resolve postal code {}: {}", candidate, err));
                    if attempts >= MAX_ATTEMPTS || candidate.starts_with("000") {
                        return Err(WeatherError::ResolutionExhausted {
                            attempts,
                            last_candidate: candidate,
                        });
                    }
                    candidate = next_candidate(&candidate);
                    log.warn(&format!("retrying with coarsened postal code {}", candidate));
                    thread::sleep(self.retry_delay);
                }
            }
        }
    }

    fn attempt(&self, candidate: &str) -> Result<ResolvedStation, WeatherError> {
        let point = self.geocoder.locate(candidate)?;
        let record = self.index.nearest(point)?;
        Ok(ResolvedStation::from(record))
    }
}
