//! Network ingest: portal pages and the postal geocoder.
//!
//! Everything here is sequential blocking I/O through one shared
//! `reqwest::blocking::Client`. Callers own the courtesy pause between
//! requests; this module owns the per-request retry behavior.

pub mod geocode;
pub mod hourly;
pub mod select;

use std::thread;
use std::time::Duration;

use crate::model::WeatherError;

/// Scoped retry for one network operation: `max_attempts` tries with a
/// fixed pause between them. No backoff growth, no jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// The portal policy: one retry after a fixed pause.
    pub fn once_after(delay: Duration) -> RetryPolicy {
        RetryPolicy { max_attempts: 2, delay }
    }

    /// Runs `op` until it succeeds or the attempt budget is spent.
    /// `on_retry` fires before each re-attempt so the caller can log.
    pub fn run<T>(
        &self,
        mut op: impl FnMut() -> Result<T, WeatherError>,
        mut on_retry: impl FnMut(&WeatherError),
    ) -> Result<T, WeatherError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts => {
                    on_retry(&err);
                    thread::sleep(self.delay);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// GETs a page and returns its body, folding transport and HTTP-status
/// failures into `Fetch`.
pub(crate) fn get_text(
    client: &reqwest::blocking::Client,
    url: &str,
) -> Result<String, WeatherError> {
    client
        .get(url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.text())
        .map_err(|err| WeatherError::Fetch { url: url.to_string(), reason: err.to_string() })
}
