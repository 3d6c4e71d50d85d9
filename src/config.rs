//! Run configuration.
//!
//! Every knob has a production default, so the tool runs with no config
//! file present. A TOML file can override endpoints (test servers,
//! mirrors), the catalog location, and the timing constants — though
//! the courtesy delay exists for the upstream services' benefit and the
//! default should stay at one second against the real portal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::ingest::{geocode, hourly, select};
use crate::model::WeatherError;

pub const DEFAULT_CONFIG_PATH: &str = "jma_hourly.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL for the hourly observation pages.
    pub hourly_base_url: String,
    /// Base URL for the station selection (catalog) pages.
    pub select_base_url: String,
    /// Base URL for the postal geocoder.
    pub geocode_base_url: String,
    /// Directory holding the catalog CSV files.
    pub catalog_dir: PathBuf,
    /// Directory that receives the run log on a fatal abort.
    pub log_dir: PathBuf,
    /// Courtesy pause after each network request, in seconds.
    pub request_delay_secs: u64,
    /// HTTP request timeout, in seconds.
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hourly_base_url: hourly::HOURLY_BASE_URL.to_string(),
            select_base_url: select::SELECT_BASE_URL.to_string(),
            geocode_base_url: geocode::GEOCODE_BASE_URL.to_string(),
            catalog_dir: PathBuf::from("."),
            log_dir: std::env::temp_dir(),
            request_delay_secs: 1,
            http_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Loads the file if it exists; defaults otherwise. A file that is
    /// present but malformed is an argument error, not a silent
    /// fallback.
    pub fn load(path: &Path) -> Result<Config, WeatherError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| {
            WeatherError::Argument(format!("config file {}: {}", path.display(), e))
        })
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_production_services() {
        let config = Config::default();
        assert!(config.hourly_base_url.contains("data.jma.go.jp"));
        assert!(config.geocode_base_url.contains("heartrails.com"));
        assert_eq!(config.request_delay_secs, 1);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load(Path::new("/nonexistent/jma_hourly.toml")).unwrap();
        assert_eq!(config.request_delay_secs, Config::default().request_delay_secs);
    }

    #[test]
    fn test_partial_file_overrides_only_named_keys() {
        let path = std::env::temp_dir().join("jma_hourly_config_test.toml");
        std::fs::write(&path, "request_delay_secs = 0\ncatalog_dir = \"/var/cache/jma\"\n")
            .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.request_delay_secs, 0);
        assert_eq!(config.catalog_dir, PathBuf::from("/var/cache/jma"));
        assert_eq!(config.hourly_base_url, Config::default().hourly_base_url);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unknown_keys_are_an_argument_error() {
        let path = std::env::temp_dir().join("jma_hourly_config_badkey_test.toml");
        std::fs::write(&path, "no_such_knob = true\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, WeatherError::Argument(_)), "got {:?}", err);

        std::fs::remove_file(&path).unwrap();
    }
}
