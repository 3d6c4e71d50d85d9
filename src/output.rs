//! Output CSV files.
//!
//! File names encode the resolved station and the request, so a re-run
//! with identical arguments finds its own previous output and can skip
//! the fetch entirely.

use std::path::{Path, PathBuf};

use crate::assemble::AssembledSeries;
use crate::model::WeatherError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Check mode: `<out_dir>/<postal>.csv`, named after the postal code as
/// entered (not the coarsened candidate that finally resolved).
pub fn check_file(out_dir: &Path, postal: &str) -> PathBuf {
    out_dir.join(format!("{}.csv", postal))
}

/// Series modes: `<pref>_<area>_<tag>_<start>_<end>.csv`, where `tag`
/// is `all` or the selected column index.
pub fn series_file(
    out_dir: &Path,
    pref: &str,
    area: &str,
    tag: &str,
    start_date: &str,
    end_date: &str,
) -> PathBuf {
    out_dir.join(format!("{}_{}_{}_{}_{}.csv", pref, area, tag, start_date, end_date))
}

/// Check-mode payload: resolved candidate code, prefecture, area — one
/// value per line, no header row.
pub fn write_check(
    path: &Path,
    resolved_code: &str,
    pref: &str,
    area: &str,
) -> Result<(), WeatherError> {
    let mut writer = csv::Writer::from_path(path)?;
    for value in [resolved_code, pref, area] {
        writer.write_record([value])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the assembled series with its header row; timestamps are
/// rendered "%Y-%m-%d %H:%M:%S".
pub fn write_series(path: &Path, series: &AssembledSeries) -> Result<(), WeatherError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&series.headers)?;
    for row in &series.rows {
        let mut record = Vec::with_capacity(1 + row.values.len());
        record.push(row.timestamp.format(TIMESTAMP_FORMAT).to_string());
        record.extend(row.values.iter().cloned());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::SeriesRow;
    use chrono::NaiveDate;

    #[test]
    fn test_file_naming() {
        let dir = Path::new("/tmp/out");
        assert_eq!(check_file(dir, "1600023"), Path::new("/tmp/out/1600023.csv"));
        assert_eq!(
            series_file(dir, "東京", "東京", "all", "20200101", "20200131"),
            Path::new("/tmp/out/東京_東京_all_20200101_20200131.csv")
        );
        assert_eq!(
            series_file(dir, "東京", "八王子", "2", "20200101", "20200131"),
            Path::new("/tmp/out/東京_八王子_2_20200101_20200131.csv")
        );
    }

    #[test]
    fn test_check_payload_is_one_value_per_line() {
        let path = std::env::temp_dir().join("jma_hourly_check_test.csv");
        write_check(&path, "1600000", "東京", "東京").unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "1600000\n東京\n東京\n");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_series_rows_render_timestamps() {
        let path = std::env::temp_dir().join("jma_hourly_series_test.csv");
        let series = AssembledSeries {
            headers: vec!["日時".to_string(), "2".to_string()],
            rows: vec![SeriesRow {
                timestamp: NaiveDate::from_ymd_opt(2020, 1, 6)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                values: vec!["3".to_string()],
            }],
        };
        write_series(&path, &series).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "日時,2\n2020-01-06 00:00:00,3\n");
        std::fs::remove_file(&path).unwrap();
    }
}
