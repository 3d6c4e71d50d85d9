//! Fixed table templates for the portal's hourly pages.
//!
//! The portal publishes two hourly layouts: the 17-column weather-office
//! table and the 8-column AMeDAS table. Header text is compared verbatim
//! against the scraped page, so these templates must track the portal's
//! markup exactly; the column names were last confirmed against live
//! pages from 2018/02. This is the single source of truth for layouts —
//! other modules should reference templates from here rather than
//! hardcoding column positions.

use crate::model::{DailyTable, StationKind};

/// The fixed layout of one station kind's hourly table.
///
/// `header_rows` holds the scraped header text row by row, padded with
/// empty strings where the page leaves cells blank (the spanning header
/// cells collapse to the row's left edge when extracted, same as the
/// live pages). `output_columns` are the friendly names assigned when a
/// full-table fetch matched this template, hour column folded into the
/// leading timestamp.
pub struct TableTemplate {
    pub kind: StationKind,
    /// Endpoint file name under the hourly view base URL.
    pub endpoint: &'static str,
    pub column_count: usize,
    pub header_rows: &'static [&'static [&'static str]],
    pub output_columns: &'static [&'static str],
}

/// Weather-office hourly table (hourly_s1.php).
pub static OFFICE_TEMPLATE: TableTemplate = TableTemplate {
    kind: StationKind::Office,
    endpoint: "hourly_s1.php",
    column_count: 17,
    header_rows: &[
        &[
            "時",
            "気圧(hPa)",
            "降水量(mm)",
            "気温(℃)",
            "露点温度(℃)",
            "蒸気圧(hPa)",
            "湿度(％)",
            "風向・風速(m/s)",
            "日照時間(h)",
            "全天日射量(MJ/㎡)",
            "雪(cm)",
            "天気",
            "雲量",
            "視程(km)",
            "",
            "",
            "",
        ],
        &[
            "現地", "海面", "風速", "風向", "降雪", "積雪", "", "", "", "", "", "", "", "", "",
            "", "",
        ],
    ],
    output_columns: &[
        "日時",
        "気圧hPa_現地",
        "気圧hPa_海面",
        "降水量mm",
        "気温℃",
        "露点温度℃",
        "蒸気圧hPa",
        "湿度％",
        "風速m／s",
        "風向",
        "日照時間h",
        "全天日射量MJ／㎡",
        "雪cm_降雪",
        "雪cm_積雪",
        "天気",
        "雲量",
        "視程km",
    ],
};

/// AMeDAS hourly table (hourly_a1.php).
pub static AMEDAS_TEMPLATE: TableTemplate = TableTemplate {
    kind: StationKind::Amedas,
    endpoint: "hourly_a1.php",
    column_count: 8,
    header_rows: &[
        &[
            "時",
            "降水量(mm)",
            "気温(℃)",
            "風速・風向(m/s)",
            "日照時間(h)",
            "雪(cm)",
            "",
            "",
        ],
        &["風速", "風向", "降雪", "積雪", "", "", "", ""],
    ],
    output_columns: &[
        "日時",
        "降水量mm",
        "気温℃",
        "風速m／s",
        "風向",
        "日照時間h",
        "雪cm_降雪",
        "雪cm_積雪",
    ],
};

/// Template for a station kind.
pub fn template_for(kind: StationKind) -> &'static TableTemplate {
    match kind {
        StationKind::Office => &OFFICE_TEMPLATE,
        StationKind::Amedas => &AMEDAS_TEMPLATE,
    }
}

impl TableTemplate {
    /// Checks a scraped table against this template: same column count,
    /// `start_row` equal to the template's header depth, and every
    /// header cell equal to the template's (empty string matching the
    /// page's blank cells). Returns the first difference as text for the
    /// log; a mismatch downgrades header naming, it never aborts.
    pub fn matches(&self, table: &DailyTable, start_row: usize) -> Result<(), String> {
        if table.column_count != self.column_count {
            return Err(format!(
                "number of columns is different from template: expected {}, got {}",
                self.column_count, table.column_count
            ));
        }
        if start_row != self.header_rows.len() {
            return Err(format!(
                "start row {} is different from template header depth {}",
                start_row,
                self.header_rows.len()
            ));
        }
        for (i, expected_row) in self.header_rows.iter().enumerate() {
            let Some(actual_row) = table.rows.get(i) else {
                return Err(format!("header row {} is missing", i));
            };
            for (j, expected) in expected_row.iter().enumerate() {
                let actual = actual_row.get(j).map(String::as_str).unwrap_or("");
                if actual != *expected {
                    return Err(format!(
                        "header cell ({}, {}) is different from template: expected {:?}, got {:?}",
                        i, j, expected, actual
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office_header_rows() -> Vec<Vec<String>> {
        OFFICE_TEMPLATE
            .header_rows
            .iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn office_table_with_data() -> DailyTable {
        let mut rows = office_header_rows();
        let mut data = vec!["1".to_string()];
        data.resize(17, "0.0".to_string());
        rows.push(data);
        DailyTable::new(rows)
    }

    #[test]
    fn test_templates_are_internally_consistent() {
        for t in [&OFFICE_TEMPLATE, &AMEDAS_TEMPLATE] {
            assert_eq!(
                t.output_columns.len(),
                t.column_count,
                "{} template output names must cover every column",
                t.kind
            );
            for row in t.header_rows {
                assert_eq!(row.len(), t.column_count);
            }
            assert_eq!(t.header_rows.len(), 2);
        }
    }

    #[test]
    fn test_template_lookup_by_kind() {
        assert_eq!(template_for(StationKind::Office).column_count, 17);
        assert_eq!(template_for(StationKind::Amedas).column_count, 8);
    }

    #[test]
    fn test_matching_table_validates() {
        let table = office_table_with_data();
        assert!(OFFICE_TEMPLATE.matches(&table, 2).is_ok());
    }

    #[test]
    fn test_wrong_column_count_is_reported() {
        let table = DailyTable::new(vec![vec!["時".to_string(); 16]]);
        let err = OFFICE_TEMPLATE.matches(&table, 2).unwrap_err();
        assert!(err.contains("number of columns"), "got: {}", err);
    }

    #[test]
    fn test_wrong_start_row_is_reported() {
        let table = office_table_with_data();
        let err = OFFICE_TEMPLATE.matches(&table, 3).unwrap_err();
        assert!(err.contains("start row"), "got: {}", err);
    }

    #[test]
    fn test_renamed_header_cell_is_reported() {
        let mut rows = office_header_rows();
        rows[0][3] = "気温(K)".to_string();
        let table = DailyTable::new(rows);
        let err = OFFICE_TEMPLATE.matches(&table, 2).unwrap_err();
        assert!(err.contains("header cell (0, 3)"), "got: {}", err);
    }

    #[test]
    fn test_blank_header_cells_match_template_padding() {
        // Columns 14-16 of the office header are blank on the page; the
        // template records them as empty strings and they must compare
        // equal.
        let table = office_table_with_data();
        assert_eq!(table.rows[0][14], "");
        assert!(OFFICE_TEMPLATE.matches(&table, 2).is_ok());
    }
}
