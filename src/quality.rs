//! Data-quality assessment over a raw, uncleaned dataset.

use crate::types::{
    Column, ColumnQuality, Dataset, QualityReport, COMMENTS_COL, REGION_COL, TIMESTAMP_COL,
};

/// Columns with physically meaningful bounds, checked for out-of-range values.
pub const VALID_RANGES: [(Column, f64, f64); 3] = [
    (Column::Ghi, 0.0, 1500.0),
    (Column::Rh, 0.0, 100.0),
    (Column::Tamb, -20.0, 60.0),
];

fn valid_range(col: Column) -> Option<(f64, f64)> {
    VALID_RANGES
        .iter()
        .find(|(c, _, _)| *c == col)
        .map(|(_, lo, hi)| (*lo, *hi))
}

/// Count missing, zero, negative and out-of-range values per column.
///
/// Rows follow the source column order: timestamp, sensor columns, the
/// annotation column when present, then the region label. Columns missing
/// from the dataset's schema are left out.
pub fn generate_quality_report(data: &Dataset) -> QualityReport {
    let records = data.records();
    let mut columns = Vec::new();

    // Timestamps are parsed at load time; rows without one never get here.
    columns.push(ColumnQuality {
        column: TIMESTAMP_COL.to_string(),
        missing: 0,
        zeros: 0,
        negatives: None,
        out_of_range: None,
    });

    for &col in data.columns() {
        let mut missing = 0usize;
        let mut zeros = 0usize;
        let mut negatives = 0usize;
        let mut out_of_range = 0usize;
        let range = valid_range(col);
        for r in records {
            let Some(v) = r.value(col) else {
                missing += 1;
                continue;
            };
            if v == 0.0 {
                zeros += 1;
            }
            if v < 0.0 {
                negatives += 1;
            }
            if let Some((lo, hi)) = range {
                if v < lo || v > hi {
                    out_of_range += 1;
                }
            }
        }
        columns.push(ColumnQuality {
            column: col.name().to_string(),
            missing,
            zeros,
            negatives: Some(negatives),
            out_of_range: range.map(|_| out_of_range),
        });
    }

    if data.is_annotated() {
        columns.push(ColumnQuality {
            column: COMMENTS_COL.to_string(),
            missing: records.iter().filter(|r| r.comments.is_none()).count(),
            zeros: 0,
            negatives: None,
            out_of_range: None,
        });
    }

    columns.push(ColumnQuality {
        column: REGION_COL.to_string(),
        missing: records.iter().filter(|r| r.region.trim().is_empty()).count(),
        zeros: 0,
        negatives: None,
        out_of_range: None,
    });

    QualityReport { columns }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 8, 9)
            .and_then(|d| d.and_hms_opt(0, minute, 0))
            .unwrap()
    }

    fn raw() -> Dataset {
        let mut a = Record::new(ts(0), "Benin")
            .with(Column::Ghi, -3.0)
            .with(Column::Rh, 104.0)
            .with(Column::Tamb, 0.0);
        a.comments = Some("sensor wiped".to_string());
        let b = Record::new(ts(1), "Benin")
            .with(Column::Ghi, 0.0)
            .with(Column::Rh, 50.0)
            .with(Column::Tamb, 61.5);
        let c = Record::new(ts(2), "Benin")
            .with(Column::Ghi, 1600.0)
            .with(Column::Tamb, -25.0);
        Dataset::with_schema(vec![a, b, c], &[Column::Ghi, Column::Rh, Column::Tamb, Column::Ws], true)
    }

    #[test]
    fn counts_per_column() {
        let report = generate_quality_report(&raw());

        let ghi = report.get("GHI").unwrap();
        assert_eq!(ghi.missing, 0);
        assert_eq!(ghi.zeros, 1);
        assert_eq!(ghi.negatives, Some(1));
        assert_eq!(ghi.out_of_range, Some(2));

        let rh = report.get("RH").unwrap();
        assert_eq!(rh.missing, 1);
        assert_eq!(rh.out_of_range, Some(1));

        let tamb = report.get("Tamb").unwrap();
        assert_eq!(tamb.zeros, 1);
        assert_eq!(tamb.negatives, Some(1));
        assert_eq!(tamb.out_of_range, Some(2));

        let ws = report.get("WS").unwrap();
        assert_eq!(ws.missing, 3);
        assert_eq!(ws.out_of_range, None);
    }

    #[test]
    fn absent_columns_are_skipped() {
        let report = generate_quality_report(&raw());
        assert!(report.get("DNI").is_none());
        assert!(report.get("Precipitation").is_none());
    }

    #[test]
    fn row_order_follows_source_layout() {
        let report = generate_quality_report(&raw());
        let names: Vec<&str> = report.columns.iter().map(|c| c.column.as_str()).collect();
        assert_eq!(
            names,
            vec!["Timestamp", "GHI", "Tamb", "RH", "WS", "Comments", "Region"]
        );
        assert_eq!(report.get("Comments").unwrap().missing, 2);
        assert_eq!(report.get("Region").unwrap().negatives, None);
    }

    #[test]
    fn does_not_touch_input() {
        let data = raw();
        let before = data.clone();
        let _ = generate_quality_report(&data);
        assert_eq!(data, before);
    }
}
