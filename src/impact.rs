//! Effect of panel-cleaning events on module output.
//!
//! For each flagged row the mean ModA/ModB over the three rows before is
//! compared to the mean over the three rows after. Windows are taken by row
//! adjacency only and are not checked against region boundaries.

use crate::aggregate::require_columns;
use crate::errors::Result;
use crate::types::{CleaningImpact, Column, Dataset, Record, RegionImpact};
use crate::util::mean;
use log::{debug, info, warn};
use std::collections::BTreeMap;

const STAGE: &str = "cleaning impact analysis";

/// Rows on each side of an event.
pub const WINDOW: usize = 3;

/// Before/after change for a single event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventImpact {
    pub index: usize,
    pub region: String,
    pub mod_a_improvement: Option<f64>,
    pub mod_b_improvement: Option<f64>,
}

fn window_mean(rows: &[Record], col: Column) -> Option<f64> {
    let values: Vec<f64> = rows.iter().filter_map(|r| r.value(col)).collect();
    mean(&values)
}

fn diff(post: Option<f64>, pre: Option<f64>) -> Option<f64> {
    Some(post? - pre?)
}

/// Per-event improvements for every flagged row with a full window on both
/// sides. Events closer than `WINDOW` rows to either end are skipped.
pub fn event_impacts(data: &Dataset) -> Result<Vec<EventImpact>> {
    require_columns(data, &[Column::Cleaning, Column::ModA, Column::ModB], STAGE)?;
    let rows = data.records();

    let mut events = Vec::new();
    for (i, r) in rows.iter().enumerate() {
        if !r.is_cleaning_event() {
            continue;
        }
        if i < WINDOW || i + WINDOW >= rows.len() {
            debug!("Cleaning event at row {} lacks a full window, skipped", i);
            continue;
        }
        let pre = &rows[i - WINDOW..i];
        let post = &rows[i + 1..=i + WINDOW];
        if pre.iter().chain(post).any(|w| w.region != r.region) {
            debug!("Cleaning event at row {} has a window crossing a region boundary", i);
        }
        events.push(EventImpact {
            index: i,
            region: r.region.clone(),
            mod_a_improvement: diff(window_mean(post, Column::ModA), window_mean(pre, Column::ModA)),
            mod_b_improvement: diff(window_mean(post, Column::ModB), window_mean(pre, Column::ModB)),
        });
    }
    Ok(events)
}

/// Mean ModA/ModB improvement per region, over the region's qualifying events.
pub fn analyze_cleaning_impact(data: &Dataset) -> Result<CleaningImpact> {
    let events = event_impacts(data)?;
    if events.is_empty() {
        warn!("No cleaning events with a full window found");
    }

    let mut grouped: BTreeMap<String, Vec<&EventImpact>> = BTreeMap::new();
    for e in &events {
        grouped.entry(e.region.clone()).or_default().push(e);
    }

    let impact: CleaningImpact = grouped
        .into_iter()
        .map(|(region, evs)| {
            let a: Vec<f64> = evs.iter().filter_map(|e| e.mod_a_improvement).collect();
            let b: Vec<f64> = evs.iter().filter_map(|e| e.mod_b_improvement).collect();
            let summary = RegionImpact {
                mod_a_improvement: mean(&a),
                mod_b_improvement: mean(&b),
                events: evs.len(),
            };
            (region, summary)
        })
        .collect();
    info!(
        "Analyzed {} cleaning events across {} regions",
        events.len(),
        impact.len()
    );
    Ok(impact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PipelineError;
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn ts(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 3, 1)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .unwrap()
            + Duration::minutes(i as i64)
    }

    fn series(region: &str, mod_a: &[f64], events: &[usize]) -> Vec<Record> {
        mod_a
            .iter()
            .enumerate()
            .map(|(i, a)| {
                Record::new(ts(i), region)
                    .with(Column::ModA, *a)
                    .with(Column::ModB, a * 2.0)
                    .with(Column::Cleaning, if events.contains(&i) { 1.0 } else { 0.0 })
            })
            .collect()
    }

    #[test]
    fn window_around_event_in_middle() {
        let mut mod_a = vec![50.0; 20];
        for v in mod_a.iter_mut().skip(11) {
            *v = 60.0;
        }
        let data = Dataset::new(series("Benin", &mod_a, &[10]));
        let impact = analyze_cleaning_impact(&data).unwrap();
        let benin = &impact["Benin"];
        assert_abs_diff_eq!(benin.mod_a_improvement.unwrap(), 10.0);
        assert_abs_diff_eq!(benin.mod_b_improvement.unwrap(), 20.0);
        assert_eq!(benin.events, 1);
    }

    #[test]
    fn boundary_events_need_full_window() {
        let mod_a: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let data = Dataset::new(series("Togo", &mod_a, &[2, 3, 6, 7]));
        let events = event_impacts(&data).unwrap();
        let indices: Vec<usize> = events.iter().map(|e| e.index).collect();
        // Index 2 has only two rows before it, index 7 only two after it.
        assert_eq!(indices, vec![3, 6]);
        assert_abs_diff_eq!(events[0].mod_a_improvement.unwrap(), 4.0);
    }

    #[test]
    fn averages_events_per_region() {
        let mut rows = series("A", &[1.0, 1.0, 1.0, 1.0, 3.0, 3.0, 3.0, 3.0], &[3]);
        rows.extend(series("B", &[5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0], &[3, 6]));
        let data = Dataset::new(rows);
        let impact = analyze_cleaning_impact(&data).unwrap();
        assert_abs_diff_eq!(impact["A"].mod_a_improvement.unwrap(), 2.0);
        assert_eq!(impact["B"].events, 2);
        assert_abs_diff_eq!(impact["B"].mod_a_improvement.unwrap(), 0.0);
    }

    #[test]
    fn window_may_cross_region_boundary() {
        // The last event of A reaches into B's first rows.
        let mut rows = series("A", &[1.0, 1.0, 1.0, 1.0, 1.0], &[4]);
        rows.extend(series("B", &[7.0, 7.0, 7.0], &[]));
        let data = Dataset::new(rows);
        let impact = analyze_cleaning_impact(&data).unwrap();
        assert_abs_diff_eq!(impact["A"].mod_a_improvement.unwrap(), 6.0);
        assert!(!impact.contains_key("B"));
    }

    #[test]
    fn no_events_gives_empty_result() {
        let data = Dataset::new(series("A", &[1.0; 10], &[]));
        assert!(analyze_cleaning_impact(&data).unwrap().is_empty());
    }

    #[test]
    fn requires_module_columns() {
        let data = Dataset::with_schema(vec![], &[Column::Cleaning, Column::ModA], false);
        assert!(matches!(
            analyze_cleaning_impact(&data),
            Err(PipelineError::MissingColumn { column: Column::ModB, .. })
        ));
    }
}
