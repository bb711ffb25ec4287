//! Cleaning pipeline: imputation, bound clipping and IQR outlier rejection.
//!
//! The steps run in a fixed order because later steps work on values the
//! earlier ones already imputed or clipped:
//!
//! 1. drop the free-text annotation column,
//! 2. forward-fill missing values in row order,
//! 3. floor the solar columns at zero,
//! 4. clip relative humidity to its valid range,
//! 5. reject rows outside `[Q1 - k*IQR, Q3 + k*IQR]`, column by column.
//!
//! Step 5 is cumulative: a row rejected while checking one column is gone
//! when the quartiles of the next column are computed. It runs once unless
//! `CleaningPolicy::converge` asks for repeats.

use crate::config::CleaningPolicy;
use crate::types::{Column, Dataset, Record};
use crate::util::quantile;
use log::{debug, info};

/// Produce a sanitized copy of `data`. The input is left untouched.
pub fn clean_data(data: &Dataset, policy: &CleaningPolicy) -> Dataset {
    info!("Starting data cleaning process on {} rows", data.len());
    let (mut records, columns, annotated) = data.clone().into_parts();

    if annotated {
        for r in &mut records {
            r.comments = None;
        }
    }

    forward_fill(&mut records, &columns);

    for &col in &policy.solar_columns {
        if columns.contains(&col) {
            clip(&mut records, col, Some(0.0), None);
        } else {
            debug!("Column {} absent, skipping non-negativity clip", col);
        }
    }

    if columns.contains(&Column::Rh) {
        let (lo, hi) = policy.rh_bounds;
        clip(&mut records, Column::Rh, Some(lo), Some(hi));
    }

    let records = reject_outliers(records, &columns, policy);
    info!(
        "Cleaned data shape: {} rows x {} columns",
        records.len(),
        columns.len() + 2
    );
    Dataset::with_schema(records, &columns, false)
}

/// Replace each missing cell with the last value seen above it in the same
/// column. Leading gaps stay missing.
pub fn forward_fill(records: &mut [Record], columns: &[Column]) {
    for &col in columns {
        let mut last: Option<f64> = None;
        for r in records.iter_mut() {
            match r.value(col) {
                Some(v) => last = Some(v),
                None => r.set_value(col, last),
            }
        }
    }
}

fn clip(records: &mut [Record], col: Column, lower: Option<f64>, upper: Option<f64>) {
    for r in records.iter_mut() {
        if let Some(mut v) = r.value(col) {
            if let Some(lo) = lower {
                v = v.max(lo);
            }
            if let Some(hi) = upper {
                v = v.min(hi);
            }
            r.set_value(col, Some(v));
        }
    }
}

/// `[Q1 - k*IQR, Q3 + k*IQR]` over `values`; `None` when there are no values.
pub fn iqr_bounds(values: &[f64], multiplier: f64) -> Option<(f64, f64)> {
    let q1 = quantile(values.to_vec(), 0.25)?;
    let q3 = quantile(values.to_vec(), 0.75)?;
    let iqr = q3 - q1;
    Some((q1 - multiplier * iqr, q3 + multiplier * iqr))
}

/// Run the sequential outlier pass; with `policy.converge` it is repeated
/// until a pass rejects nothing.
pub fn reject_outliers(
    mut records: Vec<Record>,
    columns: &[Column],
    policy: &CleaningPolicy,
) -> Vec<Record> {
    let mut pass = 1usize;
    loop {
        let before = records.len();
        records = outlier_pass(records, columns, policy);
        let removed = before - records.len();
        if !policy.converge || removed == 0 {
            break;
        }
        debug!("Outlier pass {} removed {} rows, repeating", pass, removed);
        pass += 1;
    }
    records
}

fn outlier_pass(mut records: Vec<Record>, columns: &[Column], policy: &CleaningPolicy) -> Vec<Record> {
    for &col in &policy.outlier_columns {
        if !columns.contains(&col) {
            debug!("Column {} absent, skipping outlier check", col);
            continue;
        }
        let values: Vec<f64> = records.iter().filter_map(|r| r.value(col)).collect();
        let bounds = iqr_bounds(&values, policy.iqr_multiplier);
        let before = records.len();
        // A missing value cannot be shown to lie within bounds.
        records.retain(|r| match (r.value(col), bounds) {
            (Some(v), Some((lo, hi))) => v >= lo && v <= hi,
            _ => false,
        });
        if records.len() < before {
            debug!("Rejected {} rows on {}", before - records.len(), col);
        }
    }
    records
}
