use crate::errors::{PipelineError, Result};
use crate::types::{Column, Dataset, Record, RegionStats, RegionalStats};
use crate::util::{max, mean, median, round2, std_dev};
use log::{error, info};
use std::collections::BTreeMap;

const STAGE: &str = "regional statistics";

/// Fail with `MissingColumn` naming the first of `required` absent from `data`.
pub fn require_columns(data: &Dataset, required: &[Column], stage: &'static str) -> Result<()> {
    match required.iter().find(|c| !data.has_column(**c)) {
        Some(&column) => {
            error!("Missing required column for {}: {}", stage, column);
            Err(PipelineError::MissingColumn { stage, column })
        }
        None => Ok(()),
    }
}

/// Records grouped by region label, groups in sorted label order and rows
/// in dataset order within a group.
pub fn group_by_region(data: &Dataset) -> BTreeMap<&str, Vec<&Record>> {
    let mut groups: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for r in data.records() {
        groups.entry(r.region.as_str()).or_default().push(r);
    }
    groups
}

/// Present values of `col` in a group.
pub fn group_values(group: &[&Record], col: Column) -> Vec<f64> {
    group.iter().filter_map(|r| r.value(col)).collect()
}

/// Descriptive statistics per region of a cleaned dataset, rounded to 2
/// decimals.
pub fn calculate_regional_stats(data: &Dataset) -> Result<RegionalStats> {
    require_columns(
        data,
        &[
            Column::Ghi,
            Column::Dni,
            Column::Tamb,
            Column::Ws,
            Column::Precipitation,
        ],
        STAGE,
    )?;

    let r2 = |v: Option<f64>| v.map(round2);
    let mut stats = RegionalStats::new();
    for (region, group) in group_by_region(data) {
        let ghi = group_values(&group, Column::Ghi);
        let dni = group_values(&group, Column::Dni);
        let tamb = group_values(&group, Column::Tamb);
        let ws = group_values(&group, Column::Ws);
        let precipitation: f64 = group_values(&group, Column::Precipitation).iter().sum();

        stats.insert(
            region.to_string(),
            RegionStats {
                ghi_mean: r2(mean(&ghi)),
                ghi_std: r2(std_dev(&ghi)),
                ghi_max: r2(max(&ghi)),
                dni_median: r2(median(dni.clone())),
                dni_max: r2(max(&dni)),
                tamb_mean: r2(mean(&tamb)),
                tamb_std: r2(std_dev(&tamb)),
                ws_mean: r2(mean(&ws)),
                ws_max: r2(max(&ws)),
                precipitation_sum: round2(precipitation),
            },
        );
    }
    info!("Computed regional statistics for {} regions", stats.len());
    Ok(stats)
}
