use crate::aggregate::{group_by_region, group_values, require_columns};
use crate::errors::{PipelineError, Result};
use crate::types::{Column, Dataset, Decision, Pick, Recommendation};
use crate::util::{max, mean, median, round2, std_dev};
use log::{info, warn};
use std::collections::BTreeMap;

const STAGE: &str = "recommendations";

/// Per-region figures the decisions are taken from, rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteMetrics {
    pub ghi_mean: Option<f64>,
    pub ghi_std: Option<f64>,
    pub dni_median: Option<f64>,
    pub tamb_mean: Option<f64>,
    pub tamb_std: Option<f64>,
    pub precipitation_sum: f64,
    pub ws_gust_max: Option<f64>,
}

pub fn site_metrics(data: &Dataset) -> Result<BTreeMap<String, SiteMetrics>> {
    require_columns(
        data,
        &[
            Column::Ghi,
            Column::Dni,
            Column::Tamb,
            Column::Precipitation,
            Column::WsGust,
        ],
        STAGE,
    )?;
    if data.is_empty() {
        return Err(PipelineError::EmptyResult { stage: STAGE });
    }

    let r2 = |v: Option<f64>| v.map(round2);
    Ok(group_by_region(data)
        .into_iter()
        .map(|(region, group)| {
            let ghi = group_values(&group, Column::Ghi);
            let tamb = group_values(&group, Column::Tamb);
            let precipitation: f64 = group_values(&group, Column::Precipitation).iter().sum();
            let metrics = SiteMetrics {
                ghi_mean: r2(mean(&ghi)),
                ghi_std: r2(std_dev(&ghi)),
                dni_median: r2(median(group_values(&group, Column::Dni))),
                tamb_mean: r2(mean(&tamb)),
                tamb_std: r2(std_dev(&tamb)),
                precipitation_sum: round2(precipitation),
                ws_gust_max: r2(max(&group_values(&group, Column::WsGust))),
            };
            (region.to_string(), metrics)
        })
        .collect())
}

/// Region with the extreme value of `metric`. Regions are visited in sorted
/// order and a later region must strictly beat the current one, so ties go
/// to the first region. Undefined values are ignored.
fn select<F>(metrics: &BTreeMap<String, SiteMetrics>, metric: F, highest: bool) -> (Option<String>, Option<f64>)
where
    F: Fn(&SiteMetrics) -> Option<f64>,
{
    let mut best: Option<(&str, f64)> = None;
    for (region, m) in metrics {
        let Some(v) = metric(m) else { continue };
        let better = match best {
            None => true,
            Some((_, b)) if highest => v > b,
            Some((_, b)) => v < b,
        };
        if better {
            best = Some((region.as_str(), v));
        }
    }
    match best {
        Some((region, v)) => (Some(region.to_string()), Some(v)),
        None => (None, None),
    }
}

/// Pick a region for every decision label from a cleaned dataset.
pub fn generate_recommendations(data: &Dataset) -> Result<Recommendation> {
    let metrics = site_metrics(data)?;

    let picks = Decision::ALL
        .iter()
        .map(|&decision| {
            let (region, value) = match decision {
                Decision::BestOverallPotential => select(&metrics, |m| m.ghi_mean, true),
                Decision::MostStableRadiation => select(&metrics, |m| m.ghi_std, false),
                Decision::LowestMaintenanceRisk => {
                    select(&metrics, |m| Some(m.precipitation_sum), false)
                }
                Decision::OptimalCspLocation => select(&metrics, |m| m.dni_median, true),
            };
            if region.is_none() {
                warn!("No region has a defined value for '{}'", decision);
            }
            Pick {
                decision,
                region,
                value,
            }
        })
        .collect();
    info!("Recommendations generated for {} regions", metrics.len());
    Ok(Recommendation { picks })
}
