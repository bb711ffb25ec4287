use crate::errors::OutputError;
use crate::types::{
    CleanedRow, CleaningImpact, ColumnSummary, CorrelationMatrix, Dataset, ImpactRow,
    QualityReport, QualityRow, Recommendation, RecommendationRow, RegionStatsRow, RegionalStats,
    SummaryRow,
};
use crate::util::{format_number, format_opt};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

fn csv_err(path: &Path) -> impl FnOnce(csv::Error) -> OutputError + '_ {
    move |source| OutputError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> OutputError + '_ {
    move |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), OutputError> {
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err(path))?;
    for r in rows {
        wtr.serialize(r).map_err(csv_err(path))?;
    }
    wtr.flush().map_err(io_err(path))?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), OutputError> {
    let s = serde_json::to_string_pretty(value).map_err(|source| OutputError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, s).map_err(io_err(path))?;
    Ok(())
}

pub fn write_text(path: &Path, text: &str) -> Result<(), OutputError> {
    std::fs::write(path, text).map_err(io_err(path))
}

/// Square correlation table with a leading column of row labels.
pub fn write_correlation_csv(path: &Path, matrix: &CorrelationMatrix) -> Result<(), OutputError> {
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err(path))?;
    let mut header = vec![String::new()];
    header.extend(matrix.columns.iter().map(|c| c.name().to_string()));
    wtr.write_record(&header).map_err(csv_err(path))?;
    for &a in &matrix.columns {
        let mut record = vec![a.name().to_string()];
        record.extend(matrix.columns.iter().map(|&b| format_opt(matrix.get(a, b), 4)));
        wtr.write_record(&record).map_err(csv_err(path))?;
    }
    wtr.flush().map_err(io_err(path))?;
    Ok(())
}

pub fn quality_rows(report: &QualityReport) -> Vec<QualityRow> {
    report
        .columns
        .iter()
        .map(|c| QualityRow {
            column: c.column.clone(),
            missing: c.missing,
            zeros: c.zeros,
            negatives: c.negatives.map(|n| n.to_string()).unwrap_or_default(),
            out_of_range: c.out_of_range.map(|n| n.to_string()).unwrap_or_default(),
        })
        .collect()
}

pub fn cleaned_rows(data: &Dataset) -> Vec<CleanedRow> {
    data.records()
        .iter()
        .map(|r| CleanedRow {
            timestamp: r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            ghi: r.ghi,
            dni: r.dni,
            dhi: r.dhi,
            mod_a: r.mod_a,
            mod_b: r.mod_b,
            tamb: r.tamb,
            rh: r.rh,
            ws: r.ws,
            ws_gust: r.ws_gust,
            wd: r.wd,
            cleaning: r.cleaning.map(u8::from),
            precipitation: r.precipitation,
            region: r.region.clone(),
        })
        .collect()
}

pub fn regional_rows(stats: &RegionalStats) -> Vec<RegionStatsRow> {
    stats
        .iter()
        .map(|(region, s)| RegionStatsRow {
            region: region.clone(),
            ghi_mean: format_opt(s.ghi_mean, 2),
            ghi_std: format_opt(s.ghi_std, 2),
            ghi_max: format_opt(s.ghi_max, 2),
            dni_median: format_opt(s.dni_median, 2),
            dni_max: format_opt(s.dni_max, 2),
            tamb_mean: format_opt(s.tamb_mean, 2),
            tamb_std: format_opt(s.tamb_std, 2),
            ws_mean: format_opt(s.ws_mean, 2),
            ws_max: format_opt(s.ws_max, 2),
            precipitation_sum: format!("{:.2}", s.precipitation_sum),
        })
        .collect()
}

pub fn impact_rows(impact: &CleaningImpact) -> Vec<ImpactRow> {
    impact
        .iter()
        .map(|(region, i)| ImpactRow {
            region: region.clone(),
            mod_a_improvement: format_opt(i.mod_a_improvement, 4),
            mod_b_improvement: format_opt(i.mod_b_improvement, 4),
            events: i.events,
        })
        .collect()
}

pub fn recommendation_rows(rec: &Recommendation) -> Vec<RecommendationRow> {
    rec.picks
        .iter()
        .map(|p| RecommendationRow {
            decision: p.decision.label().to_string(),
            region: p.region.clone().unwrap_or_else(|| "n/a".to_string()),
            metric: p.value.map(|v| format_number(v, 2)).unwrap_or_default(),
        })
        .collect()
}

pub fn summary_rows(summary: &[ColumnSummary]) -> Vec<SummaryRow> {
    summary
        .iter()
        .map(|s| SummaryRow {
            column: s.column.name().to_string(),
            count: s.count,
            mean: format_opt(s.mean, 2),
            std: format_opt(s.std, 2),
            min: format_opt(s.min, 2),
            q25: format_opt(s.q25, 2),
            median: format_opt(s.median, 2),
            q75: format_opt(s.q75, 2),
            max: format_opt(s.max, 2),
        })
        .collect()
}

/// Plain-text recommendation list.
pub fn recommendations_text(rec: &Recommendation) -> String {
    let mut out = String::from("Strategic Installation Recommendations:\n");
    for p in &rec.picks {
        let region = p.region.as_deref().unwrap_or("n/a");
        let _ = writeln!(out, "- {}: {}", p.decision.label(), region);
    }
    out
}

/// Recommendation as a JSON object keyed by decision label.
pub fn recommendations_json(rec: &Recommendation) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for p in &rec.picks {
        let region = match &p.region {
            Some(r) => serde_json::Value::String(r.clone()),
            None => serde_json::Value::Null,
        };
        map.insert(p.decision.label().to_string(), region);
    }
    serde_json::Value::Object(map)
}

/// Render up to `max_rows` rows as a markdown table.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}\n", render_table(rows, max_rows));
}
