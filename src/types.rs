use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tabled::Tabled;

/// Name of the timestamp column in every region source.
pub const TIMESTAMP_COL: &str = "Timestamp";
/// Name of the free-text annotation column; present in raw data, never analysed.
pub const COMMENTS_COL: &str = "Comments";
/// Name of the region label attached by the loader.
pub const REGION_COL: &str = "Region";

/// Numeric sensor columns carried by a `Record`.
///
/// The serde names match the CSV headers so a `CleaningPolicy` can list
/// columns in a config file exactly as they appear in the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    #[serde(rename = "GHI")]
    Ghi,
    #[serde(rename = "DNI")]
    Dni,
    #[serde(rename = "DHI")]
    Dhi,
    #[serde(rename = "ModA")]
    ModA,
    #[serde(rename = "ModB")]
    ModB,
    #[serde(rename = "Tamb")]
    Tamb,
    #[serde(rename = "RH")]
    Rh,
    #[serde(rename = "WS")]
    Ws,
    #[serde(rename = "WSgust")]
    WsGust,
    #[serde(rename = "WD")]
    Wd,
    #[serde(rename = "Cleaning")]
    Cleaning,
    #[serde(rename = "Precipitation")]
    Precipitation,
}

impl Column {
    /// Every sensor column, in source file order.
    pub const ALL: [Column; 12] = [
        Column::Ghi,
        Column::Dni,
        Column::Dhi,
        Column::ModA,
        Column::ModB,
        Column::Tamb,
        Column::Rh,
        Column::Ws,
        Column::WsGust,
        Column::Wd,
        Column::Cleaning,
        Column::Precipitation,
    ];

    pub const SOLAR: [Column; 5] = [
        Column::Ghi,
        Column::Dni,
        Column::Dhi,
        Column::ModA,
        Column::ModB,
    ];

    pub const CLIMATE: [Column; 4] = [
        Column::Tamb,
        Column::Rh,
        Column::Ws,
        Column::Precipitation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Ghi => "GHI",
            Column::Dni => "DNI",
            Column::Dhi => "DHI",
            Column::ModA => "ModA",
            Column::ModB => "ModB",
            Column::Tamb => "Tamb",
            Column::Rh => "RH",
            Column::Ws => "WS",
            Column::WsGust => "WSgust",
            Column::Wd => "WD",
            Column::Cleaning => "Cleaning",
            Column::Precipitation => "Precipitation",
        }
    }

    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL.iter().copied().find(|c| c.name() == name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One CSV row as read from disk, before any parsing.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Timestamp")]
    pub timestamp: Option<String>,
    #[serde(rename = "GHI")]
    pub ghi: Option<String>,
    #[serde(rename = "DNI")]
    pub dni: Option<String>,
    #[serde(rename = "DHI")]
    pub dhi: Option<String>,
    #[serde(rename = "ModA")]
    pub mod_a: Option<String>,
    #[serde(rename = "ModB")]
    pub mod_b: Option<String>,
    #[serde(rename = "Tamb")]
    pub tamb: Option<String>,
    #[serde(rename = "RH")]
    pub rh: Option<String>,
    #[serde(rename = "WS")]
    pub ws: Option<String>,
    #[serde(rename = "WSgust")]
    pub ws_gust: Option<String>,
    #[serde(rename = "WD")]
    pub wd: Option<String>,
    #[serde(rename = "Precipitation")]
    pub precipitation: Option<String>,
    #[serde(rename = "Cleaning")]
    pub cleaning: Option<String>,
    #[serde(rename = "Comments")]
    pub comments: Option<String>,
}

/// A single timestamped observation for one region.
///
/// Missing cells are `None`. `cleaning` is exposed through `value` as
/// `1.0`/`0.0` so every sensor column can be handled uniformly.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: NaiveDateTime,
    pub region: String,
    pub ghi: Option<f64>,
    pub dni: Option<f64>,
    pub dhi: Option<f64>,
    pub mod_a: Option<f64>,
    pub mod_b: Option<f64>,
    pub tamb: Option<f64>,
    pub rh: Option<f64>,
    pub ws: Option<f64>,
    pub ws_gust: Option<f64>,
    pub wd: Option<f64>,
    pub precipitation: Option<f64>,
    pub cleaning: Option<bool>,
    pub comments: Option<String>,
}

impl Record {
    /// A record with every sensor cell missing.
    pub fn new(timestamp: NaiveDateTime, region: impl Into<String>) -> Self {
        Record {
            timestamp,
            region: region.into(),
            ghi: None,
            dni: None,
            dhi: None,
            mod_a: None,
            mod_b: None,
            tamb: None,
            rh: None,
            ws: None,
            ws_gust: None,
            wd: None,
            precipitation: None,
            cleaning: None,
            comments: None,
        }
    }

    pub fn value(&self, col: Column) -> Option<f64> {
        match col {
            Column::Ghi => self.ghi,
            Column::Dni => self.dni,
            Column::Dhi => self.dhi,
            Column::ModA => self.mod_a,
            Column::ModB => self.mod_b,
            Column::Tamb => self.tamb,
            Column::Rh => self.rh,
            Column::Ws => self.ws,
            Column::WsGust => self.ws_gust,
            Column::Wd => self.wd,
            Column::Precipitation => self.precipitation,
            Column::Cleaning => self.cleaning.map(|c| if c { 1.0 } else { 0.0 }),
        }
    }

    pub fn set_value(&mut self, col: Column, value: Option<f64>) {
        match col {
            Column::Ghi => self.ghi = value,
            Column::Dni => self.dni = value,
            Column::Dhi => self.dhi = value,
            Column::ModA => self.mod_a = value,
            Column::ModB => self.mod_b = value,
            Column::Tamb => self.tamb = value,
            Column::Rh => self.rh = value,
            Column::Ws => self.ws = value,
            Column::WsGust => self.ws_gust = value,
            Column::Wd => self.wd = value,
            Column::Precipitation => self.precipitation = value,
            Column::Cleaning => self.cleaning = value.map(|v| v != 0.0),
        }
    }

    /// Builder-style setter, handy when assembling records by hand.
    pub fn with(mut self, col: Column, value: f64) -> Self {
        self.set_value(col, Some(value));
        self
    }

    /// Whether a maintenance event was flagged at this timestamp.
    pub fn is_cleaning_event(&self) -> bool {
        self.cleaning.unwrap_or(false)
    }
}

/// An ordered, immutable sequence of records plus the schema they came with.
///
/// Row order is chronological within a region and is significant: the
/// cleaning-impact analysis works on row adjacency. Stages never mutate a
/// `Dataset`; they build a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
    columns: Vec<Column>,
    annotated: bool,
}

impl Dataset {
    /// Dataset carrying the full sensor schema and no annotation column.
    pub fn new(records: Vec<Record>) -> Self {
        Dataset {
            records,
            columns: Column::ALL.to_vec(),
            annotated: false,
        }
    }

    /// Dataset with an explicit set of present columns.
    ///
    /// Columns are kept in canonical order regardless of how they are passed.
    pub fn with_schema(records: Vec<Record>, columns: &[Column], annotated: bool) -> Self {
        let columns = Column::ALL
            .iter()
            .copied()
            .filter(|c| columns.contains(c))
            .collect();
        Dataset {
            records,
            columns,
            annotated,
        }
    }

    /// Concatenate per-region datasets, keeping each part's row order.
    ///
    /// The resulting schema is the union of the parts' schemas.
    pub fn concat(parts: Vec<Dataset>) -> Self {
        let mut present: Vec<Column> = Vec::new();
        let mut annotated = false;
        let mut records = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
        for part in parts {
            for c in &part.columns {
                if !present.contains(c) {
                    present.push(*c);
                }
            }
            annotated |= part.annotated;
            records.extend(part.records);
        }
        Dataset::with_schema(records, &present, annotated)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn has_column(&self, col: Column) -> bool {
        self.columns.contains(&col)
    }

    /// Whether the free-text annotation column is part of the schema.
    pub fn is_annotated(&self) -> bool {
        self.annotated
    }

    /// Non-missing values of one column, in row order.
    pub fn present_values(&self, col: Column) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.value(col)).collect()
    }

    /// Distinct region labels, sorted.
    pub fn regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = self.records.iter().map(|r| r.region.clone()).collect();
        regions.sort();
        regions.dedup();
        regions
    }

    pub(crate) fn into_parts(self) -> (Vec<Record>, Vec<Column>, bool) {
        (self.records, self.columns, self.annotated)
    }
}

/// Health metrics for one column of a raw dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnQuality {
    pub column: String,
    pub missing: usize,
    pub zeros: usize,
    /// Only for numeric columns.
    pub negatives: Option<usize>,
    /// Only for columns with a physically meaningful range.
    pub out_of_range: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QualityReport {
    pub columns: Vec<ColumnQuality>,
}

impl QualityReport {
    pub fn get(&self, column: &str) -> Option<&ColumnQuality> {
        self.columns.iter().find(|c| c.column == column)
    }
}

/// Descriptive statistics for one region of a cleaned dataset.
///
/// Values are rounded to 2 decimals. `None` means the statistic is undefined
/// for the region (no values, or a single value for a standard deviation).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStats {
    pub ghi_mean: Option<f64>,
    pub ghi_std: Option<f64>,
    pub ghi_max: Option<f64>,
    pub dni_median: Option<f64>,
    pub dni_max: Option<f64>,
    pub tamb_mean: Option<f64>,
    pub tamb_std: Option<f64>,
    pub ws_mean: Option<f64>,
    pub ws_max: Option<f64>,
    pub precipitation_sum: f64,
}

/// Region label to aggregate metrics, in sorted region order.
pub type RegionalStats = BTreeMap<String, RegionStats>;

/// Mean module-output change around the maintenance events of one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionImpact {
    pub mod_a_improvement: Option<f64>,
    pub mod_b_improvement: Option<f64>,
    pub events: usize,
}

pub type CleaningImpact = BTreeMap<String, RegionImpact>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    BestOverallPotential,
    MostStableRadiation,
    LowestMaintenanceRisk,
    OptimalCspLocation,
}

impl Decision {
    pub const ALL: [Decision; 4] = [
        Decision::BestOverallPotential,
        Decision::MostStableRadiation,
        Decision::LowestMaintenanceRisk,
        Decision::OptimalCspLocation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Decision::BestOverallPotential => "Best Overall Potential",
            Decision::MostStableRadiation => "Most Stable Radiation",
            Decision::LowestMaintenanceRisk => "Lowest Maintenance Risk",
            Decision::OptimalCspLocation => "Optimal CSP Location",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The region chosen for one decision label and the metric that won it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    pub decision: Decision,
    /// `None` when no region has a defined value for the metric.
    pub region: Option<String>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Recommendation {
    pub picks: Vec<Pick>,
}

impl Recommendation {
    pub fn region_for(&self, decision: Decision) -> Option<&str> {
        self.picks
            .iter()
            .find(|p| p.decision == decision)
            .and_then(|p| p.region.as_deref())
    }
}

/// Summary statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: Column,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Pairwise Pearson correlations; `values[i][j]` pairs `columns[i]` with `columns[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<Column>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Column, b: Column) -> Option<f64> {
        let i = self.columns.iter().position(|c| *c == a)?;
        let j = self.columns.iter().position(|c| *c == b)?;
        self.values[i][j]
    }
}

// ---------------------------------------------------------------------------
// Export rows: rendered strings for CSV output and tabled previews.
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct QualityRow {
    #[serde(rename = "Column")]
    #[tabled(rename = "Column")]
    pub column: String,
    #[serde(rename = "Missing")]
    #[tabled(rename = "Missing")]
    pub missing: usize,
    #[serde(rename = "Zeros")]
    #[tabled(rename = "Zeros")]
    pub zeros: usize,
    #[serde(rename = "Negatives")]
    #[tabled(rename = "Negatives")]
    pub negatives: String,
    #[serde(rename = "Out of Range")]
    #[tabled(rename = "Out of Range")]
    pub out_of_range: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct CleanedRow {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "GHI")]
    pub ghi: Option<f64>,
    #[serde(rename = "DNI")]
    pub dni: Option<f64>,
    #[serde(rename = "DHI")]
    pub dhi: Option<f64>,
    #[serde(rename = "ModA")]
    pub mod_a: Option<f64>,
    #[serde(rename = "ModB")]
    pub mod_b: Option<f64>,
    #[serde(rename = "Tamb")]
    pub tamb: Option<f64>,
    #[serde(rename = "RH")]
    pub rh: Option<f64>,
    #[serde(rename = "WS")]
    pub ws: Option<f64>,
    #[serde(rename = "WSgust")]
    pub ws_gust: Option<f64>,
    #[serde(rename = "WD")]
    pub wd: Option<f64>,
    #[serde(rename = "Cleaning")]
    pub cleaning: Option<u8>,
    #[serde(rename = "Precipitation")]
    pub precipitation: Option<f64>,
    #[serde(rename = "Region")]
    pub region: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RegionStatsRow {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "GHI_mean")]
    #[tabled(rename = "GHI_mean")]
    pub ghi_mean: String,
    #[serde(rename = "GHI_std")]
    #[tabled(rename = "GHI_std")]
    pub ghi_std: String,
    #[serde(rename = "GHI_max")]
    #[tabled(rename = "GHI_max")]
    pub ghi_max: String,
    #[serde(rename = "DNI_median")]
    #[tabled(rename = "DNI_median")]
    pub dni_median: String,
    #[serde(rename = "DNI_max")]
    #[tabled(rename = "DNI_max")]
    pub dni_max: String,
    #[serde(rename = "Tamb_mean")]
    #[tabled(rename = "Tamb_mean")]
    pub tamb_mean: String,
    #[serde(rename = "Tamb_std")]
    #[tabled(rename = "Tamb_std")]
    pub tamb_std: String,
    #[serde(rename = "WS_mean")]
    #[tabled(rename = "WS_mean")]
    pub ws_mean: String,
    #[serde(rename = "WS_max")]
    #[tabled(rename = "WS_max")]
    pub ws_max: String,
    #[serde(rename = "Precipitation_sum")]
    #[tabled(rename = "Precipitation_sum")]
    pub precipitation_sum: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ImpactRow {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "ModA_Improvement")]
    #[tabled(rename = "ModA_Improvement")]
    pub mod_a_improvement: String,
    #[serde(rename = "ModB_Improvement")]
    #[tabled(rename = "ModB_Improvement")]
    pub mod_b_improvement: String,
    #[serde(rename = "Events")]
    #[tabled(rename = "Events")]
    pub events: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RecommendationRow {
    #[serde(rename = "Decision")]
    #[tabled(rename = "Decision")]
    pub decision: String,
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SummaryRow {
    #[serde(rename = "Column")]
    #[tabled(rename = "Column")]
    pub column: String,
    #[serde(rename = "count")]
    #[tabled(rename = "count")]
    pub count: usize,
    #[serde(rename = "mean")]
    #[tabled(rename = "mean")]
    pub mean: String,
    #[serde(rename = "std")]
    #[tabled(rename = "std")]
    pub std: String,
    #[serde(rename = "min")]
    #[tabled(rename = "min")]
    pub min: String,
    #[serde(rename = "25%")]
    #[tabled(rename = "25%")]
    pub q25: String,
    #[serde(rename = "50%")]
    #[tabled(rename = "50%")]
    pub median: String,
    #[serde(rename = "75%")]
    #[tabled(rename = "75%")]
    pub q75: String,
    #[serde(rename = "max")]
    #[tabled(rename = "max")]
    pub max: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 8, 9)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    #[test]
    fn column_names_round_trip() {
        for col in Column::ALL {
            assert_eq!(Column::from_name(col.name()), Some(col));
        }
        assert_eq!(Column::from_name("Comments"), None);
    }

    #[test]
    fn cleaning_flag_is_exposed_as_number() {
        let mut r = Record::new(ts(0), "Benin");
        assert_eq!(r.value(Column::Cleaning), None);
        r.set_value(Column::Cleaning, Some(1.0));
        assert!(r.is_cleaning_event());
        assert_eq!(r.value(Column::Cleaning), Some(1.0));
        r.set_value(Column::Cleaning, Some(0.0));
        assert!(!r.is_cleaning_event());
    }

    #[test]
    fn concat_keeps_part_order_and_unions_schema() {
        let a = Dataset::with_schema(
            vec![Record::new(ts(0), "A").with(Column::Ghi, 1.0)],
            &[Column::Ghi],
            true,
        );
        let b = Dataset::with_schema(
            vec![
                Record::new(ts(0), "B").with(Column::Tamb, 20.0),
                Record::new(ts(1), "B").with(Column::Tamb, 21.0),
            ],
            &[Column::Tamb],
            false,
        );
        let all = Dataset::concat(vec![a, b]);
        assert_eq!(all.len(), 3);
        assert_eq!(all.records()[0].region, "A");
        assert_eq!(all.records()[2].tamb, Some(21.0));
        assert_eq!(all.columns(), &[Column::Ghi, Column::Tamb]);
        assert!(all.is_annotated());
        assert_eq!(all.regions(), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn schema_is_kept_in_canonical_order() {
        let ds = Dataset::with_schema(vec![], &[Column::Ws, Column::Ghi], false);
        assert_eq!(ds.columns(), &[Column::Ghi, Column::Ws]);
        assert!(!ds.has_column(Column::Dni));
    }
}
