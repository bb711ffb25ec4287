use crate::types::{Column, ColumnSummary, CorrelationMatrix, Dataset};
use crate::util::{max, mean, min, quantile, std_dev};

/// Raw versus cleaned row counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overview {
    pub total_records: usize,
    pub clean_records: usize,
}

impl Overview {
    pub fn new(raw: &Dataset, cleaned: &Dataset) -> Self {
        Overview {
            total_records: raw.len(),
            clean_records: cleaned.len(),
        }
    }

    pub fn removed(&self) -> usize {
        self.total_records.saturating_sub(self.clean_records)
    }
}

/// Count, mean, std, min, quartiles and max for every column in the schema.
pub fn describe(data: &Dataset) -> Vec<ColumnSummary> {
    data.columns()
        .iter()
        .map(|&column| {
            let v = data.present_values(column);
            ColumnSummary {
                column,
                count: v.len(),
                mean: mean(&v),
                std: std_dev(&v),
                min: min(&v),
                q25: quantile(v.clone(), 0.25),
                median: quantile(v.clone(), 0.5),
                q75: quantile(v.clone(), 0.75),
                max: max(&v),
            }
        })
        .collect()
}

/// Columns the correlation table covers by default.
pub fn correlation_columns() -> Vec<Column> {
    Column::SOLAR
        .iter()
        .chain(Column::CLIMATE.iter())
        .copied()
        .collect()
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx.sqrt() * syy.sqrt()))
}

/// Pairwise Pearson correlation using rows where both values are present.
/// Columns missing from the schema are dropped from the table.
pub fn correlation_matrix(data: &Dataset, columns: &[Column]) -> CorrelationMatrix {
    let columns: Vec<Column> = columns
        .iter()
        .copied()
        .filter(|c| data.has_column(*c))
        .collect();
    let values = columns
        .iter()
        .map(|&a| {
            columns
                .iter()
                .map(|&b| {
                    let pairs: Vec<(f64, f64)> = data
                        .records()
                        .iter()
                        .filter_map(|r| Some((r.value(a)?, r.value(b)?)))
                        .collect();
                    pearson(&pairs)
                })
                .collect()
        })
        .collect();
    CorrelationMatrix { columns, values }
}
