use crate::config::Config;
use crate::errors::{PipelineError, SourceError};
use crate::types::{Column, Dataset, RawRow, Record, COMMENTS_COL, TIMESTAMP_COL};
use crate::util::{parse_f64_safe, parse_flag_safe, parse_timestamp_safe};
use csv::ReaderBuilder;
use log::{debug, error, info, warn};
use rayon::prelude::*;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Outcome of reading one region source.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionLoad {
    pub region: String,
    pub path: PathBuf,
    pub rows: usize,
    /// Rows dropped for an unreadable CSV record or an unparseable timestamp.
    pub rejected_rows: usize,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<RegionLoad>,
    /// One `PipelineError::MissingSource` per region that was left out.
    pub skipped: Vec<PipelineError>,
    pub total_rows: usize,
}

impl LoadReport {
    pub fn skipped_regions(&self) -> Vec<&str> {
        self.skipped
            .iter()
            .filter_map(|e| match e {
                PipelineError::MissingSource { region, .. } => Some(region.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Region label for a configured identifier (`Sierra_Leone` -> `Sierra Leone`).
pub fn region_label(id: &str) -> String {
    id.replace('_', " ")
}

/// Region label from a file named like `RegionName_solar_data.csv`.
pub fn region_from_file_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let region = stem.split('_').next()?.trim();
    if region.is_empty() {
        None
    } else {
        Some(region.to_string())
    }
}

/// Read one region source, tagging every record with `region`.
///
/// The header must carry `Timestamp` and every sensor column; an extra
/// `Comments` column is accepted and anything else is only warned about.
pub fn load_region(path: &Path, region: &str) -> Result<(Dataset, RegionLoad), SourceError> {
    info!("Loading data for {} from {}", region, path.display());
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SourceError::NotFound {
            path: path.to_path_buf(),
        },
        _ => SourceError::IoError {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(file);

    let headers = rdr
        .headers()
        .map_err(|e| SourceError::HeaderReadError {
            path: path.to_path_buf(),
            source: e,
        })?
        .clone();
    let header_names: Vec<&str> = headers.iter().map(str::trim).collect();

    let missing: Vec<String> = std::iter::once(TIMESTAMP_COL)
        .chain(Column::ALL.iter().map(|c| c.name()))
        .filter(|name| !header_names.contains(name))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(SourceError::SchemaMismatch {
            path: path.to_path_buf(),
            missing,
        });
    }
    let extra: Vec<&str> = header_names
        .iter()
        .copied()
        .filter(|h| *h != TIMESTAMP_COL && *h != COMMENTS_COL && Column::from_name(h).is_none())
        .collect();
    if !extra.is_empty() {
        warn!("{}: ignoring unrecognised columns {:?}", path.display(), extra);
    }
    let annotated = header_names.contains(&COMMENTS_COL);

    let mut records: Vec<Record> = Vec::new();
    let mut rejected_rows = 0usize;
    for (idx, result) in rdr.deserialize::<RawRow>().enumerate() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("{}: row {} unreadable: {}", path.display(), idx + 1, e);
                rejected_rows += 1;
                continue;
            }
        };
        let timestamp = match parse_timestamp_safe(row.timestamp.as_deref()) {
            Some(ts) => ts,
            None => {
                debug!(
                    "{}: row {} has unparseable timestamp {:?}",
                    path.display(),
                    idx + 1,
                    row.timestamp
                );
                rejected_rows += 1;
                continue;
            }
        };

        records.push(Record {
            timestamp,
            region: region.to_string(),
            ghi: parse_f64_safe(row.ghi.as_deref()),
            dni: parse_f64_safe(row.dni.as_deref()),
            dhi: parse_f64_safe(row.dhi.as_deref()),
            mod_a: parse_f64_safe(row.mod_a.as_deref()),
            mod_b: parse_f64_safe(row.mod_b.as_deref()),
            tamb: parse_f64_safe(row.tamb.as_deref()),
            rh: parse_f64_safe(row.rh.as_deref()),
            ws: parse_f64_safe(row.ws.as_deref()),
            ws_gust: parse_f64_safe(row.ws_gust.as_deref()),
            wd: parse_f64_safe(row.wd.as_deref()),
            precipitation: parse_f64_safe(row.precipitation.as_deref()),
            cleaning: parse_flag_safe(row.cleaning.as_deref()),
            comments: row
                .comments
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        });
    }

    if records.is_empty() {
        return Err(SourceError::Empty {
            path: path.to_path_buf(),
            rejected: rejected_rows,
        });
    }
    if rejected_rows > 0 {
        warn!("{}: rejected {} rows", path.display(), rejected_rows);
    }

    let load = RegionLoad {
        region: region.to_string(),
        path: path.to_path_buf(),
        rows: records.len(),
        rejected_rows,
    };
    Ok((Dataset::with_schema(records, &Column::ALL, annotated), load))
}

/// Load every configured region and concatenate them in configured order.
///
/// A region whose source is missing or malformed is reported and skipped.
/// Fails with `NoData` only when no region yields records.
pub fn load_all_regions(config: &Config) -> Result<(Dataset, LoadReport), PipelineError> {
    let jobs: Vec<(String, PathBuf)> = config
        .regions
        .iter()
        .map(|id| (region_label(id), config.region_path(id)))
        .collect();
    load_sources(jobs)
}

/// Load explicit files, labelling each by its file name prefix.
pub fn load_files(paths: &[PathBuf]) -> Result<(Dataset, LoadReport), PipelineError> {
    let jobs: Vec<(String, PathBuf)> = paths
        .iter()
        .map(|p| {
            let region = region_from_file_name(p).unwrap_or_else(|| p.display().to_string());
            (region, p.clone())
        })
        .collect();
    load_sources(jobs)
}

fn load_sources(jobs: Vec<(String, PathBuf)>) -> Result<(Dataset, LoadReport), PipelineError> {
    // Each source is independent; `collect` keeps job order.
    let results: Vec<(String, Result<(Dataset, RegionLoad), SourceError>)> = jobs
        .into_par_iter()
        .map(|(region, path)| {
            let result = load_region(&path, &region);
            (region, result)
        })
        .collect();

    let mut report = LoadReport::default();
    let mut parts: Vec<Dataset> = Vec::new();
    for (region, result) in results {
        match result {
            Ok((dataset, load)) => {
                info!("Loaded {} rows for {}", load.rows, region);
                report.total_rows += load.rows;
                report.loaded.push(load);
                parts.push(dataset);
            }
            Err(source) => {
                let err = PipelineError::MissingSource { region, source };
                warn!("Skipping region: {}", err);
                report.skipped.push(err);
            }
        }
    }

    if parts.is_empty() {
        error!("No data loaded for any region");
        return Err(PipelineError::NoData);
    }
    Ok((Dataset::concat(parts), report))
}
