use crate::types::Column;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading config file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse TOML configuration in {path}: {source}")]
    TomlParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid configuration value for '{field}': {message}")]
    Invalid { field: String, message: String },
}

/// Why a single region's source could not be turned into records.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Data file not found at {path}")]
    NotFound { path: PathBuf },
    #[error("IO error reading data file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Error reading CSV headers in {path}: {source}")]
    HeaderReadError {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Schema mismatch in {path}: missing columns {missing:?}")]
    SchemaMismatch { path: PathBuf, missing: Vec<String> },
    #[error("No usable rows in {path} ({rejected} rows rejected)")]
    Empty { path: PathBuf, rejected: usize },
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("CSV write failed for {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("JSON serialization failed for {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to load region '{region}': {source}")]
    MissingSource {
        region: String,
        #[source]
        source: SourceError,
    },
    #[error("No valid data available for any region")]
    NoData,
    #[error("Missing required column '{column}' for {stage}")]
    MissingColumn { stage: &'static str, column: Column },
    #[error("{stage} requires at least one row but the dataset is empty")]
    EmptyResult { stage: &'static str },
    #[error("Configuration failed: {0}")]
    Config(#[from] ConfigError),
    #[error("Export failed: {0}")]
    Output(#[from] OutputError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
