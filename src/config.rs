use crate::errors::ConfigError;
use crate::types::Column;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Rules the cleaner applies, in the order the cleaner applies them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CleaningPolicy {
    /// Columns floored at zero.
    pub solar_columns: Vec<Column>,
    /// Closed range relative humidity is clipped to.
    pub rh_bounds: (f64, f64),
    pub iqr_multiplier: f64,
    /// Columns checked for outliers, in checking order. Rejection is
    /// cumulative, so the order changes the result.
    pub outlier_columns: Vec<Column>,
    /// Repeat the outlier pass until it removes nothing. Off by default:
    /// the standard cleaning runs the pass exactly once.
    pub converge: bool,
}

impl Default for CleaningPolicy {
    fn default() -> Self {
        let solar_columns = Column::SOLAR.to_vec();
        let mut outlier_columns = solar_columns.clone();
        outlier_columns.extend([Column::Tamb, Column::Ws]);
        CleaningPolicy {
            solar_columns,
            rh_bounds: (0.0, 100.0),
            iqr_multiplier: 1.5,
            outlier_columns,
            converge: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub regions: Vec<String>,
    /// Appended to a region identifier to name its source file.
    pub file_suffix: String,
    pub policy: CleaningPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("./data/raw"),
            output_dir: PathBuf::from("./data/processed"),
            regions: vec![
                "Benin".to_string(),
                "Sierraleon".to_string(),
                "Togo".to_string(),
            ],
            file_suffix: "_solar_data.csv".to_string(),
            policy: CleaningPolicy::default(),
        }
    }
}

impl Config {
    /// Load a TOML config file. Keys left out keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let policy = &self.policy;
        if !(policy.iqr_multiplier.is_finite() && policy.iqr_multiplier > 0.0) {
            return Err(ConfigError::Invalid {
                field: "policy.iqr_multiplier".to_string(),
                message: format!("must be a positive number, got {}", policy.iqr_multiplier),
            });
        }
        let (lo, hi) = policy.rh_bounds;
        if !(lo.is_finite() && hi.is_finite()) || lo > hi {
            return Err(ConfigError::Invalid {
                field: "policy.rh_bounds".to_string(),
                message: format!("lower bound {} exceeds upper bound {}", lo, hi),
            });
        }
        if self.file_suffix.is_empty() {
            return Err(ConfigError::Invalid {
                field: "file_suffix".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Source file for a region identifier.
    pub fn region_path(&self, region: &str) -> PathBuf {
        self.data_dir.join(format!("{}{}", region, self.file_suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_policy() {
        let policy = CleaningPolicy::default();
        assert_eq!(
            policy.outlier_columns,
            vec![
                Column::Ghi,
                Column::Dni,
                Column::Dhi,
                Column::ModA,
                Column::ModB,
                Column::Tamb,
                Column::Ws
            ]
        );
        assert_eq!(policy.iqr_multiplier, 1.5);
        assert_eq!(policy.rh_bounds, (0.0, 100.0));
        assert!(!policy.converge);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            regions = ["Togo"]
            [policy]
            outlier_columns = ["GHI", "WS"]
            converge = true
            "#,
        )
        .unwrap();
        assert_eq!(config.regions, vec!["Togo".to_string()]);
        assert_eq!(config.policy.outlier_columns, vec![Column::Ghi, Column::Ws]);
        assert!(config.policy.converge);
        assert_eq!(config.policy.solar_columns, Column::SOLAR.to_vec());
        assert_eq!(config.file_suffix, "_solar_data.csv");
    }

    #[test]
    fn rejects_inverted_rh_bounds() {
        let mut config = Config::default();
        config.policy.rh_bounds = (100.0, 0.0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn rejects_unknown_column_names() {
        let parsed: Result<Config, _> = toml::from_str("[policy]\nsolar_columns = [\"Foo\"]");
        assert!(parsed.is_err());
    }

    #[test]
    fn region_path_joins_suffix() {
        let config = Config::default();
        assert_eq!(
            config.region_path("Togo"),
            PathBuf::from("./data/raw").join("Togo_solar_data.csv")
        );
    }
}
