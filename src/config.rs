//! Application Configuration
//! Data sources, chart limits and map defaults, loaded from an optional JSON file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "housing_explorer.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Where the three input resources come from. Each entry is a local path or an http(s) URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub housing: String,
    pub income: String,
    pub topology: String,
    /// Name of the TopoJSON object holding county geometries.
    pub topology_object: String,
    /// Features whose id starts with this prefix belong to the state.
    pub state_fips_prefix: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            housing: "data/raw/multifamily_estimates.csv".to_string(),
            income: "data/raw/ami_by_county.csv".to_string(),
            topology: "https://cdn.jsdelivr.net/npm/us-atlas@3/counties-10m.json".to_string(),
            topology_object: "counties".to_string(),
            state_fips_prefix: "41".to_string(),
        }
    }
}

/// How many bars each ranked chart keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartLimits {
    pub income: usize,
    pub low_income: usize,
    pub per_capita: usize,
}

impl Default for ChartLimits {
    fn default() -> Self {
        Self {
            income: 15,
            low_income: 12,
            per_capita: 15,
        }
    }
}

/// Map projection and filter defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Projection center as [longitude, latitude] in degrees.
    pub center: [f64; 2],
    pub scale: f64,
    /// Range of the income threshold slider.
    pub income_range: [f64; 2],
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: [-120.5, 43.8],
            scale: 4500.0,
            income_range: [81_400.0, 124_100.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sources: SourceConfig,
    pub chart_limits: ChartLimits,
    pub map: MapConfig,
    /// Counties preselected in the three comparison slots.
    pub comparison: [String; 3],
    pub window_size: [f32; 2],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sources: SourceConfig::default(),
            chart_limits: ChartLimits::default(),
            map: MapConfig::default(),
            comparison: [
                "Multnomah".to_string(),
                "Deschutes".to_string(),
                "Jackson".to_string(),
            ],
            window_size: [1400.0, 860.0],
        }
    }
}

impl AppConfig {
    /// Load config from a JSON file. Fields absent from the file keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve config: explicit path, then `housing_explorer.json` in the working directory,
    /// then built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            Self::from_file(fallback)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "sources": {{ "housing": "other.csv" }}, "chart_limits": {{ "income": 5 }} }}"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.sources.housing, "other.csv");
        assert_eq!(config.sources.income, SourceConfig::default().income);
        assert_eq!(config.chart_limits.income, 5);
        assert_eq!(config.chart_limits.low_income, 12);
        assert_eq!(config.map, MapConfig::default());
    }

    #[test]
    fn invalid_json_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            AppConfig::resolve(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }
}
