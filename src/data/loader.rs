//! Data Loader Module
//! Fetches the housing and income tables plus the county topology, and parses CSV text
//! into field-keyed records using Polars.

use crate::config::AppConfig;
use crate::data::processor::{CountyJoiner, MergedRecord};
use crate::data::population::PopulationTable;
use crate::data::schema::{self, SchemaError};
use crate::geo::{GeoFeature, TopologyDecoder, TopologyError};
use polars::prelude::*;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to fetch {source_name}: {message}")]
    Http {
        source_name: String,
        message: String,
    },
    #[error("Failed to read {path}: {error}")]
    Io {
        path: String,
        error: std::io::Error,
    },
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Parsed CSV: header names in source order, one map per row keyed by those names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Everything the presenters need after a successful load.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub records: Vec<MergedRecord>,
    pub features: Vec<GeoFeature>,
}

/// Loads the input resources. One attempt per resource; any failure aborts the whole load.
pub struct DataLoader;

impl DataLoader {
    /// Read a resource from an http(s) URL or a local path.
    pub fn read_source(source: &str) -> Result<Vec<u8>, LoaderError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            debug!(url = source, "fetching remote resource");
            let response = ureq::get(source).call().map_err(|e| LoaderError::Http {
                source_name: source.to_string(),
                message: e.to_string(),
            })?;

            let mut bytes = Vec::new();
            response
                .into_reader()
                .read_to_end(&mut bytes)
                .map_err(|error| LoaderError::Io {
                    path: source.to_string(),
                    error,
                })?;
            Ok(bytes)
        } else {
            std::fs::read(Path::new(source)).map_err(|error| LoaderError::Io {
                path: source.to_string(),
                error,
            })
        }
    }

    /// Parse CSV bytes into a table. Every column is read as text.
    pub fn parse_table(bytes: Vec<u8>) -> Result<Table, LoaderError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;

        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut rows: Vec<HashMap<String, String>> = vec![HashMap::new(); df.height()];
        for name in &columns {
            let series = df.column(name)?.as_materialized_series();
            let values = series.str()?;
            for (row, value) in rows.iter_mut().zip(values.into_iter()) {
                row.insert(name.clone(), value.unwrap_or_default().to_string());
            }
        }

        Ok(Table { columns, rows })
    }

    /// Read and parse one CSV resource.
    pub fn load_table(source: &str) -> Result<Table, LoaderError> {
        let table = Self::parse_table(Self::read_source(source)?)?;
        info!(source, rows = table.len(), columns = table.columns.len(), "loaded table");
        Ok(table)
    }

    /// Load the housing and income tables concurrently.
    pub fn load_tables(config: &AppConfig) -> Result<(Table, Table), LoaderError> {
        let (housing, income) = rayon::join(
            || Self::load_table(&config.sources.housing),
            || Self::load_table(&config.sources.income),
        );
        Ok((housing?, income?))
    }

    /// Tables, join, then topology.
    pub fn load_all(
        config: &AppConfig,
        mut progress: impl FnMut(&str),
    ) -> Result<LoadedData, LoaderError> {
        let started = Instant::now();

        progress("Reading housing and income tables...");
        let (housing_table, income_table) = Self::load_tables(config)?;
        let housing = schema::parse_housing(&housing_table)?;
        let income = schema::parse_income(&income_table)?;

        progress("Joining counties...");
        let records = CountyJoiner::merge(&housing, &income, &PopulationTable::default());

        progress("Fetching county boundaries...");
        let topology = Self::read_source(&config.sources.topology)?;
        let features = TopologyDecoder::decode_state(
            &topology,
            &config.sources.topology_object,
            &config.sources.state_fips_prefix,
        )?;

        info!(
            records = records.len(),
            features = features.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "load complete"
        );

        Ok(LoadedData { records, features })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_table_keeps_column_names_and_quoting() {
        let csv = "County,AMI_100_4Person,60%,80%\n\"Benton County\",\"104,300\",62580,83440\nLinn County,,48840,65120\n";
        let table = DataLoader::parse_table(csv.as_bytes().to_vec()).unwrap();

        assert_eq!(table.columns, vec!["County", "AMI_100_4Person", "60%", "80%"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0]["County"], "Benton County");
        assert_eq!(table.rows[0]["AMI_100_4Person"], "104,300");
        assert_eq!(table.rows[1]["AMI_100_4Person"], "");
        assert_eq!(table.rows[1]["80%"], "65120");
    }

    #[test]
    fn numeric_looking_columns_stay_text() {
        let csv = "county,units_est\nBaker,00120\n";
        let table = DataLoader::parse_table(csv.as_bytes().to_vec()).unwrap();
        assert_eq!(table.rows[0]["units_est"], "00120");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        let err = DataLoader::load_table(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, LoaderError::Io { .. }));
    }

    #[test]
    fn load_tables_reads_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let housing_path = dir.path().join("housing.csv");
        let income_path = dir.path().join("income.csv");
        let mut housing = std::fs::File::create(&housing_path).unwrap();
        writeln!(housing, "county,region,units_est\nBaker,Eastern,120").unwrap();
        let mut income = std::fs::File::create(&income_path).unwrap();
        writeln!(income, "County,AMI_100_4Person\nBaker County,81400").unwrap();

        let mut config = AppConfig::default();
        config.sources.housing = housing_path.to_string_lossy().to_string();
        config.sources.income = income_path.to_string_lossy().to_string();

        let (housing, income) = DataLoader::load_tables(&config).unwrap();
        assert_eq!(housing.rows[0]["county"], "Baker");
        assert_eq!(income.rows[0]["County"], "Baker County");
    }

    #[test]
    fn load_tables_fails_as_a_whole() {
        let dir = tempfile::tempdir().unwrap();
        let housing_path = dir.path().join("housing.csv");
        std::fs::write(&housing_path, "county\nBaker\n").unwrap();

        let mut config = AppConfig::default();
        config.sources.housing = housing_path.to_string_lossy().to_string();
        config.sources.income = dir.path().join("missing.csv").to_string_lossy().to_string();

        assert!(DataLoader::load_tables(&config).is_err());
    }
}
