//! Typed Row Schema
//! Converts field-keyed CSV records into typed housing and income rows.
//! Missing columns are rejected here; malformed numbers become zero here and nowhere else.

use crate::data::loader::Table;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

pub const HOUSING_COLUMNS: [&str; 7] = [
    "county",
    "region",
    "units_est",
    "buildings_est",
    "residents_est",
    "low_income_households_est",
    "low_income_share_est",
];

pub const INCOME_COLUMNS: [&str; 4] = ["County", "AMI_100_4Person", "80%", "60%"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("{table} table is missing column '{column}'")]
    MissingColumn { table: &'static str, column: String },
}

/// Region label attached to each housing row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Region {
    Metro,
    Valley,
    Southern,
    Central,
    Coast,
    Eastern,
    Other(String),
}

impl Region {
    pub const KNOWN: [Region; 6] = [
        Region::Metro,
        Region::Valley,
        Region::Southern,
        Region::Central,
        Region::Coast,
        Region::Eastern,
    ];

    pub fn parse(label: &str) -> Self {
        match label.trim() {
            "Metro" => Region::Metro,
            "Valley" => Region::Valley,
            "Southern" => Region::Southern,
            "Central" => Region::Central,
            "Coast" => Region::Coast,
            "Eastern" => Region::Eastern,
            other => Region::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Region::Metro => "Metro",
            Region::Valley => "Valley",
            Region::Southern => "Southern",
            Region::Central => "Central",
            Region::Coast => "Coast",
            Region::Eastern => "Eastern",
            Region::Other(label) => label,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One county row of the housing estimates table.
#[derive(Debug, Clone, PartialEq)]
pub struct HousingRow {
    pub county: String,
    pub region: Region,
    pub units: f64,
    pub buildings: f64,
    pub residents: f64,
    pub low_income_households: f64,
    /// Percentage, e.g. 42.5 for "42.5%".
    pub low_income_share: f64,
}

/// One county row of the income-by-county table.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeRow {
    pub county: String,
    pub ami_100: f64,
    pub ami_80: f64,
    pub ami_60: f64,
}

/// Lenient numeric coercion: anything unparseable is zero.
pub fn coerce_number(text: &str) -> f64 {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            if !trimmed.is_empty() {
                debug!(value = text, "non-numeric field coerced to 0");
            }
            0.0
        }
    }
}

fn field<'a>(record: &'a HashMap<String, String>, column: &str) -> &'a str {
    record.get(column).map(String::as_str).unwrap_or("")
}

fn require_columns(
    table: &Table,
    name: &'static str,
    required: &[&str],
) -> Result<(), SchemaError> {
    match required
        .iter()
        .find(|column| !table.columns.iter().any(|c| c == *column))
    {
        Some(missing) => Err(SchemaError::MissingColumn {
            table: name,
            column: missing.to_string(),
        }),
        None => Ok(()),
    }
}

impl HousingRow {
    pub fn from_record(record: &HashMap<String, String>) -> Self {
        Self {
            county: field(record, "county").trim().to_string(),
            region: Region::parse(field(record, "region")),
            units: coerce_number(field(record, "units_est")),
            buildings: coerce_number(field(record, "buildings_est")),
            residents: coerce_number(field(record, "residents_est")),
            low_income_households: coerce_number(field(record, "low_income_households_est")),
            low_income_share: coerce_number(field(record, "low_income_share_est")),
        }
    }
}

impl IncomeRow {
    pub fn from_record(record: &HashMap<String, String>) -> Self {
        Self {
            county: field(record, "County").trim().to_string(),
            ami_100: coerce_number(field(record, "AMI_100_4Person")),
            ami_80: coerce_number(field(record, "80%")),
            ami_60: coerce_number(field(record, "60%")),
        }
    }
}

/// Validate the housing header and convert every row.
pub fn parse_housing(table: &Table) -> Result<Vec<HousingRow>, SchemaError> {
    require_columns(table, "housing", &HOUSING_COLUMNS)?;
    let rows: Vec<HousingRow> = table.rows.iter().map(HousingRow::from_record).collect();

    for row in &rows {
        if let Region::Other(label) = &row.region {
            warn!(county = %row.county, region = %label, "unrecognised region label");
        }
    }

    Ok(rows)
}

/// Validate the income header and convert every row.
pub fn parse_income(table: &Table) -> Result<Vec<IncomeRow>, SchemaError> {
    require_columns(table, "income", &INCOME_COLUMNS)?;
    Ok(table.rows.iter().map(IncomeRow::from_record).collect())
}
