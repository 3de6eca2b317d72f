//! County Join Module
//! Matches housing rows to income rows by county name and derives per-county metrics.

use crate::data::population::PopulationTable;
use crate::data::schema::{HousingRow, IncomeRow, Region};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Income thresholds for a four-person household.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IncomeThresholds {
    pub ami_100: f64,
    pub ami_80: f64,
    pub ami_60: f64,
}

/// Joined and derived data for one county.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecord {
    /// Stripped county name; unique across the merged set.
    pub key: String,
    /// County label as it appears in the housing table.
    pub county: String,
    pub region: Region,
    pub units: f64,
    pub buildings: f64,
    pub residents: f64,
    pub low_income_households: f64,
    pub low_income_share: f64,
    pub income: Option<IncomeThresholds>,
    pub population: u64,
    /// Units per 1,000 population, rounded to 2 decimals.
    pub units_per_1000: f64,
    /// Units per 1,000 residents, unrounded.
    pub units_per_1000_residents: f64,
    /// Buildings / 10. No area normalization.
    pub density: f64,
}

impl MergedRecord {
    /// Four-person AMI; a blank or non-positive cell counts as missing.
    pub fn ami_100(&self) -> Option<f64> {
        self.income.map(|i| i.ami_100).filter(|ami| *ami > 0.0)
    }
}

/// True for synthetic aggregate rows ("... region total", or em-dash separated labels).
pub fn is_aggregate(county: &str) -> bool {
    county.to_lowercase().contains("region total") || county.contains('\u{2014}')
}

/// Remove a trailing parenthetical annotation: "Lane (IOU clip)" -> "Lane".
pub fn strip_clip_annotation(county: &str) -> &str {
    let trimmed = county.trim();
    if trimmed.ends_with(')') {
        if let Some(open) = trimmed.rfind('(') {
            return trimmed[..open].trim_end();
        }
    }
    trimmed
}

/// Comparison form of a county name: lowercase, no annotation, no "County" suffix.
pub fn normalize_county(name: &str) -> String {
    let lowered = strip_clip_annotation(name).to_lowercase();
    let stripped = lowered.strip_suffix(" county").unwrap_or(&lowered);
    stripped.trim().to_string()
}

/// Pick the candidate matching `name`.
///
/// Exact normalized equality wins first. Otherwise any candidate where one name contains
/// the other qualifies, and the longest candidate name wins; ties go to the earliest
/// candidate.
pub fn match_county<'a, T>(
    name: &str,
    candidates: &'a [T],
    candidate_name: impl Fn(&T) -> &str,
) -> Option<&'a T> {
    let target = normalize_county(name);
    if target.is_empty() {
        return None;
    }

    let normalized: Vec<String> = candidates
        .iter()
        .map(|c| normalize_county(candidate_name(c)))
        .collect();

    if let Some(idx) = normalized.iter().position(|n| *n == target) {
        return candidates.get(idx);
    }

    let mut best: Option<(usize, usize)> = None;
    for (idx, n) in normalized.iter().enumerate() {
        if n.is_empty() || !(n.contains(&target) || target.contains(n.as_str())) {
            continue;
        }
        match best {
            Some((_, len)) if len >= n.len() => {}
            _ => best = Some((idx, n.len())),
        }
    }

    best.and_then(|(idx, _)| candidates.get(idx))
}

/// Rate per 1,000 of `base`; never negative.
fn per_thousand(units: f64, base: f64) -> f64 {
    if base > 0.0 {
        (units / base * 1000.0).max(0.0)
    } else {
        0.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Joins the housing and income tables.
pub struct CountyJoiner;

impl CountyJoiner {
    /// Derive one record from a housing row and its income match.
    pub fn derive(
        housing: &HousingRow,
        income: Option<&IncomeRow>,
        population: &PopulationTable,
    ) -> MergedRecord {
        let key = strip_clip_annotation(&housing.county).to_string();
        let population = population.get(&key);

        MergedRecord {
            county: housing.county.clone(),
            region: housing.region.clone(),
            units: housing.units,
            buildings: housing.buildings,
            residents: housing.residents,
            low_income_households: housing.low_income_households,
            low_income_share: housing.low_income_share,
            income: income.map(|row| IncomeThresholds {
                ami_100: row.ami_100,
                ami_80: row.ami_80,
                ami_60: row.ami_60,
            }),
            population,
            units_per_1000: round2(per_thousand(housing.units, population as f64)),
            units_per_1000_residents: per_thousand(housing.units, housing.residents),
            density: housing.buildings / 10.0,
            key,
        }
    }

    /// Produce one merged record per distinct county, in housing-table order.
    pub fn merge(
        housing: &[HousingRow],
        income: &[IncomeRow],
        population: &PopulationTable,
    ) -> Vec<MergedRecord> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut records = Vec::with_capacity(housing.len());
        let mut unmatched = 0usize;

        for row in housing {
            if is_aggregate(&row.county) {
                debug!(county = %row.county, "skipping aggregate row");
                continue;
            }

            let key = strip_clip_annotation(&row.county);
            if key.is_empty() {
                warn!("skipping housing row with empty county name");
                continue;
            }
            if !seen.insert(key.to_string()) {
                warn!(county = %row.county, "duplicate county dropped");
                continue;
            }

            let income_match = match_county(key, income, |r| r.county.as_str());
            if income_match.is_none() {
                unmatched += 1;
                debug!(county = %row.county, "no income match");
            }

            records.push(Self::derive(row, income_match, population));
        }

        info!(
            counties = records.len(),
            without_income = unmatched,
            "merged housing and income tables"
        );
        records
    }

    /// Find a record by display label or stripped key.
    pub fn find<'a>(records: &'a [MergedRecord], county: &str) -> Option<&'a MergedRecord> {
        records
            .iter()
            .find(|r| r.county == county)
            .or_else(|| records.iter().find(|r| r.key == county))
    }

    /// County display labels, sorted, for selectors.
    pub fn county_labels(records: &[MergedRecord]) -> Vec<String> {
        let mut labels: Vec<String> = records.iter().map(|r| r.county.clone()).collect();
        labels.sort();
        labels
    }
}
