//! Statistics Calculator Module
//! Per-region summaries over the merged county records.

use crate::data::{MergedRecord, Region};
use statrs::statistics::{Data, Median, Statistics};
use std::collections::BTreeMap;

/// Summary of one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSummary {
    pub region: Region,
    pub counties: usize,
    pub total_units: f64,
    pub mean_units: f64,
    pub median_units: f64,
    pub total_low_income_households: f64,
}

/// Handles summary statistics for regions.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Summaries for every region present, largest total units first.
    pub fn region_summaries(records: &[MergedRecord]) -> Vec<RegionSummary> {
        let mut by_region: BTreeMap<&Region, Vec<&MergedRecord>> = BTreeMap::new();
        for record in records {
            by_region.entry(&record.region).or_default().push(record);
        }

        let mut summaries: Vec<RegionSummary> = by_region
            .into_iter()
            .map(|(region, members)| Self::summarize(region, &members))
            .collect();

        summaries.sort_by(|a, b| {
            b.total_units
                .partial_cmp(&a.total_units)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        summaries
    }

    fn summarize(region: &Region, members: &[&MergedRecord]) -> RegionSummary {
        let units: Vec<f64> = members.iter().map(|r| r.units).collect();

        RegionSummary {
            region: region.clone(),
            counties: members.len(),
            total_units: units.iter().sum(),
            mean_units: units.iter().mean(),
            median_units: Data::new(units.clone()).median(),
            total_low_income_households: members.iter().map(|r| r.low_income_households).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CountyJoiner, PopulationTable};
    use crate::data::schema::HousingRow;

    fn records() -> Vec<MergedRecord> {
        let rows: Vec<HousingRow> = [
            ("Multnomah", "Metro", 60_000.0),
            ("Washington", "Metro", 30_000.0),
            ("Clackamas", "Metro", 15_000.0),
            ("Baker", "Eastern", 400.0),
            ("Union", "Eastern", 800.0),
        ]
        .iter()
        .map(|(county, region, units)| HousingRow {
            county: county.to_string(),
            region: Region::parse(region),
            units: *units,
            buildings: 0.0,
            residents: 0.0,
            low_income_households: 100.0,
            low_income_share: 0.0,
        })
        .collect();
        CountyJoiner::merge(&rows, &[], &PopulationTable::default())
    }

    #[test]
    fn summaries_are_ordered_by_total_units() {
        let summaries = StatsCalculator::region_summaries(&records());
        assert_eq!(summaries.len(), 2);

        let metro = &summaries[0];
        assert_eq!(metro.region, Region::Metro);
        assert_eq!(metro.counties, 3);
        assert_eq!(metro.total_units, 105_000.0);
        assert_eq!(metro.mean_units, 35_000.0);
        assert_eq!(metro.median_units, 30_000.0);
        assert_eq!(metro.total_low_income_households, 300.0);

        let eastern = &summaries[1];
        assert_eq!(eastern.median_units, 600.0);
    }

    #[test]
    fn empty_input_has_no_summaries() {
        assert!(StatsCalculator::region_summaries(&[]).is_empty());
    }
}
