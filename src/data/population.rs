//! Static county population estimates, keyed by stripped county name.

use std::collections::HashMap;

const POPULATION_ESTIMATES: [(&str, u64); 34] = [
    ("Multnomah", 820_000),
    ("Washington", 650_000),
    ("Clackamas", 430_000),
    ("Marion", 385_000),
    ("Lane", 300_000),
    ("Linn", 130_000),
    ("Benton", 95_000),
    ("Polk", 87_000),
    ("Yamhill", 110_000),
    ("Jackson", 230_000),
    ("Josephine", 89_000),
    ("Douglas", 111_000),
    ("Klamath", 67_000),
    ("Lake", 8_000),
    ("Deschutes", 200_000),
    ("Crook", 25_000),
    ("Jefferson", 25_000),
    ("Lincoln", 50_000),
    ("Coos", 65_000),
    ("Clatsop", 40_000),
    ("Tillamook", 26_000),
    ("Curry", 23_000),
    ("Umatilla", 77_000),
    ("Morrow", 12_000),
    ("Wasco", 27_000),
    ("Hood River", 24_000),
    ("Union", 26_000),
    ("Baker", 16_000),
    ("Malheur", 32_000),
    ("Wallowa", 7_000),
    ("Grant", 7_200),
    ("Harney", 7_400),
    ("Gilliam", 1_800),
    ("Sherman", 1_900),
];

/// County name to population estimate.
pub struct PopulationTable {
    by_county: HashMap<String, u64>,
}

impl Default for PopulationTable {
    fn default() -> Self {
        Self::from_entries(POPULATION_ESTIMATES.iter().copied())
    }
}

impl PopulationTable {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        Self {
            by_county: entries
                .into_iter()
                .map(|(county, population)| (county.to_string(), population))
                .collect(),
        }
    }

    /// Population for a stripped county name, zero when unknown.
    pub fn get(&self, county: &str) -> u64 {
        self.by_county.get(county).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.by_county.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_uses_stripped_names() {
        let table = PopulationTable::default();
        assert_eq!(table.len(), 34);
        assert_eq!(table.get("Lane"), 300_000);
        assert_eq!(table.get("Lane (IOU clip)"), 0);
        assert_eq!(table.get("Atlantis"), 0);
    }
}
