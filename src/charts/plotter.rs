//! Chart Plotter Module
//! Ranked bar charts over the merged county records, drawn with egui_plot.

use crate::charts::format::{format_currency, format_thousands};
use crate::charts::palette::region_color;
use crate::config::ChartLimits;
use crate::data::{MergedRecord, Region};
use crate::state::ChartMetric;
use crate::stats::StatsCalculator;
use egui_plot::{Bar, BarChart, Plot};
use std::cmp::Ordering;

/// One bar: category label, value and the region that colors it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub label: String,
    pub value: f64,
    pub region: Region,
    /// Hover text.
    pub detail: String,
}

/// Everything needed to draw one chart variant.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub metric: ChartMetric,
    pub title: &'static str,
    pub category_label: &'static str,
    pub value_label: &'static str,
    /// Bars run left to right from the category axis when true.
    pub horizontal: bool,
    /// Sorted by value, largest first.
    pub bars: Vec<ChartBar>,
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Sort descending by `value` (stable, so ties keep source order) and keep `limit`.
fn top_by<'a>(
    records: impl Iterator<Item = &'a MergedRecord>,
    value: impl Fn(&MergedRecord) -> f64,
    limit: usize,
) -> Vec<(&'a MergedRecord, f64)> {
    let mut ranked: Vec<(&MergedRecord, f64)> = records.map(|r| (r, value(r))).collect();
    ranked.sort_by(|a, b| descending(a.1, b.1));
    ranked.truncate(limit);
    ranked
}

impl ChartSpec {
    pub fn build(metric: ChartMetric, records: &[MergedRecord], limits: &ChartLimits) -> Self {
        let (category_label, value_label, horizontal, bars) = match metric {
            ChartMetric::UnitsByRegion => {
                let bars = StatsCalculator::region_summaries(records)
                    .into_iter()
                    .map(|s| ChartBar {
                        label: s.region.to_string(),
                        value: s.total_units,
                        detail: format!(
                            "{}\nUnits: {}\nCounties: {}\nMean per county: {}\nMedian per county: {}",
                            s.region,
                            format_thousands(s.total_units),
                            s.counties,
                            format_thousands(s.mean_units),
                            format_thousands(s.median_units),
                        ),
                        region: s.region,
                    })
                    .collect();
                ("Region", "Estimated Units", false, bars)
            }
            ChartMetric::Income => {
                let ranked = top_by(
                    records.iter().filter(|r| r.ami_100().is_some()),
                    |r| r.ami_100().unwrap_or(0.0),
                    limits.income,
                );
                let bars = ranked
                    .into_iter()
                    .map(|(r, v)| Self::county_bar(r, v, format_currency(Some(v))))
                    .collect();
                ("County", "AMI (100%)", true, bars)
            }
            ChartMetric::LowIncome => {
                let ranked = top_by(
                    records.iter(),
                    |r| r.low_income_households,
                    limits.low_income,
                );
                let bars = ranked
                    .into_iter()
                    .map(|(r, v)| Self::county_bar(r, v, format_thousands(v)))
                    .collect();
                ("County", "Low-Income Households", true, bars)
            }
            ChartMetric::PerCapita => {
                let ranked = top_by(
                    records.iter().filter(|r| r.units_per_1000 > 0.0),
                    |r| r.units_per_1000,
                    limits.per_capita,
                );
                let bars = ranked
                    .into_iter()
                    .map(|(r, v)| Self::county_bar(r, v, format!("{v:.2}")))
                    .collect();
                ("County", "Units per 1,000", true, bars)
            }
        };

        Self {
            metric,
            title: metric.title(),
            category_label,
            value_label,
            horizontal,
            bars,
        }
    }

    fn county_bar(record: &MergedRecord, value: f64, shown: String) -> ChartBar {
        ChartBar {
            label: record.county.clone(),
            value,
            region: record.region.clone(),
            detail: format!("{} ({})\n{}", record.county, record.region, shown),
        }
    }

    pub fn max_value(&self) -> f64 {
        self.bars.iter().map(|b| b.value).fold(0.0, f64::max)
    }
}

/// Draws chart specs with egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Position of bar `index` on the category axis. Horizontal charts list the largest
    /// bar at the top.
    pub fn category_position(spec: &ChartSpec, index: usize) -> f64 {
        if spec.horizontal {
            (spec.bars.len() - 1 - index) as f64
        } else {
            index as f64
        }
    }

    fn category_formatter(spec: &ChartSpec) -> impl Fn(f64) -> String + 'static {
        let mut labels: Vec<String> = spec.bars.iter().map(|b| b.label.clone()).collect();
        if spec.horizontal {
            labels.reverse();
        }
        move |value: f64| {
            let idx = value.round();
            if (value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        }
    }

    pub fn draw_bar_chart(ui: &mut egui::Ui, spec: &ChartSpec, height: f32) {
        let bars: Vec<Bar> = spec
            .bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let color = region_color(&bar.region).to_color32();
                Bar::new(Self::category_position(spec, i), bar.value)
                    .name(&bar.detail)
                    .fill(color.gamma_multiply(0.85))
                    .stroke(egui::Stroke::new(1.0, color))
                    .width(if spec.horizontal { 0.8 } else { 0.7 })
            })
            .collect();

        let mut chart = BarChart::new(bars)
            .element_formatter(Box::new(|bar: &Bar, _chart: &BarChart| bar.name.clone()));
        if spec.horizontal {
            chart = chart.horizontal();
        }

        let categories = Self::category_formatter(spec);
        let value_formatter = |mark: egui_plot::GridMark, _range: &std::ops::RangeInclusive<f64>| {
            format_thousands(mark.value)
        };

        let mut plot = Plot::new(format!("chart_{:?}", spec.metric))
            .height(height)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .show_x(false)
            .show_y(false)
            .include_x(0.0)
            .include_y(0.0);

        if spec.horizontal {
            plot = plot
                .x_axis_label(spec.value_label)
                .y_axis_label(spec.category_label)
                .x_axis_formatter(value_formatter)
                .y_axis_formatter(move |mark, _range| categories(mark.value));
        } else {
            plot = plot
                .x_axis_label(spec.category_label)
                .y_axis_label(spec.value_label)
                .x_axis_formatter(move |mark, _range| categories(mark.value))
                .y_axis_formatter(value_formatter);
        }

        plot.show(ui, |plot_ui| {
            plot_ui.bar_chart(chart);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{HousingRow, IncomeRow};
    use crate::data::{CountyJoiner, PopulationTable};

    fn records() -> Vec<MergedRecord> {
        let housing: Vec<HousingRow> = [
            ("Multnomah", "Metro", 60_000.0, 9_000.0),
            ("Lane (IOU clip)", "Valley", 20_000.0, 4_000.0),
            ("Baker", "Eastern", 400.0, 120.0),
            ("Atlantis", "Coast", 900.0, 4_000.0),
            ("Washington", "Metro", 30_000.0, 5_000.0),
        ]
        .iter()
        .map(|(county, region, units, low)| HousingRow {
            county: county.to_string(),
            region: Region::parse(region),
            units: *units,
            buildings: 0.0,
            residents: 0.0,
            low_income_households: *low,
            low_income_share: 0.0,
        })
        .collect();
        let income = vec![
            IncomeRow {
                county: "Washington County".into(),
                ami_100: 124_100.0,
                ami_80: 0.0,
                ami_60: 0.0,
            },
            IncomeRow {
                county: "Baker County".into(),
                ami_100: 81_400.0,
                ami_80: 0.0,
                ami_60: 0.0,
            },
            // Matched, but the AMI cell was blank.
            IncomeRow {
                county: "Multnomah County".into(),
                ami_100: 0.0,
                ami_80: 0.0,
                ami_60: 0.0,
            },
        ];
        CountyJoiner::merge(&housing, &income, &PopulationTable::default())
    }

    fn labels(spec: &ChartSpec) -> Vec<&str> {
        spec.bars.iter().map(|b| b.label.as_str()).collect()
    }

    #[test]
    fn units_by_region_groups_and_sorts() {
        let spec = ChartSpec::build(ChartMetric::UnitsByRegion, &records(), &ChartLimits::default());
        assert!(!spec.horizontal);
        assert_eq!(labels(&spec), vec!["Metro", "Valley", "Coast", "Eastern"]);
        assert_eq!(spec.bars[0].value, 90_000.0);
        assert!(spec.bars[0].detail.contains("Counties: 2"));
        assert_eq!(spec.max_value(), 90_000.0);
    }

    #[test]
    fn income_chart_skips_counties_without_income_or_blank_ami() {
        let spec = ChartSpec::build(ChartMetric::Income, &records(), &ChartLimits::default());
        assert_eq!(labels(&spec), vec!["Washington", "Baker"]);
        assert!(spec.bars[0].detail.contains("$124,100"));
        assert!(spec.bars.iter().all(|b| b.value > 0.0));
    }

    #[test]
    fn low_income_chart_truncates_to_limit() {
        let limits = ChartLimits {
            low_income: 3,
            ..ChartLimits::default()
        };
        let spec = ChartSpec::build(ChartMetric::LowIncome, &records(), &limits);
        // Ties keep source order: Lane precedes Atlantis.
        assert_eq!(labels(&spec), vec!["Multnomah", "Washington", "Lane (IOU clip)"]);
    }

    #[test]
    fn per_capita_chart_drops_zero_rates() {
        let spec = ChartSpec::build(ChartMetric::PerCapita, &records(), &ChartLimits::default());
        assert!(!labels(&spec).contains(&"Atlantis"));
        assert_eq!(spec.bars[0].label, "Multnomah");
        assert_eq!(spec.bars[0].value, 73.17);
        assert!(spec.bars.windows(2).all(|w| w[0].value >= w[1].value));
    }

    #[test]
    fn horizontal_charts_put_largest_on_top() {
        let spec = ChartSpec::build(ChartMetric::Income, &records(), &ChartLimits::default());
        assert_eq!(ChartPlotter::category_position(&spec, 0), 1.0);
        assert_eq!(ChartPlotter::category_position(&spec, 1), 0.0);

        let format = ChartPlotter::category_formatter(&spec);
        assert_eq!(format(1.0), "Washington");
        assert_eq!(format(0.0), "Baker");
        assert_eq!(format(0.5), "");
        assert_eq!(format(7.0), "");
    }

    #[test]
    fn empty_records_give_empty_charts() {
        for metric in ChartMetric::ALL {
            let spec = ChartSpec::build(metric, &[], &ChartLimits::default());
            assert!(spec.bars.is_empty());
            assert_eq!(spec.max_value(), 0.0);
        }
    }
}
