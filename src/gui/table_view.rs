//! Table Views
//! Side-by-side comparison of three counties and the full sortable data table.

use crate::charts::format::{format_currency, format_share, format_thousands};
use crate::charts::palette::region_color;
use crate::data::{CountyJoiner, MergedRecord, Region};
use crate::stats::StatsCalculator;
use egui::{Grid, RichText, ScrollArea};

const NOT_AVAILABLE: &str = "N/A";

/// Comparison grid: one column per selected county, one row per metric.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTable {
    pub headers: Vec<String>,
    /// (metric label, one cell per column)
    pub rows: Vec<(&'static str, Vec<String>)>,
}

impl ComparisonTable {
    pub const METRICS: [&'static str; 6] = [
        "Region",
        "AMI (100%)",
        "Housing Units",
        "Low-Income HH",
        "Low-Income Share",
        "Units per 1K",
    ];

    pub fn build(records: &[MergedRecord], selection: &[String; 3]) -> Self {
        let columns: Vec<Option<&MergedRecord>> = selection
            .iter()
            .map(|county| CountyJoiner::find(records, county))
            .collect();

        let rows = Self::METRICS
            .iter()
            .enumerate()
            .map(|(metric, label)| {
                let cells = columns
                    .iter()
                    .map(|record| match record {
                        Some(r) => Self::cell(r, metric),
                        None => NOT_AVAILABLE.to_string(),
                    })
                    .collect();
                (*label, cells)
            })
            .collect();

        Self {
            headers: selection.to_vec(),
            rows,
        }
    }

    fn cell(record: &MergedRecord, metric: usize) -> String {
        match metric {
            0 => record.region.to_string(),
            1 => format_currency(record.ami_100()),
            2 => format_thousands(record.units),
            3 => format_thousands(record.low_income_households),
            4 => format_share(record.low_income_share),
            _ => format!("{:.2}", record.units_per_1000),
        }
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        Grid::new("comparison_table")
            .striped(true)
            .min_col_width(140.0)
            .spacing([24.0, 8.0])
            .show(ui, |ui| {
                ui.label(RichText::new("Metric").strong());
                for header in &self.headers {
                    ui.label(RichText::new(header).strong().size(15.0));
                }
                ui.end_row();

                for (label, cells) in &self.rows {
                    ui.label(*label);
                    for cell in cells {
                        ui.label(cell);
                    }
                    ui.end_row();
                }
            });
    }
}

/// One line of the data table.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    pub county: String,
    pub region: Region,
    pub units: f64,
    pub ami_100: Option<f64>,
    pub low_income_households: f64,
    pub units_per_1000: f64,
}

/// Every merged record, largest unit count first.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    pub rows: Vec<DataRow>,
}

impl DataTable {
    pub const COLUMNS: [&'static str; 6] =
        ["County", "Region", "Units", "AMI", "Low-Income HH", "Units/1K"];

    pub fn build(records: &[MergedRecord]) -> Self {
        let mut rows: Vec<DataRow> = records
            .iter()
            .map(|r| DataRow {
                county: r.county.clone(),
                region: r.region.clone(),
                units: r.units,
                ami_100: r.ami_100(),
                low_income_households: r.low_income_households,
                units_per_1000: r.units_per_1000,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.units
                .partial_cmp(&a.units)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self { rows }
    }

    pub fn show(&self, ui: &mut egui::Ui, records: &[MergedRecord]) {
        ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            Grid::new("data_table")
                .striped(true)
                .min_col_width(90.0)
                .spacing([18.0, 4.0])
                .show(ui, |ui| {
                    for column in Self::COLUMNS {
                        ui.label(RichText::new(column).strong());
                    }
                    ui.end_row();

                    for row in &self.rows {
                        ui.label(&row.county);
                        ui.label(
                            RichText::new(row.region.label())
                                .color(region_color(&row.region).to_color32()),
                        );
                        ui.label(format_thousands(row.units));
                        ui.label(format_currency(row.ami_100));
                        ui.label(format_thousands(row.low_income_households));
                        ui.label(format!("{:.2}", row.units_per_1000));
                        ui.end_row();
                    }
                });

            ui.add_space(16.0);
            ui.separator();
            ui.label(RichText::new("Regional Summary").size(15.0).strong());
            ui.add_space(6.0);

            Grid::new("region_summary")
                .striped(true)
                .min_col_width(90.0)
                .show(ui, |ui| {
                    for header in ["Region", "Counties", "Units", "Mean", "Median", "Low-Income HH"] {
                        ui.label(RichText::new(header).strong());
                    }
                    ui.end_row();

                    for summary in StatsCalculator::region_summaries(records) {
                        ui.label(summary.region.label());
                        ui.label(summary.counties.to_string());
                        ui.label(format_thousands(summary.total_units));
                        ui.label(format_thousands(summary.mean_units));
                        ui.label(format_thousands(summary.median_units));
                        ui.label(format_thousands(summary.total_low_income_households));
                        ui.end_row();
                    }
                });
        });
    }
}
