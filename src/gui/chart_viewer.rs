//! Chart Viewer Widget
//! Central card showing the selected ranked chart using egui_plot.

use crate::charts::palette::region_color;
use crate::charts::{ChartPlotter, ChartSpec};
use crate::config::ChartLimits;
use crate::data::{MergedRecord, Region};
use crate::state::ChartMetric;
use egui::{Color32, RichText};

const CARD_MIN_HEIGHT: f32 = 320.0;

/// Holds the spec of the chart on screen; rebuilt whenever the metric or the data changes.
#[derive(Default)]
pub struct ChartViewer {
    spec: Option<ChartSpec>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached spec, e.g. after a reload.
    pub fn clear(&mut self) {
        self.spec = None;
    }

    /// Spec for `metric`, rebuilt only when the metric changed since the last call.
    pub fn sync(
        &mut self,
        metric: ChartMetric,
        records: &[MergedRecord],
        limits: &ChartLimits,
    ) -> &ChartSpec {
        if self.spec.as_ref().map(|s| s.metric) != Some(metric) {
            self.spec = None;
        }
        self.spec
            .get_or_insert_with(|| ChartSpec::build(metric, records, limits))
    }

    /// Draw the chart card.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        metric: ChartMetric,
        records: &[MergedRecord],
        limits: &ChartLimits,
    ) {
        let spec = self.sync(metric, records, limits);

        if spec.bars.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        }

        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, Color32::from_gray(90)))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.label(RichText::new(spec.title).size(18.0).strong());
                    ui.add_space(6.0);

                    // Region legend
                    let mut regions: Vec<&Region> = Vec::new();
                    for bar in &spec.bars {
                        if !regions.contains(&&bar.region) {
                            regions.push(&bar.region);
                        }
                    }
                    ui.horizontal_wrapped(|ui| {
                        for region in regions {
                            let (rect, _) = ui
                                .allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
                            ui.painter()
                                .rect_filled(rect, 3.0, region_color(region).to_color32());
                            ui.label(RichText::new(region.label()).size(13.0));
                            ui.add_space(10.0);
                        }
                    });

                    ui.add_space(8.0);
                    let height = (ui.available_height() - 12.0).max(CARD_MIN_HEIGHT);
                    ChartPlotter::draw_bar_chart(ui, spec, height);
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CountyJoiner, HousingRow, PopulationTable};

    fn records(units: f64) -> Vec<MergedRecord> {
        let rows = vec![HousingRow {
            county: "Baker".into(),
            region: Region::Eastern,
            units,
            buildings: 0.0,
            residents: 0.0,
            low_income_households: 0.0,
            low_income_share: 0.0,
        }];
        CountyJoiner::merge(&rows, &[], &PopulationTable::default())
    }

    #[test]
    fn spec_rebuilds_on_metric_change_only() {
        let limits = ChartLimits::default();
        let mut viewer = ChartViewer::new();

        let first = viewer.sync(ChartMetric::UnitsByRegion, &records(400.0), &limits).clone();
        assert_eq!(first.bars[0].value, 400.0);

        // Same metric keeps the cached spec even if other records are passed.
        let cached = viewer.sync(ChartMetric::UnitsByRegion, &records(900.0), &limits);
        assert_eq!(cached.bars[0].value, 400.0);

        let per_capita = viewer.sync(ChartMetric::PerCapita, &records(900.0), &limits);
        assert_eq!(per_capita.metric, ChartMetric::PerCapita);
        assert_eq!(per_capita.bars[0].value, 56.25);

        viewer.clear();
        let rebuilt = viewer.sync(ChartMetric::UnitsByRegion, &records(900.0), &limits);
        assert_eq!(rebuilt.bars[0].value, 900.0);
    }
}
