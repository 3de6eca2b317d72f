//! Control Panel Widget
//! Left side panel with view, layer, overlay, filter and comparison controls.

use crate::config::MapConfig;
use crate::data::Region;
use crate::state::{Action, ActiveView, AppState, ChartMetric, MapLayer};
use egui::{Color32, ComboBox, RichText};

/// Zoom factor of the zoom-in button.
pub const ZOOM_IN: f64 = 1.5;
/// Zoom factor of the zoom-out button.
pub const ZOOM_OUT: f64 = 0.67;

const THRESHOLD_STEP: f64 = 100.0;

/// Left side control panel. Reads the app state and reports what the user asked for;
/// it never mutates the state itself.
pub struct ControlPanel {
    pub progress: f32,
    pub status: String,
    /// Slider position kept while the income threshold is switched off.
    threshold_draft: f64,
    /// Sorted county labels for the comparison selectors.
    counties: Vec<String>,
}

impl ControlPanel {
    pub fn new(map: &MapConfig) -> Self {
        Self {
            progress: 0.0,
            status: "Ready".to_string(),
            threshold_draft: ((map.income_range[0] + map.income_range[1]) / 2.0 / THRESHOLD_STEP)
                .round()
                * THRESHOLD_STEP,
            counties: Vec::new(),
        }
    }

    /// Update selectable counties after a load.
    pub fn update_counties(&mut self, counties: Vec<String>) {
        self.counties = counties;
    }

    /// Draw the control panel
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        state: &AppState,
        map: &MapConfig,
        data_ready: bool,
    ) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🏠 Housing Explorer")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("County housing and income")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();

        // ===== View Section =====
        ui.horizontal_wrapped(|ui| {
            for view in ActiveView::ALL {
                if ui.selectable_label(state.view == view, view.label()).clicked()
                    && state.view != view
                {
                    action = ControlPanelAction::Apply(Action::ShowView(view));
                }
            }
        });

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Map Layer Section =====
        ui.label(RichText::new("🗺 Map Layer").size(14.0).strong());
        ui.add_space(5.0);
        for layer in MapLayer::ALL {
            if ui.radio(state.layer == layer, layer.label()).clicked() && state.layer != layer {
                action = ControlPanelAction::Apply(Action::SetLayer(layer));
            }
        }

        ui.add_space(8.0);
        let mut labels = state.overlays.labels;
        if ui.checkbox(&mut labels, "County labels").changed() {
            action = ControlPanelAction::Apply(Action::SetLabels(labels));
        }
        let mut metro = state.overlays.metro_highlight;
        if ui.checkbox(&mut metro, "Highlight Metro region").changed() {
            action = ControlPanelAction::Apply(Action::SetMetroHighlight(metro));
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("➕").on_hover_text("Zoom in").clicked() {
                action = ControlPanelAction::Zoom(ZOOM_IN);
            }
            if ui.button("➖").on_hover_text("Zoom out").clicked() {
                action = ControlPanelAction::Zoom(ZOOM_OUT);
            }
            if ui
                .button("⟲ Reset")
                .on_hover_text("Reset zoom, filters and selection")
                .clicked()
            {
                action = ControlPanelAction::Apply(Action::ResetView);
            }
        });

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Filter Section =====
        ui.label(RichText::new("🔎 Filters").size(14.0).strong());
        ui.add_space(5.0);

        let label_width = 90.0;
        let combo_width = 150.0;

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Region:"));
            let selected = state
                .region_filter
                .as_ref()
                .map(|r| r.label().to_string())
                .unwrap_or_else(|| "All regions".to_string());
            ComboBox::from_id_salt("region_filter")
                .width(combo_width)
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    if ui
                        .selectable_label(state.region_filter.is_none(), "All regions")
                        .clicked()
                    {
                        action = ControlPanelAction::Apply(Action::SetRegionFilter(None));
                    }
                    for region in Region::KNOWN.iter() {
                        let active = state.region_filter.as_ref() == Some(region);
                        if ui.selectable_label(active, region.label()).clicked() {
                            action = ControlPanelAction::Apply(Action::SetRegionFilter(Some(
                                region.clone(),
                            )));
                        }
                    }
                });
        });

        ui.add_space(5.0);

        let mut threshold_on = state.min_income.is_some();
        if let Some(current) = state.min_income {
            self.threshold_draft = current;
        }
        if ui.checkbox(&mut threshold_on, "Minimum AMI (100%)").changed() {
            let value = threshold_on.then_some(self.threshold_draft);
            action = ControlPanelAction::Apply(Action::SetMinIncome(value));
        }
        ui.add_enabled_ui(threshold_on, |ui| {
            let slider = egui::Slider::new(
                &mut self.threshold_draft,
                map.income_range[0]..=map.income_range[1],
            )
            .step_by(THRESHOLD_STEP)
            .prefix("$");
            if ui.add(slider).changed() && threshold_on {
                let value = Some(self.threshold_draft);
                action = ControlPanelAction::Apply(Action::SetMinIncome(value));
            }
        });

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Chart Section =====
        ui.label(RichText::new("📊 Chart").size(14.0).strong());
        ui.add_space(5.0);
        ComboBox::from_id_salt("chart_metric")
            .width(label_width + combo_width)
            .selected_text(state.chart_metric.title())
            .show_ui(ui, |ui| {
                for metric in ChartMetric::ALL {
                    if ui
                        .selectable_label(state.chart_metric == metric, metric.title())
                        .clicked()
                    {
                        action = ControlPanelAction::Apply(Action::SetChartMetric(metric));
                    }
                }
            });

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Comparison Section =====
        ui.label(RichText::new("⚖ Compare Counties").size(14.0).strong());
        ui.add_space(5.0);
        for (slot, current) in state.comparison.iter().enumerate() {
            ui.horizontal(|ui| {
                ui.add_sized(
                    [label_width, 20.0],
                    egui::Label::new(format!("County {}:", slot + 1)),
                );
                ComboBox::from_id_salt(("comparison", slot))
                    .width(combo_width)
                    .selected_text(current.as_str())
                    .show_ui(ui, |ui| {
                        for county in &self.counties {
                            if ui.selectable_label(current == county, county).clicked() {
                                action = ControlPanelAction::Apply(Action::SetComparison {
                                    slot,
                                    county: county.clone(),
                                });
                            }
                        }
                    });
            });
        }

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            let reload = egui::Button::new(RichText::new("🔄 Reload Data").size(14.0))
                .min_size(egui::vec2(180.0, 30.0));
            if ui.add(reload).clicked() {
                action = ControlPanelAction::Reload;
            }

            ui.add_space(8.0);

            let export_enabled = data_ready && matches!(state.view, ActiveView::Map | ActiveView::Charts);
            ui.add_enabled_ui(export_enabled, |ui| {
                let export = egui::Button::new(RichText::new("💾 Export SVG").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui
                    .add(export)
                    .on_disabled_hover_text("Available on the map and chart views")
                    .clicked()
                {
                    action = ControlPanelAction::Export;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("⏳ Status").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Complete") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    /// A state transition.
    Apply(Action),
    /// Zoom about the map center by this factor.
    Zoom(f64),
    Reload,
    Export,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_panel(panel: &mut ControlPanel, state: &AppState) -> ControlPanelAction {
        let ctx = egui::Context::default();
        let map = MapConfig::default();
        let mut action = ControlPanelAction::None;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                action = panel.show(ui, state, &map, true);
            });
        });
        action
    }

    #[test]
    fn idle_frame_reports_nothing() {
        let mut panel = ControlPanel::new(&MapConfig::default());
        panel.update_counties(vec!["Baker".into(), "Lane (IOU clip)".into()]);
        let action = run_panel(&mut panel, &AppState::default());
        assert_eq!(action, ControlPanelAction::None);
    }

    #[test]
    fn slider_follows_active_threshold() {
        let mut panel = ControlPanel::new(&MapConfig::default());
        assert_eq!(panel.threshold_draft, 102_800.0);

        let state = AppState::default().apply(Action::SetMinIncome(Some(110_000.0)));
        run_panel(&mut panel, &state);
        assert_eq!(panel.threshold_draft, 110_000.0);

        // Switching the filter off keeps the last slider position.
        run_panel(&mut panel, &state.apply(Action::SetMinIncome(None)));
        assert_eq!(panel.threshold_draft, 110_000.0);
    }

    #[test]
    fn progress_and_status() {
        let mut panel = ControlPanel::new(&MapConfig::default());
        panel.set_progress(50.0, "Loading topology...");
        assert_eq!(panel.progress, 50.0);
        assert_eq!(panel.status, "Loading topology...");
    }
}
