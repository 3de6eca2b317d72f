//! Housing Explorer Main Application
//! Main window with control panel, map, charts and tables.

use crate::charts::{ChartSpec, RenderError, StaticChartRenderer};
use crate::config::AppConfig;
use crate::data::{CountyJoiner, DataLoader, LoadedData};
use crate::gui::table_view::{ComparisonTable, DataTable};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction, MapView};
use crate::state::{Action, ActiveView, AppState};
use egui::{RichText, SidePanel};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use tracing::{error, info, warn};

const CHART_EXPORT_SIZE: (u32, u32) = (1200, 720);

/// Loading result from background thread
enum LoadEvent {
    Progress(f32, String),
    Complete(LoadedData),
    Error(String),
}

/// Main application window.
pub struct HousingExplorerApp {
    config: AppConfig,
    state: AppState,
    data: Option<LoadedData>,

    control_panel: ControlPanel,
    map_view: MapView,
    chart_viewer: ChartViewer,

    // Async loading
    load_rx: Option<Receiver<LoadEvent>>,
    is_loading: bool,
    load_error: Option<String>,
}

impl HousingExplorerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let mut app = Self {
            state: AppState::from_config(&config),
            control_panel: ControlPanel::new(&config.map),
            config,
            data: None,
            map_view: MapView::new(),
            chart_viewer: ChartViewer::new(),
            load_rx: None,
            is_loading: false,
            load_error: None,
        };
        app.start_load();
        app
    }

    /// Start loading all resources in a background thread. Ignored while a load is running.
    fn start_load(&mut self) {
        if self.is_loading {
            return;
        }

        self.is_loading = true;
        self.load_error = None;
        self.control_panel.set_progress(5.0, "Loading data...");

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let config = self.config.clone();

        thread::spawn(move || {
            let mut step = 0.0;
            let result = DataLoader::load_all(&config, |status| {
                step += 30.0;
                let _ = tx.send(LoadEvent::Progress(step, status.to_string()));
            });

            let event = match result {
                Ok(data) => LoadEvent::Complete(data),
                Err(e) => {
                    error!(error = %e, "data load failed");
                    LoadEvent::Error(e.to_string())
                }
            };
            let _ = tx.send(event);
        });
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while should_keep_receiver {
                let event = match rx.try_recv() {
                    Ok(event) => event,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        error!("loader thread exited without a result");
                        LoadEvent::Error("Loader stopped unexpectedly".to_string())
                    }
                };

                match event {
                    LoadEvent::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    LoadEvent::Complete(data) => {
                        self.control_panel
                            .update_counties(CountyJoiner::county_labels(&data.records));
                        self.control_panel.set_progress(
                            100.0,
                            &format!(
                                "Complete! {} counties, {} shapes",
                                data.records.len(),
                                data.features.len()
                            ),
                        );
                        self.data = Some(data);
                        self.map_view.invalidate();
                        self.chart_viewer.clear();
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                    LoadEvent::Error(message) => {
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {}", message));
                        self.load_error = Some(message);
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    fn dispatch(&mut self, action: Action) {
        self.state = std::mem::take(&mut self.state).apply(action);
    }

    fn handle_panel_action(&mut self, action: ControlPanelAction) {
        match action {
            ControlPanelAction::Apply(action) => self.dispatch(action),
            ControlPanelAction::Zoom(factor) => self.dispatch(Action::ZoomBy {
                factor,
                focus: self.map_view.center(),
            }),
            ControlPanelAction::Reload => self.start_load(),
            ControlPanelAction::Export => self.handle_export(),
            ControlPanelAction::None => {}
        }
    }

    /// SVG of the current view, with a suggested file name.
    fn render_current_view(&self) -> Result<(String, &'static str), RenderError> {
        let data = self
            .data
            .as_ref()
            .ok_or(RenderError::Empty("no data loaded"))?;

        match self.state.view {
            ActiveView::Map => {
                let scene = self
                    .map_view
                    .scene()
                    .ok_or(RenderError::Empty("map not drawn yet"))?;
                Ok((StaticChartRenderer::map_svg(scene)?, "housing_map.svg"))
            }
            ActiveView::Charts => {
                let spec = ChartSpec::build(
                    self.state.chart_metric,
                    &data.records,
                    &self.config.chart_limits,
                );
                Ok((
                    StaticChartRenderer::chart_svg(&spec, CHART_EXPORT_SIZE)?,
                    "housing_chart.svg",
                ))
            }
            ActiveView::Compare | ActiveView::Table => {
                Err(RenderError::Empty("only the map and charts can be exported"))
            }
        }
    }

    /// Handle SVG export of the map or chart
    fn handle_export(&mut self) {
        let (svg, file_name) = match self.render_current_view() {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(error = %e, "export failed");
                self.control_panel
                    .set_progress(0.0, &format!("Export error: {}", e));
                return;
            }
        };

        // Ask user for output location
        let output_path: PathBuf = match rfd::FileDialog::new()
            .add_filter("SVG Image", &["svg"])
            .set_file_name(file_name)
            .save_file()
        {
            Some(path) => path,
            None => return, // User cancelled
        };

        match StaticChartRenderer::save_svg(&output_path, &svg) {
            Ok(()) => {
                info!(path = %output_path.display(), bytes = svg.len(), "exported svg");
                self.control_panel.set_progress(
                    100.0,
                    &format!("Exported {}", output_path.display()),
                );
                if let Err(e) = open::that(&output_path) {
                    warn!(error = %e, "could not open exported file");
                }
            }
            Err(e) => {
                warn!(error = %e, "export failed");
                self.control_panel
                    .set_progress(0.0, &format!("Export error: {}", e));
            }
        }
    }

    fn show_load_error(&mut self, ctx: &egui::Context) {
        let Some(message) = self.load_error.clone() else {
            return;
        };

        let mut retry = false;
        let mut dismiss = false;
        egui::Window::new("⚠ Failed to load data")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(RichText::new(&message).color(egui::Color32::from_rgb(220, 53, 69)));
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    retry = ui.button("🔄 Retry").clicked();
                    dismiss = ui.button("Close").clicked();
                });
            });

        if dismiss {
            self.load_error = None;
        }
        if retry {
            self.start_load();
        }
    }

    fn show_central(&mut self, ui: &mut egui::Ui) {
        let Some(data) = self.data.as_ref() else {
            ui.centered_and_justified(|ui| {
                let text = if self.is_loading { "Loading..." } else { "No Data" };
                ui.label(RichText::new(text).size(20.0));
            });
            return;
        };

        match self.state.view {
            ActiveView::Map => {
                if let Some(action) = self.map_view.show(ui, &self.state, data, &self.config.map) {
                    self.dispatch(action);
                }
            }
            ActiveView::Charts => {
                self.chart_viewer.show(
                    ui,
                    self.state.chart_metric,
                    &data.records,
                    &self.config.chart_limits,
                );
            }
            ActiveView::Compare => {
                ui.label(RichText::new("County Comparison").size(18.0).strong());
                ui.add_space(10.0);
                ComparisonTable::build(&data.records, &self.state.comparison).show(ui);
            }
            ActiveView::Table => {
                ui.label(RichText::new("All Counties").size(18.0).strong());
                ui.add_space(10.0);
                DataTable::build(&data.records).show(ui, &data.records);
            }
        }
    }
}

impl eframe::App for HousingExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        self.show_load_error(ctx);
        let blocked = self.load_error.is_some();

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                ui.add_enabled_ui(!blocked, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        let action = self.control_panel.show(
                            ui,
                            &self.state,
                            &self.config.map,
                            self.data.is_some(),
                        );
                        self.handle_panel_action(action);
                    });
                });
            });

        // Right panel - County details on the map view
        if self.state.view == ActiveView::Map {
            if let Some(data) = &self.data {
                SidePanel::right("county_detail")
                    .min_width(240.0)
                    .show(ctx, |ui| {
                        MapView::show_detail(ui, &self.state, &data.records);
                    });
            }
        }

        // Central panel - current view
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!blocked, |ui| self.show_central(ui));
        });
    }
}
