//! Map View Widget
//! Shows the rasterised county map, turns pointer input into actions and renders the
//! hover tooltip, label overlay, legend and county detail panel.

use crate::charts::choropleth::layer_value;
use crate::charts::format::{format_currency, format_share, format_thousands};
use crate::charts::{MapPresenter, MapScene, MapShape};
use crate::config::MapConfig;
use crate::data::{CountyJoiner, LoadedData, MergedRecord};
use crate::state::{Action, AppState, MapLayer};
use egui::{Align2, Color32, FontId, Pos2, Rect, RichText, Sense, TextureHandle, TextureOptions};
use tracing::warn;

/// Wheel sensitivity, as a zoom exponent per scrolled point.
const WHEEL_ZOOM: f64 = 0.002;

/// Value of `layer` as shown in tooltips.
pub fn format_layer_value(layer: MapLayer, value: Option<f64>) -> String {
    match (layer, value) {
        (_, None) => "N/A".to_string(),
        (MapLayer::Units, Some(v)) => format_thousands(v),
        (MapLayer::Income, Some(v)) => format_currency(Some(v)),
        (MapLayer::LowIncome, Some(v)) => format_share(v),
        (MapLayer::Density | MapLayer::PerCapita, Some(v)) => format!("{v:.1}"),
    }
}

/// Tooltip lines for a shape under the pointer.
pub fn tooltip_lines(shape: &MapShape, records: &[MergedRecord], layer: MapLayer) -> Vec<String> {
    let record = shape
        .record_key
        .as_deref()
        .and_then(|key| CountyJoiner::find(records, key));

    match record {
        Some(r) => vec![
            format!("{} ({})", r.county, r.region),
            format!(
                "{}: {}",
                layer.label(),
                format_layer_value(layer, layer_value(r, layer))
            ),
        ],
        None => vec![format!("County {}", shape.feature_id), "No data".to_string()],
    }
}

/// Label/value pairs of the detail panel for one county.
pub fn detail_rows(record: &MergedRecord) -> Vec<(&'static str, String)> {
    vec![
        ("Region", record.region.to_string()),
        ("Housing Units", format_thousands(record.units)),
        ("Buildings", format_thousands(record.buildings)),
        ("Residents", format_thousands(record.residents)),
        ("AMI (100%)", format_currency(record.ami_100())),
        ("Low-Income Share", format_share(record.low_income_share)),
        (
            "Low-Income Households",
            format_thousands(record.low_income_households),
        ),
        (
            "Units per 1K Residents",
            format!("{:.1}", record.units_per_1000_residents),
        ),
    ]
}

/// Map widget state: the last scene and its texture.
#[derive(Default)]
pub struct MapView {
    scene: Option<MapScene>,
    texture: Option<TextureHandle>,
    /// State and size the current scene was built for.
    built_for: Option<(AppState, (u32, u32))>,
    size: (u32, u32),
}

impl MapView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a rebuild on the next frame, e.g. after new data arrived.
    pub fn invalidate(&mut self) {
        self.built_for = None;
    }

    /// Center of the map area in map coordinates; the focus of button zooms.
    pub fn center(&self) -> (f64, f64) {
        (self.size.0 as f64 / 2.0, self.size.1 as f64 / 2.0)
    }

    pub fn scene(&self) -> Option<&MapScene> {
        self.scene.as_ref()
    }

    fn rebuild(
        &mut self,
        ctx: &egui::Context,
        state: &AppState,
        data: &LoadedData,
        map: &MapConfig,
    ) {
        let key = (state.clone(), self.size);
        if self.built_for.as_ref() == Some(&key) {
            return;
        }

        let scene = MapScene::build(state, &data.records, &data.features, self.size, map);
        match MapPresenter::render_rgb(&scene) {
            Ok(pixels) => {
                let image = egui::ColorImage::from_rgb(
                    [self.size.0 as usize, self.size.1 as usize],
                    &pixels,
                );
                match &mut self.texture {
                    Some(texture) => texture.set(image, TextureOptions::LINEAR),
                    None => {
                        self.texture =
                            Some(ctx.load_texture("county_map", image, TextureOptions::LINEAR))
                    }
                }
            }
            Err(e) => warn!(error = %e, "map render failed"),
        }

        self.scene = Some(scene);
        self.built_for = Some(key);
    }

    /// Draw the map and return the action the pointer input asked for, if any.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        state: &AppState,
        data: &LoadedData,
        map: &MapConfig,
    ) -> Option<Action> {
        let available = ui.available_size();
        let (response, painter) = ui.allocate_painter(available, Sense::click_and_drag());
        let rect = response.rect;
        if rect.width() < 2.0 || rect.height() < 2.0 {
            return None;
        }

        self.size = (rect.width() as u32, rect.height() as u32);
        self.rebuild(ui.ctx(), state, data, map);

        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        let scene = self.scene.as_ref()?;
        if scene.show_labels {
            for shape in &scene.shapes {
                if let (Some(label), Some((x, y))) = (&shape.label, shape.label_anchor) {
                    painter.text(
                        rect.min + egui::vec2(x as f32, y as f32),
                        Align2::CENTER_CENTER,
                        label,
                        FontId::proportional(10.0),
                        Color32::from_gray(40),
                    );
                }
            }
        }
        Self::paint_legend(&painter, rect, scene);

        let local = |p: Pos2| ((p.x - rect.min.x) as f64, (p.y - rect.min.y) as f64);
        let mut action = None;

        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                if let Some(pointer) = response.hover_pos() {
                    action = Some(Action::ZoomBy {
                        factor: (scroll as f64 * WHEEL_ZOOM).exp(),
                        focus: local(pointer),
                    });
                }
            }
        }

        if response.dragged() {
            let delta = response.drag_delta();
            if delta != egui::Vec2::ZERO {
                action = Some(Action::Pan {
                    dx: delta.x as f64,
                    dy: delta.y as f64,
                });
            }
        }

        if response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let hit = scene
                    .shape_at(local(pointer))
                    .and_then(|shape| shape.record_key.clone());
                action = Some(Action::SelectCounty(hit));
            }
        }

        if let Some(pointer) = response.hover_pos() {
            if let Some(shape) = scene.shape_at(local(pointer)) {
                let lines = tooltip_lines(shape, &data.records, state.layer);
                response.on_hover_ui_at_pointer(|ui| {
                    for (i, line) in lines.iter().enumerate() {
                        if i == 0 {
                            ui.label(RichText::new(line).strong());
                        } else {
                            ui.label(line);
                        }
                    }
                });
            }
        }

        action
    }

    fn paint_legend(painter: &egui::Painter, rect: Rect, scene: &MapScene) {
        let legend = &scene.legend;
        let swatch = 14.0;
        let row = swatch + 4.0;
        let height = 28.0 + row * legend.steps.len() as f32;
        let origin = Pos2::new(rect.min.x + 12.0, rect.max.y - height - 12.0);

        painter.rect_filled(
            Rect::from_min_size(origin, egui::vec2(150.0, height)),
            4.0,
            Color32::from_white_alpha(220),
        );
        painter.text(
            origin + egui::vec2(8.0, 6.0),
            Align2::LEFT_TOP,
            legend.title,
            FontId::proportional(12.0),
            Color32::from_gray(30),
        );
        for (i, (color, label)) in legend.steps.iter().enumerate() {
            let top = origin + egui::vec2(8.0, 24.0 + row * i as f32);
            painter.rect_filled(
                Rect::from_min_size(top, egui::vec2(swatch, swatch)),
                2.0,
                color.to_color32(),
            );
            painter.text(
                top + egui::vec2(swatch + 6.0, swatch / 2.0),
                Align2::LEFT_CENTER,
                label,
                FontId::proportional(11.0),
                Color32::from_gray(30),
            );
        }
    }

    /// Detail panel for the selected county.
    pub fn show_detail(ui: &mut egui::Ui, state: &AppState, records: &[MergedRecord]) {
        ui.label(RichText::new("📍 County Details").size(14.0).strong());
        ui.add_space(6.0);

        let selected = state
            .selected_county
            .as_deref()
            .and_then(|key| CountyJoiner::find(records, key));

        let Some(record) = selected else {
            ui.label(RichText::new("Click a county on the map").color(Color32::GRAY));
            return;
        };

        ui.label(RichText::new(&record.county).size(16.0).strong());
        ui.add_space(4.0);
        egui::Grid::new("county_detail")
            .num_columns(2)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                for (label, value) in detail_rows(record) {
                    ui.label(RichText::new(label).color(Color32::GRAY));
                    ui.label(value);
                    ui.end_row();
                }
            });
    }
}
