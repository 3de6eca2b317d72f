//! Application State
//! UI state shared by the presenters, advanced only through `AppState::apply`.

use crate::config::AppConfig;
use crate::data::Region;
use crate::geo::ViewTransform;

/// Choropleth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MapLayer {
    #[default]
    Units,
    Income,
    LowIncome,
    Density,
    PerCapita,
}

impl MapLayer {
    pub const ALL: [MapLayer; 5] = [
        MapLayer::Units,
        MapLayer::Income,
        MapLayer::LowIncome,
        MapLayer::Density,
        MapLayer::PerCapita,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MapLayer::Units => "Housing Units",
            MapLayer::Income => "Area Median Income",
            MapLayer::LowIncome => "Low-Income Share",
            MapLayer::Density => "Housing Density",
            MapLayer::PerCapita => "Units per 1K Residents",
        }
    }
}

/// Ranked chart variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChartMetric {
    #[default]
    UnitsByRegion,
    Income,
    LowIncome,
    PerCapita,
}

impl ChartMetric {
    pub const ALL: [ChartMetric; 4] = [
        ChartMetric::UnitsByRegion,
        ChartMetric::Income,
        ChartMetric::LowIncome,
        ChartMetric::PerCapita,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartMetric::UnitsByRegion => "Housing Units by Region",
            ChartMetric::Income => "Area Median Income by County",
            ChartMetric::LowIncome => "Low-Income Household Concentration",
            ChartMetric::PerCapita => "Housing Units per 1,000 Residents",
        }
    }
}

/// Which central view is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Map,
    Charts,
    Compare,
    Table,
}

impl ActiveView {
    pub const ALL: [ActiveView; 4] = [
        ActiveView::Map,
        ActiveView::Charts,
        ActiveView::Compare,
        ActiveView::Table,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ActiveView::Map => "🗺 Map",
            ActiveView::Charts => "📊 Charts",
            ActiveView::Compare => "⚖ Compare",
            ActiveView::Table => "📋 Table",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Overlays {
    pub labels: bool,
    pub metro_highlight: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub view: ActiveView,
    pub layer: MapLayer,
    /// Key of the selected county.
    pub selected_county: Option<String>,
    pub transform: ViewTransform,
    pub overlays: Overlays,
    pub region_filter: Option<Region>,
    /// Minimum AMI 100%; `None` when the threshold filter is off.
    pub min_income: Option<f64>,
    pub chart_metric: ChartMetric,
    pub comparison: [String; 3],
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// User intents. Every UI control maps to exactly one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ShowView(ActiveView),
    SetLayer(MapLayer),
    SelectCounty(Option<String>),
    ZoomBy { factor: f64, focus: (f64, f64) },
    Pan { dx: f64, dy: f64 },
    ResetView,
    SetLabels(bool),
    SetMetroHighlight(bool),
    SetRegionFilter(Option<Region>),
    SetMinIncome(Option<f64>),
    SetChartMetric(ChartMetric),
    SetComparison { slot: usize, county: String },
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            view: ActiveView::default(),
            layer: MapLayer::default(),
            selected_county: None,
            transform: ViewTransform::IDENTITY,
            overlays: Overlays::default(),
            region_filter: None,
            min_income: None,
            chart_metric: ChartMetric::default(),
            comparison: config.comparison.clone(),
        }
    }

    /// Next state after `action`.
    pub fn apply(mut self, action: Action) -> Self {
        match action {
            Action::ShowView(view) => self.view = view,
            Action::SetLayer(layer) => self.layer = layer,
            Action::SelectCounty(county) => self.selected_county = county,
            Action::ZoomBy { factor, focus } => {
                self.transform = self.transform.zoom_about(factor, focus)
            }
            Action::Pan { dx, dy } => self.transform = self.transform.translate(dx, dy),
            Action::ResetView => {
                self.transform = ViewTransform::IDENTITY;
                self.region_filter = None;
                self.min_income = None;
                self.selected_county = None;
            }
            Action::SetLabels(on) => self.overlays.labels = on,
            Action::SetMetroHighlight(on) => self.overlays.metro_highlight = on,
            Action::SetRegionFilter(region) => self.region_filter = region,
            Action::SetMinIncome(threshold) => self.min_income = threshold,
            Action::SetChartMetric(metric) => self.chart_metric = metric,
            Action::SetComparison { slot, county } => {
                if let Some(entry) = self.comparison.get_mut(slot) {
                    *entry = county;
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_come_from_config() {
        let state = AppState::default();
        assert_eq!(state.layer, MapLayer::Units);
        assert_eq!(state.comparison[0], "Multnomah");
        assert_eq!(state.transform, ViewTransform::IDENTITY);
        assert_eq!(state.min_income, None);
    }

    #[test]
    fn reset_clears_filters_selection_and_transform() {
        let state = AppState::default()
            .apply(Action::SelectCounty(Some("Lane".into())))
            .apply(Action::ZoomBy {
                factor: 2.0,
                focus: (10.0, 10.0),
            })
            .apply(Action::SetRegionFilter(Some(Region::Coast)))
            .apply(Action::SetMinIncome(Some(100_000.0)))
            .apply(Action::SetLayer(MapLayer::Income))
            .apply(Action::SetLabels(true))
            .apply(Action::ResetView);

        assert_eq!(state.selected_county, None);
        assert_eq!(state.transform, ViewTransform::IDENTITY);
        assert_eq!(state.region_filter, None);
        assert_eq!(state.min_income, None);
        assert_eq!(state.layer, MapLayer::Income);
        assert!(state.overlays.labels);
    }

    #[test]
    fn zoom_and_pan_compose() {
        let state = AppState::default()
            .apply(Action::ZoomBy {
                factor: 100.0,
                focus: (0.0, 0.0),
            })
            .apply(Action::Pan { dx: 5.0, dy: -3.0 });
        assert_eq!(state.transform.k, 8.0);
        assert_eq!((state.transform.x, state.transform.y), (5.0, -3.0));
    }

    #[test]
    fn comparison_slot_out_of_range_is_ignored() {
        let before = AppState::default();
        let after = before.clone().apply(Action::SetComparison {
            slot: 7,
            county: "Baker".into(),
        });
        assert_eq!(before, after);

        let after = before.apply(Action::SetComparison {
            slot: 2,
            county: "Baker".into(),
        });
        assert_eq!(after.comparison[2], "Baker");
    }
}
