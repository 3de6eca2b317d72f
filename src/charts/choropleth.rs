//! Choropleth Map
//! Builds a fully styled map scene from the current state and draws it onto any
//! plotters backend. Every change rebuilds the scene and redraws all shapes.

use crate::charts::palette::{self, Rgb, SequentialScale};
use crate::charts::format::{format_share, format_thousands};
use crate::charts::RenderError;
use crate::config::MapConfig;
use crate::data::{match_county, MergedRecord, Region};
use crate::geo::{GeoFeature, Mercator};
use crate::state::{AppState, MapLayer};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

/// Opacity of non-Metro shapes while the metro highlight is on.
pub const METRO_DIM: f64 = 0.4;
/// Opacity of shapes failing the region or income filter.
pub const FILTER_DIM: f64 = 0.2;

/// One projected county shape with its resolved style.
#[derive(Debug, Clone, PartialEq)]
pub struct MapShape {
    pub feature_id: String,
    pub record_key: Option<String>,
    pub label: Option<String>,
    /// Screen-space polygons; each is a list of rings, exterior first.
    pub polygons: Vec<Vec<Vec<(f64, f64)>>>,
    pub fill: Rgb,
    pub opacity: f64,
    pub selected: bool,
    pub label_anchor: Option<(f64, f64)>,
}

/// Legend title and its discrete swatches.
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub title: &'static str,
    pub steps: Vec<(Rgb, String)>,
}

impl Legend {
    pub fn for_layer(layer: MapLayer) -> Self {
        let scale = SequentialScale::for_layer(layer);
        let steps: [f64; 5] = match layer {
            MapLayer::Units => [0.0, 20_000.0, 40_000.0, 60_000.0, 80_000.0],
            MapLayer::Income => [81_400.0, 90_000.0, 100_000.0, 110_000.0, 124_100.0],
            MapLayer::LowIncome => [0.0, 15.0, 30.0, 45.0, 60.0],
            MapLayer::Density => [0.0, 50.0, 100.0, 150.0, 200.0],
            MapLayer::PerCapita => [0.0, 100.0, 200.0, 300.0, 400.0],
        };

        Self {
            title: layer.label(),
            steps: steps
                .iter()
                .map(|&v| (scale.color(v), Self::format_step(layer, v)))
                .collect(),
        }
    }

    fn format_step(layer: MapLayer, value: f64) -> String {
        match layer {
            MapLayer::Units => format_thousands(value),
            MapLayer::Income => format!("${:.0}K", value / 1000.0),
            MapLayer::LowIncome => format_share(value),
            MapLayer::Density | MapLayer::PerCapita => format!("{value:.0}"),
        }
    }
}

/// Value of `record` on `layer`; `None` when the record has no value for it.
pub fn layer_value(record: &MergedRecord, layer: MapLayer) -> Option<f64> {
    match layer {
        MapLayer::Units => Some(record.units),
        MapLayer::Income => record.ami_100(),
        MapLayer::LowIncome => Some(record.low_income_share),
        MapLayer::Density => Some(record.density),
        MapLayer::PerCapita => Some(record.units_per_1000_residents),
    }
}

/// Opacity after the active filters; the strongest dimming wins.
pub fn shape_opacity(record: Option<&MergedRecord>, state: &AppState) -> f64 {
    let mut opacity: f64 = 1.0;

    if state.overlays.metro_highlight
        && !record.is_some_and(|r| r.region == Region::Metro)
    {
        opacity = opacity.min(METRO_DIM);
    }
    if let Some(region) = &state.region_filter {
        if !record.is_some_and(|r| &r.region == region) {
            opacity = opacity.min(FILTER_DIM);
        }
    }
    if let Some(min_income) = state.min_income {
        let passes = record
            .and_then(MergedRecord::ami_100)
            .is_some_and(|ami| ami >= min_income);
        if !passes {
            opacity = opacity.min(FILTER_DIM);
        }
    }

    opacity
}

fn ring_area_centroid(ring: &[(f64, f64)]) -> (f64, (f64, f64)) {
    let n = ring.len();
    if n < 3 {
        return (0.0, ring.first().copied().unwrap_or((0.0, 0.0)));
    }

    let mut area = 0.0;
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let (x0, y0) = ring[i];
        let (x1, y1) = ring[(i + 1) % n];
        let cross = x0 * y1 - x1 * y0;
        area += cross;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }
    area /= 2.0;

    if area.abs() < f64::EPSILON {
        let sx: f64 = ring.iter().map(|p| p.0).sum();
        let sy: f64 = ring.iter().map(|p| p.1).sum();
        return (0.0, (sx / n as f64, sy / n as f64));
    }
    (area.abs(), (cx / (6.0 * area), cy / (6.0 * area)))
}

/// Even-odd containment test.
fn ring_contains(ring: &[(f64, f64)], p: (f64, f64)) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > p.1) != (yj > p.1) && p.0 < (xj - xi) * (p.1 - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

impl MapShape {
    pub fn contains(&self, p: (f64, f64)) -> bool {
        self.polygons.iter().any(|rings| {
            rings.iter().filter(|ring| ring_contains(ring, p)).count() % 2 == 1
        })
    }

    /// True when this shape's label anchor falls inside one of `other`'s holes.
    fn lies_in_hole_of(&self, other: &MapShape) -> bool {
        let Some(anchor) = self.label_anchor else {
            return false;
        };
        other
            .polygons
            .iter()
            .flat_map(|rings| rings.iter().skip(1))
            .any(|hole| ring_contains(hole, anchor))
    }
}

/// All shapes of the map for one state snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct MapScene {
    pub size: (u32, u32),
    pub shapes: Vec<MapShape>,
    pub legend: Legend,
    pub show_labels: bool,
}

impl MapScene {
    pub fn build(
        state: &AppState,
        records: &[MergedRecord],
        features: &[GeoFeature],
        size: (u32, u32),
        map: &MapConfig,
    ) -> Self {
        let projection = Mercator::new(
            map.center,
            map.scale,
            (size.0 as f64 / 2.0, size.1 as f64 / 2.0),
        );
        let scale = SequentialScale::for_layer(state.layer);

        let shapes = features
            .iter()
            .map(|feature| {
                let record = feature
                    .name
                    .as_deref()
                    .and_then(|name| match_county(name, records, |r| r.county.as_str()));

                let fill = record
                    .and_then(|r| layer_value(r, state.layer))
                    .map(|v| scale.color(v))
                    .unwrap_or(palette::NO_DATA);

                let polygons: Vec<Vec<Vec<(f64, f64)>>> = feature
                    .polygons
                    .iter()
                    .map(|rings| {
                        rings
                            .iter()
                            .map(|ring| {
                                ring.iter()
                                    .map(|&(lon, lat)| {
                                        state.transform.apply(projection.project(lon, lat))
                                    })
                                    .collect()
                            })
                            .collect()
                    })
                    .collect();

                let label_anchor = polygons
                    .iter()
                    .filter_map(|rings| rings.first())
                    .map(|ring| ring_area_centroid(ring))
                    .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
                    .map(|(_, c)| c);

                MapShape {
                    feature_id: feature.id.clone(),
                    record_key: record.map(|r| r.key.clone()),
                    label: record.map(|r| r.key.clone()),
                    polygons,
                    fill,
                    opacity: shape_opacity(record, state),
                    selected: record.is_some_and(|r| state.selected_county.as_ref() == Some(&r.key)),
                    label_anchor,
                }
            })
            .collect();

        Self {
            size,
            shapes,
            legend: Legend::for_layer(state.layer),
            show_labels: state.overlays.labels,
        }
    }

    /// Topmost shape under a screen point.
    pub fn shape_at(&self, p: (f64, f64)) -> Option<&MapShape> {
        self.shapes.iter().rev().find(|s| s.contains(p))
    }

    /// Fill order: shapes sitting in another shape's hole come after it, so the
    /// hole's white fill never covers them.
    pub fn fill_order(&self) -> Vec<&MapShape> {
        let mut ordered: Vec<&MapShape> = self.shapes.iter().collect();
        ordered.sort_by_cached_key(|shape| {
            self.shapes
                .iter()
                .any(|other| !std::ptr::eq(other, *shape) && shape.lies_in_hole_of(other))
        });
        ordered
    }
}

/// Draws map scenes.
pub struct MapPresenter;

impl MapPresenter {
    fn to_px(ring: &[(f64, f64)]) -> Vec<(i32, i32)> {
        ring.iter()
            .map(|&(x, y)| (x.round() as i32, y.round() as i32))
            .collect()
    }

    /// Clear and redraw every shape. Labels are drawn only when `with_labels` is set,
    /// since rasterising text needs a system font.
    pub fn draw<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        scene: &MapScene,
        with_labels: bool,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        root.fill(&WHITE)?;

        for shape in scene.fill_order() {
            let fill = shape.fill.to_plotters().mix(shape.opacity).filled();
            for rings in &shape.polygons {
                if let Some(exterior) = rings.first() {
                    root.draw(&Polygon::new(Self::to_px(exterior), fill))?;
                }
                for hole in rings.iter().skip(1) {
                    root.draw(&Polygon::new(Self::to_px(hole), WHITE.filled()))?;
                }
            }
        }

        // Outlines after every fill; selected shape last so its outline is on top.
        let outlined = scene
            .shapes
            .iter()
            .filter(|s| !s.selected)
            .chain(scene.shapes.iter().filter(|s| s.selected));

        for shape in outlined {
            let stroke = if shape.selected {
                palette::SELECTED_STROKE.to_plotters().stroke_width(3)
            } else {
                palette::STROKE.to_plotters().stroke_width(1)
            };

            for rings in &shape.polygons {
                for ring in rings {
                    let mut outline = Self::to_px(ring);
                    if let Some(first) = outline.first().copied() {
                        outline.push(first);
                    }
                    root.draw(&PathElement::new(outline, stroke))?;
                }
            }
        }

        if with_labels && scene.show_labels {
            let style = ("sans-serif", 10)
                .into_font()
                .color(&RGBColor(0x33, 0x33, 0x33))
                .pos(Pos::new(HPos::Center, VPos::Center));
            for shape in &scene.shapes {
                if let (Some(label), Some((x, y))) = (&shape.label, shape.label_anchor) {
                    root.draw(&Text::new(
                        label.clone(),
                        (x.round() as i32, y.round() as i32),
                        style.clone(),
                    ))?;
                }
            }
        }

        Ok(())
    }

    /// Render the scene into an RGB pixel buffer for the UI texture.
    pub fn render_rgb(scene: &MapScene) -> Result<Vec<u8>, RenderError> {
        let (w, h) = scene.size;
        let mut buffer = vec![255u8; (w as usize) * (h as usize) * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
            Self::draw(&root, scene, false).map_err(RenderError::draw)?;
            root.present().map_err(RenderError::draw)?;
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::HousingRow;
    use crate::data::{CountyJoiner, IncomeRow, PopulationTable};
    use crate::state::Action;

    fn square(id: &str, name: &str, lon: f64) -> GeoFeature {
        GeoFeature {
            id: id.to_string(),
            name: Some(name.to_string()),
            polygons: vec![vec![vec![
                (lon, 43.5),
                (lon + 0.5, 43.5),
                (lon + 0.5, 44.0),
                (lon, 44.0),
                (lon, 43.5),
            ]]],
        }
    }

    fn fixture() -> (Vec<MergedRecord>, Vec<GeoFeature>) {
        let housing: Vec<HousingRow> = [
            ("Multnomah", "Metro", 70_000.0),
            ("Lane (IOU clip)", "Valley", 20_000.0),
            ("Baker", "Eastern", 400.0),
        ]
        .iter()
        .map(|(county, region, units)| HousingRow {
            county: county.to_string(),
            region: Region::parse(region),
            units: *units,
            buildings: 100.0,
            residents: 1000.0,
            low_income_households: 10.0,
            low_income_share: 20.0,
        })
        .collect();
        let income = vec![
            IncomeRow {
                county: "Multnomah County".into(),
                ami_100: 120_000.0,
                ami_80: 96_000.0,
                ami_60: 72_000.0,
            },
            IncomeRow {
                county: "Baker County".into(),
                ami_100: 81_400.0,
                ami_80: 65_120.0,
                ami_60: 48_840.0,
            },
        ];
        let records = CountyJoiner::merge(&housing, &income, &PopulationTable::default());
        let features = vec![
            square("41051", "Multnomah", -122.0),
            square("41039", "Lane", -121.0),
            square("41001", "Baker", -120.0),
            square("41999", "Nowhere", -119.0),
        ];
        (records, features)
    }

    fn build(state: &AppState) -> MapScene {
        let (records, features) = fixture();
        MapScene::build(state, &records, &features, (800, 600), &MapConfig::default())
    }

    #[test]
    fn shapes_match_records_by_name() {
        let scene = build(&AppState::default());
        let keys: Vec<Option<&str>> = scene.shapes.iter().map(|s| s.record_key.as_deref()).collect();
        assert_eq!(keys, vec![Some("Multnomah"), Some("Lane"), Some("Baker"), None]);
        assert_eq!(scene.shapes[3].fill, palette::NO_DATA);
        assert!(scene.shapes.iter().all(|s| s.opacity == 1.0));
    }

    #[test]
    fn income_layer_without_income_paints_no_data() {
        let state = AppState::default().apply(Action::SetLayer(MapLayer::Income));
        let scene = build(&state);
        assert_eq!(scene.shapes[1].fill, palette::NO_DATA);
        assert_ne!(scene.shapes[0].fill, palette::NO_DATA);
        assert_eq!(scene.legend.title, "Area Median Income");
        assert_eq!(scene.legend.steps[0].1, "$81K");
    }

    #[test]
    fn threshold_above_every_income_dims_all_shapes() {
        let state = AppState::default().apply(Action::SetMinIncome(Some(1_000_000.0)));
        let scene = build(&state);
        assert_eq!(scene.shapes.len(), 4);
        assert!(scene.shapes.iter().all(|s| s.opacity == FILTER_DIM));
    }

    #[test]
    fn filters_combine_by_strongest_dimming() {
        let state = AppState::default()
            .apply(Action::SetMetroHighlight(true))
            .apply(Action::SetRegionFilter(Some(Region::Metro)));
        let scene = build(&state);
        assert_eq!(scene.shapes[0].opacity, 1.0);
        assert_eq!(scene.shapes[1].opacity, FILTER_DIM);

        let state = AppState::default().apply(Action::SetMetroHighlight(true));
        let scene = build(&state);
        assert_eq!(scene.shapes[2].opacity, METRO_DIM);
    }

    #[test]
    fn selection_marks_one_shape_and_hit_test_finds_it() {
        let state = AppState::default().apply(Action::SelectCounty(Some("Baker".into())));
        let scene = build(&state);
        let selected: Vec<&str> = scene
            .shapes
            .iter()
            .filter(|s| s.selected)
            .map(|s| s.feature_id.as_str())
            .collect();
        assert_eq!(selected, vec!["41001"]);

        let anchor = scene.shapes[2].label_anchor.unwrap();
        assert_eq!(scene.shape_at(anchor).map(|s| s.feature_id.as_str()), Some("41001"));
        assert!(scene.shape_at((-1000.0, -1000.0)).is_none());
    }

    #[test]
    fn zoom_moves_shapes() {
        let base = build(&AppState::default());
        let zoomed = build(&AppState::default().apply(Action::ZoomBy {
            factor: 2.0,
            focus: (400.0, 300.0),
        }));
        assert_ne!(base.shapes[0].polygons, zoomed.shapes[0].polygons);
        assert_eq!(base.shapes.len(), zoomed.shapes.len());
    }

    fn screen_square(min: f64, max: f64) -> Vec<(f64, f64)> {
        vec![(min, min), (max, min), (max, max), (min, max)]
    }

    fn enclave_scene() -> MapScene {
        let shape = |id: &str, rings: Vec<Vec<(f64, f64)>>, fill: Rgb, anchor: (f64, f64)| MapShape {
            feature_id: id.to_string(),
            record_key: None,
            label: None,
            polygons: vec![rings],
            fill,
            opacity: 1.0,
            selected: false,
            label_anchor: Some(anchor),
        };
        MapScene {
            size: (100, 100),
            // Enclave listed first, so source order alone would paint the hole over it.
            shapes: vec![
                shape("inner", vec![screen_square(30.0, 70.0)], Rgb(200, 0, 0), (50.0, 50.0)),
                shape(
                    "outer",
                    vec![screen_square(10.0, 90.0), screen_square(30.0, 70.0)],
                    Rgb(0, 0, 200),
                    (20.0, 20.0),
                ),
            ],
            legend: Legend::for_layer(MapLayer::Units),
            show_labels: false,
        }
    }

    #[test]
    fn enclaves_fill_after_the_shape_around_them() {
        let scene = enclave_scene();
        let order: Vec<&str> = scene.fill_order().iter().map(|s| s.feature_id.as_str()).collect();
        assert_eq!(order, vec!["outer", "inner"]);

        // Source order is kept for shapes without holes.
        let plain = build(&AppState::default());
        let order: Vec<&str> = plain.fill_order().iter().map(|s| s.feature_id.as_str()).collect();
        assert_eq!(order, vec!["41051", "41039", "41001", "41999"]);
    }

    #[test]
    fn enclave_keeps_its_fill_inside_the_hole() {
        let scene = enclave_scene();
        let pixels = MapPresenter::render_rgb(&scene).unwrap();
        let at = |x: usize, y: usize| {
            let i = (y * 100 + x) * 3;
            (pixels[i], pixels[i + 1], pixels[i + 2])
        };
        assert_eq!(at(50, 50), (200, 0, 0));
        assert_eq!(at(20, 50), (0, 0, 200));
        assert_eq!(at(95, 95), (255, 255, 255));
    }

    #[test]
    fn legend_steps_per_layer() {
        let legend = Legend::for_layer(MapLayer::Units);
        let labels: Vec<&str> = legend.steps.iter().map(|(_, l)| l.as_str()).collect();
        assert_eq!(labels, vec!["0", "20,000", "40,000", "60,000", "80,000"]);
        assert_eq!(Legend::for_layer(MapLayer::LowIncome).steps[4].1, "60%");
    }
}
