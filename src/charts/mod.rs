//! Charts module - map scenes, ranked charts and static export

pub mod choropleth;
pub mod format;
pub mod palette;
mod plotter;
mod renderer;

pub use choropleth::{MapPresenter, MapScene, MapShape};
pub use plotter::{ChartPlotter, ChartSpec};
pub use renderer::{RenderError, StaticChartRenderer};
