//! Housing Explorer - County Housing & Income Visualization
//!
//! A Rust application joining housing estimates with area median income by county and
//! presenting them as a choropleth map, ranked charts and comparison tables.

mod charts;
mod config;
mod data;
mod geo;
mod gui;
mod state;
mod stats;

use anyhow::Context;
use config::AppConfig;
use eframe::egui;
use gui::HousingExplorerApp;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "housing_explorer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Optional config path as the first argument
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::resolve(config_path.as_deref()).context("loading configuration")?;
    tracing::info!(
        housing = %config.sources.housing,
        income = %config.sources.income,
        topology = %config.sources.topology,
        "starting housing explorer"
    );

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([1000.0, 640.0])
            .with_title("Housing Explorer"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Housing Explorer",
        options,
        Box::new(|cc| Ok(Box::new(HousingExplorerApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
