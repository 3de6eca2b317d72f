//! Stats module - regional summaries

mod calculator;

pub use calculator::StatsCalculator;
