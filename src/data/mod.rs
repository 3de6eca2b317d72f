//! Data module - table loading, typed rows and the county join

pub mod loader;
pub mod population;
pub mod processor;
pub mod schema;

pub use loader::{DataLoader, LoadedData};
pub use population::PopulationTable;
pub use processor::{match_county, CountyJoiner, MergedRecord};
pub use schema::{HousingRow, IncomeRow, Region};
