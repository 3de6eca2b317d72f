//! Geo module - county topology and map projection

mod projection;
mod topology;

pub use projection::{Mercator, ViewTransform};
pub use topology::{GeoFeature, TopologyDecoder, TopologyError};
