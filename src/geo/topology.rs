//! TopoJSON Decoder
//! Decodes quantized, delta-encoded TopoJSON into county polygons in lon/lat degrees.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Invalid topology JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Topology has no object named '{0}'")]
    MissingObject(String),
    #[error("Arc index {0} out of range")]
    ArcOutOfRange(i64),
}

/// Ring of (longitude, latitude) points.
pub type Ring = Vec<(f64, f64)>;

/// One county boundary. Each polygon is a list of rings, exterior first.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
    pub id: String,
    pub name: Option<String>,
    pub polygons: Vec<Vec<Ring>>,
}

#[derive(Debug, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    arcs: Vec<Vec<Vec<f64>>>,
    objects: HashMap<String, Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<HashMap<String, Value>>,
    #[serde(default)]
    arcs: Option<Value>,
    #[serde(default)]
    geometries: Option<Vec<Geometry>>,
}

pub struct TopologyDecoder;

impl TopologyDecoder {
    /// Decode every feature of `object`.
    pub fn decode(bytes: &[u8], object: &str) -> Result<Vec<GeoFeature>, TopologyError> {
        let topology: Topology = serde_json::from_slice(bytes)?;
        let arcs = Self::decode_arcs(&topology);

        let root = topology
            .objects
            .get(object)
            .ok_or_else(|| TopologyError::MissingObject(object.to_string()))?;

        let mut features = Vec::new();
        Self::collect(root, &arcs, &mut features)?;
        Ok(features)
    }

    /// Decode and keep only features whose id starts with the state FIPS prefix.
    pub fn decode_state(
        bytes: &[u8],
        object: &str,
        fips_prefix: &str,
    ) -> Result<Vec<GeoFeature>, TopologyError> {
        let features: Vec<GeoFeature> = Self::decode(bytes, object)?
            .into_iter()
            .filter(|f| f.id.starts_with(fips_prefix))
            .collect();

        if features.is_empty() {
            warn!(prefix = fips_prefix, "no features matched the state prefix");
        } else {
            debug!(count = features.len(), prefix = fips_prefix, "state features decoded");
        }
        Ok(features)
    }

    /// Absolute positions for every arc, with the quantization transform applied.
    fn decode_arcs(topology: &Topology) -> Vec<Ring> {
        topology
            .arcs
            .iter()
            .map(|arc| match &topology.transform {
                Some(t) => {
                    let (mut x, mut y) = (0.0, 0.0);
                    arc.iter()
                        .filter(|p| p.len() >= 2)
                        .map(|p| {
                            x += p[0];
                            y += p[1];
                            (
                                x * t.scale[0] + t.translate[0],
                                y * t.scale[1] + t.translate[1],
                            )
                        })
                        .collect()
                }
                None => arc
                    .iter()
                    .filter(|p| p.len() >= 2)
                    .map(|p| (p[0], p[1]))
                    .collect(),
            })
            .collect()
    }

    /// Stitch a ring from arc indices. Negative index `i` means arc `!i` reversed.
    fn ring(indices: &[i64], arcs: &[Ring]) -> Result<Ring, TopologyError> {
        let mut ring: Ring = Vec::new();
        for &index in indices {
            let (arc_idx, reversed) = if index < 0 {
                (!index, true)
            } else {
                (index, false)
            };
            let arc = usize::try_from(arc_idx)
                .ok()
                .and_then(|i| arcs.get(i))
                .ok_or(TopologyError::ArcOutOfRange(index))?;

            if !ring.is_empty() {
                ring.pop();
            }
            if reversed {
                ring.extend(arc.iter().rev().copied());
            } else {
                ring.extend(arc.iter().copied());
            }
        }
        Ok(ring)
    }

    fn polygon(rings: &[Vec<i64>], arcs: &[Ring]) -> Result<Vec<Ring>, TopologyError> {
        rings.iter().map(|r| Self::ring(r, arcs)).collect()
    }

    fn collect(
        geometry: &Geometry,
        arcs: &[Ring],
        out: &mut Vec<GeoFeature>,
    ) -> Result<(), TopologyError> {
        let polygons = match geometry.kind.as_str() {
            "GeometryCollection" => {
                for child in geometry.geometries.iter().flatten() {
                    Self::collect(child, arcs, out)?;
                }
                return Ok(());
            }
            "Polygon" => {
                let rings: Vec<Vec<i64>> = match &geometry.arcs {
                    Some(value) => serde_json::from_value(value.clone())?,
                    None => Vec::new(),
                };
                vec![Self::polygon(&rings, arcs)?]
            }
            "MultiPolygon" => {
                let polys: Vec<Vec<Vec<i64>>> = match &geometry.arcs {
                    Some(value) => serde_json::from_value(value.clone())?,
                    None => Vec::new(),
                };
                polys
                    .iter()
                    .map(|p| Self::polygon(p, arcs))
                    .collect::<Result<_, _>>()?
            }
            other => {
                debug!(kind = other, "skipping non-areal geometry");
                return Ok(());
            }
        };

        let id = match &geometry.id {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let name = geometry
            .properties
            .as_ref()
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);

        out.push(GeoFeature { id, name, polygons });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two squares sharing an edge (arc 1), quantized with scale 1 and translate (-120, 40).
    const SAMPLE: &str = r#"{
        "type": "Topology",
        "transform": { "scale": [1, 1], "translate": [-120, 40] },
        "arcs": [
            [[1, 0], [-1, 0], [0, 1], [1, 0]],
            [[1, 1], [0, -1]],
            [[1, 1], [1, 0], [0, -1], [-1, 0]]
        ],
        "objects": {
            "counties": {
                "type": "GeometryCollection",
                "geometries": [
                    { "type": "Polygon", "id": "41001", "properties": { "name": "Baker" }, "arcs": [[0, 1]] },
                    { "type": "MultiPolygon", "id": 6001, "properties": { "name": "Alameda" }, "arcs": [[[2, -2]]] },
                    { "type": "Point", "id": "41999" }
                ]
            }
        }
    }"#;

    #[test]
    fn decodes_delta_arcs_and_stitches_rings() {
        let features = TopologyDecoder::decode(SAMPLE.as_bytes(), "counties").unwrap();
        assert_eq!(features.len(), 2);

        let baker = &features[0];
        assert_eq!(baker.id, "41001");
        assert_eq!(baker.name.as_deref(), Some("Baker"));
        assert_eq!(
            baker.polygons[0][0],
            vec![
                (-119.0, 40.0),
                (-120.0, 40.0),
                (-120.0, 41.0),
                (-119.0, 41.0),
                (-119.0, 40.0)
            ]
        );
    }

    #[test]
    fn reversed_arcs_and_numeric_ids() {
        let features = TopologyDecoder::decode(SAMPLE.as_bytes(), "counties").unwrap();
        let alameda = &features[1];
        assert_eq!(alameda.id, "6001");
        let ring = &alameda.polygons[0][0];
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[1], (-118.0, 41.0));
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn state_filter_uses_id_prefix() {
        let features = TopologyDecoder::decode_state(SAMPLE.as_bytes(), "counties", "41").unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id, "41001");
    }

    #[test]
    fn missing_object_is_an_error() {
        assert!(matches!(
            TopologyDecoder::decode(SAMPLE.as_bytes(), "states"),
            Err(TopologyError::MissingObject(_))
        ));
    }
}
