//! Map Projection
//! Spherical Mercator with a fixed center/scale plus a bounded zoom-and-pan transform.

use serde::Serialize;
use std::f64::consts::FRAC_PI_4;

/// Smallest and largest zoom factor.
pub const SCALE_EXTENT: (f64, f64) = (1.0, 8.0);

/// Mercator projection centred on `center` and translated to `translate` (pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mercator {
    scale: f64,
    dx: f64,
    dy: f64,
}

impl Mercator {
    pub fn new(center: [f64; 2], scale: f64, translate: (f64, f64)) -> Self {
        let (cx, cy) = Self::raw(center[0], center[1]);
        Self {
            scale,
            dx: translate.0 - scale * cx,
            dy: translate.1 + scale * cy,
        }
    }

    fn raw(lon: f64, lat: f64) -> (f64, f64) {
        let lambda = lon.to_radians();
        let phi = lat.to_radians();
        (lambda, (FRAC_PI_4 + phi / 2.0).tan().ln())
    }

    /// Project (lon, lat) in degrees to pixel coordinates.
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = Self::raw(lon, lat);
        (self.dx + self.scale * x, self.dy - self.scale * y)
    }
}

/// Zoom transform applied after projection: screen = k * p + (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn apply(&self, p: (f64, f64)) -> (f64, f64) {
        (p.0 * self.k + self.x, p.1 * self.k + self.y)
    }

    pub fn invert(&self, p: (f64, f64)) -> (f64, f64) {
        ((p.0 - self.x) / self.k, (p.1 - self.y) / self.k)
    }

    /// Scale by `factor` keeping the screen point `focus` fixed. The result stays inside
    /// the scale extent.
    pub fn zoom_about(&self, factor: f64, focus: (f64, f64)) -> Self {
        let k = (self.k * factor).clamp(SCALE_EXTENT.0, SCALE_EXTENT.1);
        let anchor = self.invert(focus);
        Self {
            k,
            x: focus.0 - anchor.0 * k,
            y: focus.1 - anchor.1 * k,
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            k: self.k,
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}
