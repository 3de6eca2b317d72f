//! Color Palette
//! Fixed region colors and sequential ramps for the choropleth layers.

use crate::data::Region;
use crate::state::MapLayer;
use egui::Color32;
use plotters::style::RGBColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn hex(value: u32) -> Self {
        Rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    pub fn to_color32(self) -> Color32 {
        Color32::from_rgb(self.0, self.1, self.2)
    }

    pub fn to_plotters(self) -> RGBColor {
        RGBColor(self.0, self.1, self.2)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

/// Fill for shapes without data.
pub const NO_DATA: Rgb = Rgb::hex(0xdddddd);

/// Shape outline.
pub const STROKE: Rgb = Rgb::hex(0xffffff);

/// Outline of the selected shape.
pub const SELECTED_STROKE: Rgb = Rgb::hex(0x222222);

pub fn region_color(region: &Region) -> Rgb {
    match region {
        Region::Metro => Rgb::hex(0x636efa),
        Region::Valley => Rgb::hex(0xef553b),
        Region::Southern => Rgb::hex(0x00cc96),
        Region::Central => Rgb::hex(0xab63fa),
        Region::Coast => Rgb::hex(0xffa15a),
        Region::Eastern => Rgb::hex(0x19d3f3),
        Region::Other(_) => Rgb::hex(0x999999),
    }
}

// Nine-class sequential ramps, light to dark.
const BLUES: [u32; 9] = [
    0xf7fbff, 0xdeebf7, 0xc6dbef, 0x9ecae1, 0x6baed6, 0x4292c6, 0x2171b5, 0x08519c, 0x08306b,
];
const GREENS: [u32; 9] = [
    0xf7fcf5, 0xe5f5e0, 0xc7e9c0, 0xa1d99b, 0x74c476, 0x41ab5d, 0x238b45, 0x006d2c, 0x00441b,
];
const REDS: [u32; 9] = [
    0xfff5f0, 0xfee0d2, 0xfcbba1, 0xfc9272, 0xfb6a4a, 0xef3b2c, 0xcb181d, 0xa50f15, 0x67000d,
];
const PURPLES: [u32; 9] = [
    0xfcfbfd, 0xefedf5, 0xdadaeb, 0xbcbddc, 0x9e9ac8, 0x807dba, 0x6a51a3, 0x54278f, 0x3f007d,
];
const ORANGES: [u32; 9] = [
    0xfff5eb, 0xfee6ce, 0xfdd0a2, 0xfdae6b, 0xfd8d3c, 0xf16913, 0xd94801, 0xa63603, 0x7f2704,
];

/// Sequential color scale over a fixed numeric domain.
#[derive(Debug, Clone, Copy)]
pub struct SequentialScale {
    domain: (f64, f64),
    ramp: &'static [u32; 9],
}

impl SequentialScale {
    pub fn for_layer(layer: MapLayer) -> Self {
        let (domain, ramp) = match layer {
            MapLayer::Units => ((0.0, 80_000.0), &BLUES),
            MapLayer::Income => ((81_400.0, 124_100.0), &GREENS),
            MapLayer::LowIncome => ((0.0, 60.0), &REDS),
            MapLayer::Density => ((0.0, 200.0), &PURPLES),
            MapLayer::PerCapita => ((0.0, 400.0), &ORANGES),
        };
        Self { domain, ramp }
    }

    /// Color for `value`, clamped to the domain.
    pub fn color(&self, value: f64) -> Rgb {
        let (lo, hi) = self.domain;
        let t = if hi > lo && value.is_finite() {
            ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let segments = (self.ramp.len() - 1) as f64;
        let pos = t * segments;
        let idx = (pos.floor() as usize).min(self.ramp.len() - 2);
        Rgb::hex(self.ramp[idx]).lerp(Rgb::hex(self.ramp[idx + 1]), pos - idx as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_endpoints_and_clamping() {
        let scale = SequentialScale::for_layer(MapLayer::Units);
        assert_eq!(scale.color(0.0), Rgb::hex(0xf7fbff));
        assert_eq!(scale.color(80_000.0), Rgb::hex(0x08306b));
        assert_eq!(scale.color(-5.0), scale.color(0.0));
        assert_eq!(scale.color(1e9), scale.color(80_000.0));
        assert_eq!(scale.color(f64::NAN), scale.color(0.0));
    }

    #[test]
    fn scale_midpoint_hits_ramp_stop() {
        let scale = SequentialScale::for_layer(MapLayer::LowIncome);
        assert_eq!(scale.color(30.0), Rgb::hex(REDS[4]));
    }

    #[test]
    fn hex_round_trip() {
        assert_eq!(Rgb::hex(0x636efa).to_hex(), "#636efa");
        assert_eq!(region_color(&Region::Metro), Rgb(0x63, 0x6e, 0xfa));
    }
}
