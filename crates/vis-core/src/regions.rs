//! Screen-space region model.
//!
//! The screen is split by a horizontal band (Equator) and a vertical band
//! (Meridian) crossing at the Core; outside both bands the upper half is North
//! and the lower half South. Each particle's colour and target radius are a
//! bilinear blend of the four regions around its projected position.

use crate::constants::REST_COLOUR;
use crate::params::{Region, VisualiserParams};
use glam::{Vec2, Vec4};

pub trait Mix: Copy {
    fn mix(self, other: Self, t: f32) -> Self;
}

impl Mix for f32 {
    #[inline]
    fn mix(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Mix for Vec4 {
    #[inline]
    fn mix(self, other: Self, t: f32) -> Self {
        self.lerp(other, t)
    }
}

/// Blend four corner values; `p.x` weighs the first axis, `p.y` the second.
#[inline]
pub fn bilinear<T: Mix>(v00: T, v10: T, v01: T, v11: T, p: Vec2) -> T {
    let x0 = v00.mix(v10, p.x);
    let x1 = v01.mix(v11, p.x);
    x0.mix(x1, p.y)
}

/// Hermite smoothstep; degenerates to a hard step when the edges coincide.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// How far outside the central bands a screen position lies, per axis.
///
/// Without smoothing each component is 0 inside its band and 1 outside.
pub fn band_coord(screen_pos: Vec2, band_size: Vec2, smoothness: f32) -> Vec2 {
    let lo = band_size * (1.0 - smoothness);
    let hi = band_size * (1.0 + smoothness);
    let a = screen_pos.abs();
    Vec2::new(smoothstep(lo.x, hi.x, a.x), smoothstep(lo.y, hi.y, a.y))
}

/// Region colours and target radii for the current frame, pre-blended by activation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionBlend {
    colours: [Vec4; Region::COUNT],
    radii: [f32; Region::COUNT],
    band_size: Vec2,
    band_smoothness: f32,
}

impl RegionBlend {
    pub fn new(params: &VisualiserParams, activation: f32) -> Self {
        let activation = activation.clamp(0.0, 1.0);
        let colours = params
            .regions
            .map(|r| REST_COLOUR.mix(r.colour, activation));
        let radii = params
            .regions
            .map(|r| params.base_radius * 1.0_f32.mix(1.0 + r.radius_mod, activation));
        Self {
            colours,
            radii,
            band_size: Vec2::new(params.horizontal_band_size, params.vertical_band_size),
            band_smoothness: params.band_smoothness,
        }
    }

    #[inline]
    pub fn colour(&self, region: Region) -> Vec4 {
        self.colours[region.index()]
    }

    #[inline]
    pub fn radius(&self, region: Region) -> f32 {
        self.radii[region.index()]
    }

    /// Target colour and distance from centre for a particle projected at `screen_pos` (NDC).
    pub fn sample(&self, screen_pos: Vec2) -> (Vec4, f32) {
        let p = band_coord(screen_pos, self.band_size, self.band_smoothness);
        let outer = if screen_pos.y > 0.0 {
            Region::North
        } else {
            Region::South
        };
        let corners = [Region::Core, Region::Equator, Region::Meridian, outer];
        let colour = bilinear(
            self.colour(corners[0]),
            self.colour(corners[1]),
            self.colour(corners[2]),
            self.colour(corners[3]),
            p,
        );
        let radius = bilinear(
            self.radius(corners[0]),
            self.radius(corners[1]),
            self.radius(corners[2]),
            self.radius(corners[3]),
            p,
        );
        (colour, radius)
    }
}
