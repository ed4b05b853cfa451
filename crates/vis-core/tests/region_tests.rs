// Host-side tests for the screen-space region blend.

use glam::{Vec2, Vec4};
use vis_core::*;

fn approx_vec4(a: Vec4, b: Vec4) -> bool {
    (a - b).abs().max_element() < 1e-5
}

#[test]
fn smoothstep_edges_and_midpoint() {
    assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
    assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
    assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    // coincident edges fall back to a hard step
    assert_eq!(smoothstep(0.3, 0.3, 0.2), 0.0);
    assert_eq!(smoothstep(0.3, 0.3, 0.3), 1.0);
}

#[test]
fn band_coord_is_zero_inside_and_one_outside() {
    let band = Vec2::splat(0.2);
    assert_eq!(band_coord(Vec2::ZERO, band, 0.2), Vec2::ZERO);
    assert_eq!(band_coord(Vec2::new(0.9, -0.9), band, 0.2), Vec2::ONE);
    assert_eq!(band_coord(Vec2::new(-0.9, 0.05), band, 0.2), Vec2::new(1.0, 0.0));
    let mid = band_coord(Vec2::new(0.2, 0.0), band, 0.2);
    assert!((mid.x - 0.5).abs() < 1e-5);
}

#[test]
fn bilinear_hits_corners() {
    let p = |x, y| Vec2::new(x, y);
    assert_eq!(bilinear(1.0, 2.0, 3.0, 4.0, p(0.0, 0.0)), 1.0);
    assert_eq!(bilinear(1.0, 2.0, 3.0, 4.0, p(1.0, 0.0)), 2.0);
    assert_eq!(bilinear(1.0, 2.0, 3.0, 4.0, p(0.0, 1.0)), 3.0);
    assert_eq!(bilinear(1.0, 2.0, 3.0, 4.0, p(1.0, 1.0)), 4.0);
    assert!((bilinear(1.0, 2.0, 3.0, 4.0, p(0.5, 0.5)) - 2.5).abs() < 1e-6);
}

#[test]
fn full_activation_picks_region_by_screen_position() {
    let params = VisualiserParams::default();
    let blend = RegionBlend::new(&params, 1.0);
    let colour_of = |r: Region| params.region(r).colour;

    let cases = [
        (Vec2::new(0.0, 0.0), Region::Core),
        (Vec2::new(0.9, 0.0), Region::Equator),
        (Vec2::new(0.0, -0.9), Region::Meridian),
        (Vec2::new(-0.9, 0.9), Region::North),
        (Vec2::new(0.9, -0.9), Region::South),
    ];
    for (pos, region) in cases {
        let (colour, _) = blend.sample(pos);
        assert!(
            approx_vec4(colour, colour_of(region)),
            "{pos:?} should be {region:?}, got {colour:?}"
        );
    }
}

#[test]
fn no_activation_is_white_at_base_radius() {
    let mut params = VisualiserParams::default();
    params.region_mut(Region::North).radius_mod = 0.5;
    let blend = RegionBlend::new(&params, 0.0);
    for pos in [Vec2::ZERO, Vec2::new(0.9, 0.9), Vec2::new(-0.5, -0.7)] {
        let (colour, radius) = blend.sample(pos);
        assert!(approx_vec4(colour, Vec4::ONE));
        assert!((radius - params.base_radius).abs() < 1e-6);
    }
}

#[test]
fn radius_modifier_scales_with_activation() {
    let mut params = VisualiserParams::default();
    params.region_mut(Region::Equator).radius_mod = 0.5;
    let pos = Vec2::new(0.9, 0.0);

    let (_, full) = RegionBlend::new(&params, 1.0).sample(pos);
    assert!((full - 4.5).abs() < 1e-5);

    let (_, half) = RegionBlend::new(&params, 0.5).sample(pos);
    assert!((half - 3.75).abs() < 1e-5);

    let (_, core) = RegionBlend::new(&params, 1.0).sample(Vec2::ZERO);
    assert!((core - 3.0).abs() < 1e-6);
}
