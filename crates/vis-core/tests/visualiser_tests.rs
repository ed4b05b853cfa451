// Host-side tests for frame orchestration, mouse interaction and the shared handle.

use glam::Vec2;
use instant::{Duration, Instant};
use std::thread;
use vis_core::*;

fn small_params(count: usize) -> VisualiserParams {
    VisualiserParams {
        num_particles: count,
        ..VisualiserParams::default()
    }
}

#[test]
fn delta_time_is_sanitized() {
    assert_eq!(sanitize_delta_time(0.016), 0.016);
    assert_eq!(sanitize_delta_time(5.0), 1.0);
    assert_eq!(sanitize_delta_time(f32::NAN), 1.0);
    assert_eq!(sanitize_delta_time(f32::INFINITY), 1.0);
    assert_eq!(sanitize_delta_time(-0.5), 0.0);
}

#[test]
fn count_changes_resize_without_rebuilding() {
    let mut vis = Visualiser::new(small_params(200), 1);
    vis.frame(1.0 / 60.0, 0.0);
    let first = vis.particles()[..200].to_vec();

    let changes = vis.set_params(small_params(350));
    assert!(changes.resize_particles);
    assert_eq!(vis.particle_count(), 350);
    assert_eq!(vis.instances().len(), 350);
    assert_eq!(&vis.particles()[..200], first.as_slice());

    vis.set_params(small_params(50));
    assert_eq!(vis.particle_count(), 50);
    assert_eq!(vis.frame(1.0 / 60.0, 0.0).len(), 50);
}

#[test]
fn size_changes_rebuild_particles() {
    let mut vis = Visualiser::new(small_params(100), 2);
    let before = vis.particles().to_vec();
    let params = VisualiserParams {
        particle_size: 0.2,
        particle_size_randomness: 0.0,
        ..small_params(100)
    };
    assert!(vis.set_params(params).rebuild_particles);
    assert_ne!(vis.particles(), before.as_slice());
    for inst in vis.instances() {
        assert!((inst.size - 0.2).abs() < 1e-6);
    }
}

#[test]
fn reset_recreates_population() {
    let mut vis = Visualiser::new(small_params(64), 3);
    let before = vis.particles().to_vec();
    vis.reset();
    assert_eq!(vis.particle_count(), 64);
    assert_ne!(vis.particles(), before.as_slice());
}

#[test]
fn camera_matrices_follow_viewport_and_params() {
    let mut vis = Visualiser::new(small_params(10), 4);
    vis.resize(800, 400);
    let wide = vis.transforms().proj;

    let mut params = vis.params().clone();
    params.camera_fov = 45.0;
    assert!(vis.set_params(params).camera);
    assert_ne!(vis.transforms().proj, wide);

    // a zero-sized viewport keeps the previous matrices
    let kept = *vis.transforms();
    vis.resize(0, 300);
    assert_eq!(vis.transforms().proj, kept.proj);
    assert_eq!(vis.transforms().view, kept.view);
}

#[test]
fn rotation_advances_with_rotation_speed() {
    let params = VisualiserParams {
        rotation_speed: 90.0,
        ..small_params(1)
    };
    let mut vis = Visualiser::new(params, 5);
    vis.frame(0.5, 0.0);
    assert!((vis.rotation_angle() - std::f32::consts::FRAC_PI_4).abs() < 1e-5);
}

#[test]
fn audio_drives_activation() {
    let mut vis = Visualiser::new(small_params(10), 6);
    for _ in 0..20 {
        vis.frame(0.02, 0.5);
    }
    assert_eq!(vis.activation(), 1.0);
    for _ in 0..20 {
        vis.frame(0.02, 0.0);
    }
    assert_eq!(vis.activation(), 0.0);
}

#[test]
fn broken_clock_never_leaks_nan() {
    let params = VisualiserParams {
        movement_style: 0.7,
        ..small_params(300)
    };
    let mut vis = Visualiser::new(params, 7);
    vis.resize(640, 480);
    vis.set_mouse(Some(Vec2::ZERO));
    for (i, dt) in [f32::NAN, 0.0, -1.0, 30.0, f32::INFINITY, 0.016]
        .into_iter()
        .enumerate()
    {
        vis.set_mouse(Some(Vec2::new(0.01 * i as f32, 0.0)));
        for inst in vis.frame(dt, 1.0) {
            assert!(inst.position().is_finite());
            assert!(inst.colour().is_finite());
            assert!(inst.size.is_finite());
        }
    }
}

#[test]
fn moving_mouse_kicks_nearby_particles() {
    let mut vis = Visualiser::new(VisualiserParams::default(), 8);
    vis.resize(800, 800);
    let dt = 1.0 / 60.0;

    vis.set_mouse(Some(Vec2::ZERO));
    vis.frame(dt, 0.0);
    assert!(vis.particles().iter().all(|p| p.mouse_snappiness == 1.0));

    vis.set_mouse(Some(Vec2::new(0.02, 0.0)));
    vis.frame(dt, 0.0);
    let kicked = vis
        .particles()
        .iter()
        .filter(|p| p.mouse_snappiness < 0.5)
        .count();
    assert!(kicked > 0, "no particle reacted to the mouse");
    for p in vis.particles() {
        assert!((0.0..=1.0).contains(&p.mouse_snappiness));
        assert!((0.0..=1.0).contains(&p.escape_snappiness));
    }

    // cursor leaves: multipliers recover linearly to 1 over the effect duration
    vis.set_mouse(None);
    for _ in 0..60 {
        vis.frame(dt, 0.0);
    }
    assert!(vis
        .particles()
        .iter()
        .all(|p| (p.mouse_snappiness - 1.0).abs() < 1e-4));
}

#[test]
fn mouse_tracker_needs_motion_and_radius() {
    let params = VisualiserParams::default();
    let transforms = FrameTransforms::new(&Camera::from_params(&params, 1.0));
    let mut mouse = MouseTracker::new();

    assert!(mouse.sample(0.016, &transforms, 1.0).is_none());

    mouse.set_position(Some(Vec2::new(0.3, 0.3)));
    assert!(
        mouse.sample(0.016, &transforms, 1.0).is_none(),
        "entering should not count as motion"
    );

    mouse.set_position(Some(Vec2::new(0.4, 0.3)));
    assert!(mouse.sample(0.016, &transforms, 0.0).is_none());

    mouse.set_position(Some(Vec2::new(0.5, 0.3)));
    let ray = mouse.sample(0.1, &transforms, 1.0).expect("ray");
    assert!((ray.speed - 1.0).abs() < 1e-4);
    assert!((ray.direction.length() - 1.0).abs() < 1e-5);
    assert!(ray.offset_from(ray.origin + ray.direction * 4.0).length() < 1e-4);
}

#[test]
fn mouse_ray_through_centre_hits_origin() {
    let params = VisualiserParams::default();
    let transforms = FrameTransforms::new(&Camera::from_params(&params, 1.0));
    let mut mouse = MouseTracker::new();
    mouse.set_position(Some(Vec2::new(0.1, 0.0)));
    mouse.set_position(Some(Vec2::ZERO));
    let ray = mouse.sample(0.016, &transforms, 1.0).expect("ray");
    assert!(ray.offset_from(glam::Vec3::ZERO).length() < 1e-3);
}

#[test]
fn ndc_mapping_from_pixels() {
    assert_eq!(ndc_from_pixels(0.0, 0.0, 200, 100), Some(Vec2::new(-1.0, 1.0)));
    assert_eq!(ndc_from_pixels(200.0, 100.0, 200, 100), Some(Vec2::new(1.0, -1.0)));
    assert_eq!(ndc_from_pixels(100.0, 50.0, 200, 100), Some(Vec2::ZERO));
    assert_eq!(ndc_from_pixels(-1.0, 50.0, 200, 100), None);
    assert_eq!(ndc_from_pixels(10.0, 10.0, 0, 100), None);
}

#[test]
fn render_uniforms_carry_fade_coefficient() {
    let params = VisualiserParams {
        background_fade: 0.6,
        base_radius: 2.0,
        particle_smoothness: 0.3,
        ..small_params(1)
    };
    let vis = Visualiser::new(params, 9);
    let u = vis.render_uniforms();
    assert!((u.background_fade - 0.3).abs() < 1e-6);
    assert_eq!(u.particle_smoothness, 0.3);
    assert_eq!(std::mem::size_of::<RenderUniforms>(), 144);
}

#[test]
fn shared_handle_keeps_arrays_consistent_across_threads() {
    let shared = SharedVisualiser::new(Visualiser::new(small_params(100), 10));
    shared.resize(320, 240);

    let writer = {
        let shared = shared.clone();
        thread::spawn(move || {
            for i in 0..200 {
                shared.update_params(|p| p.num_particles = 50 + (i * 37) % 500);
                shared.audio_level().store((i % 2) as f32);
            }
        })
    };

    for _ in 0..200 {
        shared.frame_with(1.0 / 60.0, |instances, uniforms| {
            assert!(instances.iter().all(|i| i.position().is_finite()));
            assert!(uniforms.particle_smoothness > 0.0);
        });
        shared.with(|vis| {
            assert_eq!(vis.instances().len(), vis.particles().len());
            assert_eq!(vis.particle_count(), vis.params().num_particles);
        });
    }
    writer.join().unwrap();
}

#[test]
fn audio_level_stores_silence_for_bad_readings() {
    let level = AudioLevel::new();
    level.store(0.42);
    assert_eq!(level.load(), 0.42);
    level.store(f32::NAN);
    assert_eq!(level.load(), 0.0);
    level.store(-1.0);
    assert_eq!(level.load(), 0.0);
}

#[test]
fn fps_counter_reports_once_per_interval() {
    let mut fps = FpsCounter::default();
    let start = Instant::now();
    let frame = Duration::from_micros(16_667);
    let busy = Duration::from_millis(5);

    let mut readings = Vec::new();
    for i in 0..=60u32 {
        let t = start + frame * i;
        fps.begin_frame(t);
        if let Some(r) = fps.end_frame(t + busy) {
            readings.push((i, r));
        }
    }
    assert_eq!(readings.len(), 1, "expected a single reading");
    let (at, reading) = readings[0];
    assert_eq!(at, 60);
    assert!((59..=61).contains(&reading.fps), "fps {}", reading.fps);
    assert!((reading.cpu_seconds - 61.0 * 0.005).abs() < 1e-3);
    assert_eq!(fps.latest(), Some(reading));
}
