//! The particle field: a sphere of particles pulled towards per-region target
//! radii, with spring/snap blending, jitter, mouse kicks and escapes.

use crate::camera::{project_to_ndc, FrameTransforms};
use crate::constants::{MIN_RADIAL_DISTANCE, MIN_SAMPLE_LEN_SQ, MIN_SNAP_TIME_MS};
use crate::mouse::MouseRay;
use crate::params::VisualiserParams;
use crate::regions::RegionBlend;
use glam::{Vec3, Vec4};
use rand::prelude::*;

/// Per-particle attributes uploaded to the GPU instance buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Instance {
    pub position: [f32; 3],
    pub colour: [f32; 4],
    pub size: f32,
}

impl Instance {
    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    #[inline]
    pub fn colour(&self) -> Vec4 {
        Vec4::from_array(self.colour)
    }
}

/// Simulation state that never reaches the GPU.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Fixed angular slot on the unit sphere.
    pub initial_position_norm: Vec3,
    pub velocity: Vec3,
    /// Drops to 0 when the mouse kicks the particle, recovers over the mouse effect duration.
    pub mouse_snappiness: f32,
    /// Drops to 0 when the particle escapes, recovers over the escape duration.
    pub escape_snappiness: f32,
    /// Outward speed threshold (after the escape multiplier) that triggers an escape.
    pub escape_probability: f32,
}

/// Everything the update needs besides the parameter bundle.
#[derive(Clone, Copy, Debug)]
pub struct FrameInput<'a> {
    pub dt: f32,
    pub activation: f32,
    pub transforms: &'a FrameTransforms,
    pub mouse: Option<MouseRay>,
}

/// Per-frame values shared by every particle.
struct StepConstants {
    dt: f32,
    activation: f32,
    snap_amount: f32,
    snap_factor: f32,
    damping: f32,
    force_scale: f32,
    jitter: f32,
    base_radius: f32,
    escape_multiplier: f32,
    mouse_radius: f32,
    mouse_repulsion: f32,
    mouse_step: f32,
    escape_step: f32,
}

impl StepConstants {
    fn new(frame: &FrameInput<'_>, params: &VisualiserParams) -> Self {
        let dt = frame.dt;
        Self {
            dt,
            activation: frame.activation.clamp(0.0, 1.0),
            snap_amount: params.movement_style,
            snap_factor: snap_factor(params.snappy_speed, dt),
            damping: (1.0 - params.damping_factor).max(0.0).powf(dt),
            force_scale: params.force_scale,
            jitter: params.jitter_amount,
            base_radius: params.base_radius,
            escape_multiplier: params.escape_speed_multiplier,
            mouse_radius: params.mouse_effect_radius,
            mouse_repulsion: params.mouse_repulsion,
            mouse_step: recovery_step(dt, params.mouse_effect_duration),
            escape_step: recovery_step(dt, params.escape_duration),
        }
    }
}

/// Owns the particles and their instance records; both arrays always have the same length.
pub struct ParticleField {
    particles: Vec<Particle>,
    instances: Vec<Instance>,
    rng: StdRng,
}

impl ParticleField {
    pub fn new(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            particles: Vec::new(),
            instances: Vec::new(),
            rng,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable access for hosts that script individual particles; the length cannot change.
    #[inline]
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    #[inline]
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    #[inline]
    pub fn instances_mut(&mut self) -> &mut [Instance] {
        &mut self.instances
    }

    /// Grow, shrink or rebuild the population to `count` particles.
    ///
    /// Existing particles are preserved unless `clear_existing` is set. New
    /// particles take the current base radius, size and size randomness.
    pub fn initialize(&mut self, count: usize, clear_existing: bool, params: &VisualiserParams) {
        if clear_existing {
            self.particles.clear();
            self.instances.clear();
        }

        if count < self.instances.len() {
            self.instances.truncate(count);
            self.particles.truncate(count);
        } else {
            let base_radius = params.base_radius;
            let base_size = params.particle_size;
            let size_range = if params.particle_size_randomness.is_finite() {
                params.particle_size_randomness.clamp(0.0, 1.0)
            } else {
                0.0
            };
            let added = count - self.instances.len();
            self.instances.reserve(added);
            self.particles.reserve(added);

            while self.instances.len() < count {
                let norm = sample_unit_sphere(&mut self.rng);
                let size = base_size * self.rng.gen_range((1.0 - size_range)..=(1.0 + size_range));
                self.instances.push(Instance {
                    position: (norm * base_radius).to_array(),
                    colour: [self.rng.gen(), self.rng.gen(), self.rng.gen(), 1.0],
                    size,
                });
                self.particles.push(Particle {
                    initial_position_norm: norm,
                    velocity: Vec3::ZERO,
                    mouse_snappiness: 1.0,
                    escape_snappiness: 1.0,
                    escape_probability: self.rng.gen_range(0.0..=1.0),
                });
            }
            if added > 0 {
                log::debug!("[particles] added {} (now {})", added, count);
            }
        }

        debug_assert_eq!(self.instances.len(), self.particles.len());
    }

    /// Advance every particle by one frame and return the refreshed instance records.
    pub fn update(&mut self, frame: &FrameInput<'_>, params: &VisualiserParams) -> &[Instance] {
        let k = StepConstants::new(frame, params);
        let regions = RegionBlend::new(params, k.activation);
        let mvp = frame.transforms.mvp();

        for (instance, particle) in self.instances.iter_mut().zip(self.particles.iter_mut()) {
            let screen = project_to_ndc(&mvp, instance.position());
            let (colour, target_distance) = regions.sample(screen);
            step_particle(
                instance,
                particle,
                colour,
                target_distance,
                frame.mouse.as_ref(),
                &k,
                &mut self.rng,
            );
        }

        &self.instances
    }
}

fn step_particle<R: Rng>(
    instance: &mut Instance,
    particle: &mut Particle,
    colour: Vec4,
    target_distance: f32,
    mouse: Option<&MouseRay>,
    k: &StepConstants,
    rng: &mut R,
) {
    let dt = k.dt;
    let mut pos = instance.position();
    let rest = particle.initial_position_norm * k.base_radius;

    // Radial spring towards the region's target distance
    let distance = pos.length();
    let error = distance - target_distance;
    let norm_pos = if distance > MIN_RADIAL_DISTANCE {
        pos / distance
    } else {
        particle.initial_position_norm
    };
    let mut acceleration = -k.force_scale * error * norm_pos;

    if error > 0.0 {
        let mut jitter = error
            * k.jitter
            * Vec3::new(
                rng.gen::<f32>() - 0.5,
                rng.gen::<f32>() - 0.5,
                rng.gen::<f32>() - 0.5,
            );
        // keep only the component tangent to the sphere
        jitter -= jitter.dot(norm_pos) * norm_pos;
        acceleration += jitter;
    }

    if let Some(ray) = mouse {
        let offset = ray.offset_from(pos);
        let d = offset.length();
        if d > 0.0 && d < k.mouse_radius {
            let magnitude = 1.0 - d / k.mouse_radius;
            acceleration += magnitude * k.mouse_repulsion * (offset / d) * ray.speed;
            particle.mouse_snappiness = 0.0;
        }
    }

    // Snap: pull velocity towards the velocity that would follow an EMA to the target slot
    if dt > 0.0 {
        let snap_pos = ema(pos, target_distance * particle.initial_position_norm, k.snap_factor);
        let snap_velocity = (snap_pos - pos) / dt;
        let amount = k.snap_amount * particle.mouse_snappiness * particle.escape_snappiness;
        particle.velocity = particle.velocity.lerp(snap_velocity, amount);
    }

    // s = u t + 1/2 a t^2, v = u + a t
    pos += particle.velocity * dt + acceleration * (0.5 * dt * dt);
    particle.velocity += acceleration * dt;
    particle.velocity *= k.damping;

    // Rest pull back onto the base sphere when not activated
    pos = pos.lerp(rest, (1.0 - k.activation) * particle.mouse_snappiness);

    let radial_speed = particle.velocity.dot(norm_pos);
    if radial_speed * k.escape_multiplier > particle.escape_probability {
        particle.escape_snappiness = 0.0;
    }

    particle.mouse_snappiness = recover(particle.mouse_snappiness, k.mouse_step);
    particle.escape_snappiness = recover(particle.escape_snappiness, k.escape_step);

    if !pos.is_finite() || !particle.velocity.is_finite() {
        log::warn!("[particles] non-finite state; returning particle to rest");
        pos = rest;
        particle.velocity = Vec3::ZERO;
    }

    instance.position = pos.to_array();
    instance.colour = colour.to_array();
}

/// Uniform point inside the unit ball by rejection sampling from the enclosing cube.
pub fn sample_in_unit_ball<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let p = Vec3::new(
            (rng.gen::<f32>() - 0.5) * 2.0,
            (rng.gen::<f32>() - 0.5) * 2.0,
            (rng.gen::<f32>() - 0.5) * 2.0,
        );
        let len_sq = p.length_squared();
        if len_sq <= 1.0 && len_sq > MIN_SAMPLE_LEN_SQ {
            return p;
        }
    }
}

/// Uniformly distributed direction on the unit sphere.
#[inline]
pub fn sample_unit_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    sample_in_unit_ball(rng).normalize()
}

/// Per-frame EMA coefficient giving a half-life of `time_ms` at the frame rate `1/dt`.
pub fn snap_factor(time_ms: f32, dt: f32) -> f32 {
    if time_ms > MIN_SNAP_TIME_MS && dt > 0.0 {
        let frames = time_ms / 1000.0 / dt;
        (-std::f32::consts::LN_2 / frames).exp()
    } else {
        0.0
    }
}

#[inline]
fn ema(last: Vec3, input: Vec3, factor: f32) -> Vec3 {
    input + factor * (last - input)
}

#[inline]
fn recovery_step(dt: f32, duration: f32) -> f32 {
    if duration > 0.0 {
        dt / duration
    } else {
        1.0
    }
}

#[inline]
fn recover(multiplier: f32, step: f32) -> f32 {
    if multiplier < 1.0 {
        (multiplier + step).min(1.0)
    } else {
        multiplier
    }
}
