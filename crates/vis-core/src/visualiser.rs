//! Frame orchestration: parameters in, instance records out.

use crate::activation::ActivationEnvelope;
use crate::camera::{advance_rotation, Camera, FrameTransforms};
use crate::constants::MAX_DELTA_TIME;
use crate::mouse::MouseTracker;
use crate::params::{ParamChanges, VisualiserParams};
use crate::particles::{FrameInput, Instance, Particle, ParticleField};
use glam::Vec2;

/// Uniform block consumed by the particle shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RenderUniforms {
    pub projection: [[f32; 4]; 4],
    pub model_view: [[f32; 4]; 4],
    pub particle_smoothness: f32,
    pub background_fade: f32,
    pub _pad: [f32; 2],
}

/// Clamp a measured frame time into `[0, MAX_DELTA_TIME]`; stalled or broken clocks give a full step.
#[inline]
pub fn sanitize_delta_time(dt: f32) -> f32 {
    if !dt.is_finite() || dt > MAX_DELTA_TIME {
        MAX_DELTA_TIME
    } else {
        dt.max(0.0)
    }
}

pub struct Visualiser {
    params: VisualiserParams,
    field: ParticleField,
    envelope: ActivationEnvelope,
    transforms: FrameTransforms,
    mouse: MouseTracker,
    rotation_angle: f32,
    viewport: (u32, u32),
}

impl Visualiser {
    pub fn new(params: VisualiserParams, seed: u64) -> Self {
        let params = params.sanitized();
        let mut field = ParticleField::new(seed);
        field.initialize(params.num_particles, true, &params);
        let transforms = FrameTransforms::new(&Camera::from_params(&params, 1.0));
        log::info!("[visualiser] created with {} particles", field.len());
        Self {
            params,
            field,
            envelope: ActivationEnvelope::new(),
            transforms,
            mouse: MouseTracker::new(),
            rotation_angle: 0.0,
            viewport: (1, 1),
        }
    }

    #[inline]
    pub fn params(&self) -> &VisualiserParams {
        &self.params
    }

    /// Replace the parameter snapshot, applying whatever it invalidates.
    pub fn set_params(&mut self, params: VisualiserParams) -> ParamChanges {
        let params = params.sanitized();
        let changes = params.changes_from(&self.params);
        self.params = params;

        if changes.camera {
            self.update_view_proj();
        }
        if changes.rebuild_particles {
            log::debug!("[visualiser] particle appearance changed; rebuilding");
            self.field
                .initialize(self.params.num_particles, true, &self.params);
        } else if changes.resize_particles {
            self.field
                .initialize(self.params.num_particles, false, &self.params);
        }
        changes
    }

    /// Track the drawable size; zero-sized viewports keep the previous matrices.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        self.update_view_proj();
    }

    /// Discard and recreate every particle.
    pub fn reset(&mut self) {
        log::info!("[visualiser] reset");
        self.field
            .initialize(self.params.num_particles, true, &self.params);
    }

    /// Cursor in NDC, or `None` when it has left the view.
    pub fn set_mouse(&mut self, position: Option<Vec2>) {
        self.mouse.set_position(position);
    }

    /// Run one frame and return the instance records for the render sink.
    pub fn frame(&mut self, dt: f32, audio_level: f32) -> &[Instance] {
        let dt = sanitize_delta_time(dt);
        let p = &self.params;

        self.rotation_angle = advance_rotation(self.rotation_angle, p.rotation_speed, dt);
        self.transforms.set_rotation(self.rotation_angle);

        let activation = self.envelope.update(
            audio_level,
            p.activation_threshold,
            p.activation_attack,
            p.activation_release,
            dt,
        );
        let mouse = self.mouse.sample(dt, &self.transforms, p.mouse_effect_radius);

        let input = FrameInput {
            dt,
            activation,
            transforms: &self.transforms,
            mouse,
        };
        self.field.update(&input, &self.params)
    }

    pub fn render_uniforms(&self) -> RenderUniforms {
        RenderUniforms {
            projection: self.transforms.proj.to_cols_array_2d(),
            model_view: self.transforms.model_view().to_cols_array_2d(),
            particle_smoothness: self.params.particle_smoothness,
            background_fade: self.params.background_fade / self.params.base_radius,
            _pad: [0.0; 2],
        }
    }

    #[inline]
    pub fn activation(&self) -> f32 {
        self.envelope.value()
    }

    #[inline]
    pub fn instances(&self) -> &[Instance] {
        self.field.instances()
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        self.field.particles()
    }

    #[inline]
    pub fn particle_count(&self) -> usize {
        self.field.len()
    }

    #[inline]
    pub fn field_mut(&mut self) -> &mut ParticleField {
        &mut self.field
    }

    #[inline]
    pub fn transforms(&self) -> &FrameTransforms {
        &self.transforms
    }

    #[inline]
    pub fn rotation_angle(&self) -> f32 {
        self.rotation_angle
    }

    fn update_view_proj(&mut self) {
        let (w, h) = self.viewport;
        if w == 0 || h == 0 {
            return;
        }
        let camera = Camera::from_params(&self.params, w as f32 / h as f32);
        self.transforms.set_camera(&camera);
    }
}
