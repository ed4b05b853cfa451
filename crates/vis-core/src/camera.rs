//! Camera and per-frame transforms.
//!
//! These types avoid platform-specific APIs. The native frontend uploads the
//! projection and model-view matrices; the particle update uses the combined
//! model-view-projection to find each particle's screen region, and the
//! inverses to build the mouse ray.

use crate::constants::{MIN_CLIP_W, Z_FAR, Z_NEAR};
use crate::params::VisualiserParams;
use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::TAU;

/// Simple right-handed camera description with perspective projection.
#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    /// Camera on the Y/Z plane looking at the sphere centre.
    pub fn from_params(params: &VisualiserParams, aspect: f32) -> Self {
        Self {
            eye: Vec3::new(0.0, params.camera_y, params.camera_z),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect,
            fovy_radians: params.camera_fov.to_radians(),
            znear: Z_NEAR,
            zfar: Z_FAR,
        }
    }

    /// Compute the clip-space projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }
    /// Compute the view matrix that transforms world to view space.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }
}

/// Model/view/projection matrices with their inverses for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTransforms {
    pub model: Mat4,
    pub inv_model: Mat4,
    pub view: Mat4,
    pub inv_view: Mat4,
    pub proj: Mat4,
    pub inv_proj: Mat4,
    pub camera_pos: Vec3,
}

impl FrameTransforms {
    pub fn new(camera: &Camera) -> Self {
        let mut t = Self {
            model: Mat4::IDENTITY,
            inv_model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            inv_view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            inv_proj: Mat4::IDENTITY,
            camera_pos: Vec3::ZERO,
        };
        t.set_camera(camera);
        t
    }

    pub fn set_camera(&mut self, camera: &Camera) {
        self.proj = camera.projection_matrix();
        self.inv_proj = self.proj.inverse();
        self.view = camera.view_matrix();
        self.inv_view = self.view.inverse();
        self.camera_pos = camera.eye;
    }

    /// Model rotation about +Y.
    pub fn set_rotation(&mut self, angle: f32) {
        self.model = Mat4::from_rotation_y(angle);
        self.inv_model = Mat4::from_rotation_y(-angle);
    }

    #[inline]
    pub fn model_view(&self) -> Mat4 {
        self.view * self.model
    }

    #[inline]
    pub fn mvp(&self) -> Mat4 {
        self.proj * self.view * self.model
    }

    /// Camera position expressed in the rotating model space the particles live in.
    #[inline]
    pub fn camera_in_model_space(&self) -> Vec3 {
        self.inv_model.transform_point3(self.camera_pos)
    }
}

/// Project a model-space point to normalized device coordinates (perspective divided).
#[inline]
pub fn project_to_ndc(mvp: &Mat4, p: Vec3) -> Vec2 {
    let clip = *mvp * p.extend(1.0);
    let w = if clip.w.abs() < MIN_CLIP_W {
        MIN_CLIP_W.copysign(clip.w)
    } else {
        clip.w
    };
    Vec2::new(clip.x / w, clip.y / w)
}

/// Advance a rotation angle by `speed_degrees` per second, wrapped to \[0, 2π).
#[inline]
pub fn advance_rotation(angle: f32, speed_degrees: f32, dt: f32) -> f32 {
    (angle + speed_degrees.to_radians() * dt).rem_euclid(TAU)
}
