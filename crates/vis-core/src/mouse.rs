use crate::camera::FrameTransforms;
use crate::constants::MOUSE_UNPROJECT_DEPTH;
use glam::{Vec2, Vec3};

/// Ray from the camera through the cursor, in model space, plus cursor speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MouseRay {
    pub origin: Vec3,
    pub direction: Vec3,
    pub speed: f32, // NDC units per second
}

impl MouseRay {
    /// Perpendicular offset from the ray to `p`.
    #[inline]
    pub fn offset_from(&self, p: Vec3) -> Vec3 {
        let rel = p - self.origin;
        rel - rel.dot(self.direction) * self.direction
    }
}

/// Tracks the cursor between frames.
///
/// `current` is `None` while the pointer is outside the view.
#[derive(Clone, Debug, Default)]
pub struct MouseTracker {
    current: Option<Vec2>,
    last_sample: Vec2,
}

impl MouseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn position(&self) -> Option<Vec2> {
        self.current
    }

    pub fn set_position(&mut self, pos: Option<Vec2>) {
        // Entering the view: prime the last sample so the first frame has no speed spike
        if self.current.is_none() {
            if let Some(p) = pos {
                self.last_sample = p;
            }
        }
        self.current = pos;
    }

    /// Build this frame's mouse ray, if the cursor should affect particles.
    pub fn sample(
        &mut self,
        dt: f32,
        transforms: &FrameTransforms,
        effect_radius: f32,
    ) -> Option<MouseRay> {
        let pos = self.current?;
        let speed = pos.distance(self.last_sample) / dt;
        self.last_sample = pos;
        if effect_radius <= 0.0 || !speed.is_finite() || speed == 0.0 {
            return None;
        }

        let inv = transforms.inv_model * transforms.inv_view * transforms.inv_proj;
        let world = inv * pos.extend(MOUSE_UNPROJECT_DEPTH).extend(1.0);
        if world.w == 0.0 {
            return None;
        }
        let origin = transforms.camera_in_model_space();
        let direction = (world.truncate() / world.w - origin).normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }
        Some(MouseRay {
            origin,
            direction,
            speed,
        })
    }
}

/// Map window pixel coordinates to NDC (y up). `None` outside the window or for an empty one.
pub fn ndc_from_pixels(x: f64, y: f64, width: u32, height: u32) -> Option<Vec2> {
    if width == 0 || height == 0 {
        return None;
    }
    let (w, h) = (width as f64, height as f64);
    if !(0.0..=w).contains(&x) || !(0.0..=h).contains(&y) {
        return None;
    }
    Some(Vec2::new(
        (x / w * 2.0 - 1.0) as f32,
        (1.0 - y / h * 2.0) as f32,
    ))
}
