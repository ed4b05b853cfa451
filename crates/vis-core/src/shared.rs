//! Thread-shared visualiser handle.
//!
//! One coarse mutex covers parameters, particle arrays and matrices: parameter
//! changes, re-initialisation and the full per-frame update each run under a
//! single lock acquisition. The audio level is a separate lock-free cell so the
//! audio callback never waits on a frame.

use crate::particles::Instance;
use crate::params::VisualiserParams;
use crate::visualiser::{RenderUniforms, Visualiser};
use glam::Vec2;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Latest input level, stored as `f32` bits.
#[derive(Clone, Debug, Default)]
pub struct AudioLevel(Arc<AtomicU32>);

impl AudioLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a level; non-finite or negative readings are stored as silence.
    pub fn store(&self, level: f32) {
        let level = if level.is_finite() { level.max(0.0) } else { 0.0 };
        self.0.store(level.to_bits(), Ordering::Relaxed);
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

#[derive(Clone)]
pub struct SharedVisualiser {
    inner: Arc<Mutex<Visualiser>>,
    audio_level: AudioLevel,
}

impl SharedVisualiser {
    pub fn new(visualiser: Visualiser) -> Self {
        Self {
            inner: Arc::new(Mutex::new(visualiser)),
            audio_level: AudioLevel::new(),
        }
    }

    /// Handle for the audio thread to publish meter readings.
    pub fn audio_level(&self) -> AudioLevel {
        self.audio_level.clone()
    }

    /// Run `f` with the lock held.
    pub fn with<R>(&self, f: impl FnOnce(&mut Visualiser) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn params(&self) -> VisualiserParams {
        self.lock().params().clone()
    }

    pub fn set_params(&self, params: VisualiserParams) {
        self.lock().set_params(params);
    }

    /// Edit a copy of the current parameters and apply it, all under one lock.
    pub fn update_params(&self, f: impl FnOnce(&mut VisualiserParams)) {
        let mut vis = self.lock();
        let mut params = vis.params().clone();
        f(&mut params);
        vis.set_params(params);
    }

    pub fn set_mouse(&self, position: Option<Vec2>) {
        self.lock().set_mouse(position);
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.lock().resize(width, height);
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Run a full frame and hand the results to `sink` before releasing the lock.
    pub fn frame_with<R>(
        &self,
        dt: f32,
        sink: impl FnOnce(&[Instance], &RenderUniforms) -> R,
    ) -> R {
        let level = self.audio_level.load();
        let mut vis = self.lock();
        vis.frame(dt, level);
        let uniforms = vis.render_uniforms();
        sink(vis.instances(), &uniforms)
    }

    fn lock(&self) -> MutexGuard<'_, Visualiser> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            log::warn!("[visualiser] lock poisoned; continuing with last state");
            poisoned.into_inner()
        })
    }
}
