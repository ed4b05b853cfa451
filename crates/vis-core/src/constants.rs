use glam::Vec4;

// Shared simulation/tuning constants used by the core and the native frontend.

// Frame timing
pub const MAX_DELTA_TIME: f32 = 1.0; // seconds; larger steps are clamped

// Activation
pub const ALWAYS_ACTIVE_THRESHOLD_DB: f32 = -99.0; // thresholds at or below this never gate
pub const DEFAULT_ACTIVATION_THRESHOLD_DB: f32 = -48.0;

// Camera
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 50.0;
pub const MOUSE_UNPROJECT_DEPTH: f32 = 0.5; // NDC depth used to build the mouse ray

// Numeric guards
pub const MIN_SNAP_TIME_MS: f32 = 0.001; // snap times below this snap instantly
pub const MIN_SAMPLE_LEN_SQ: f32 = 1e-12; // rejection-sampled points closer to the origin are redrawn
pub const MIN_RADIAL_DISTANCE: f32 = 1e-6; // below this a particle's direction falls back to its slot
pub const MIN_CLIP_W: f32 = 1e-6;

// Population
pub const MAX_PARTICLES: usize = 10_000;
pub const DEFAULT_SEED: u64 = 0x5EED_F1E1_D000_0001;

// Default palette per region: Core, Equator, Meridian, North, South
pub const DEFAULT_REGION_COLOURS: [[f32; 4]; 5] = [
    [0.0, 1.0, 1.0, 1.0], // cyan
    [1.0, 1.0, 0.0, 1.0], // yellow
    [0.0, 0.0, 1.0, 1.0], // blue
    [0.0, 0.5, 0.0, 1.0], // green
    [1.0, 0.0, 0.0, 1.0], // red
];

// Regions at rest are drawn white
pub const REST_COLOUR: Vec4 = Vec4::ONE;

#[inline]
pub fn decibels_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

#[inline]
pub fn always_active_threshold() -> f32 {
    decibels_to_gain(ALWAYS_ACTIVE_THRESHOLD_DB)
}
