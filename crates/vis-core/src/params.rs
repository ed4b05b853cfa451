//! The visualiser's parameter bundle.
//!
//! A [`VisualiserParams`] value is an immutable snapshot for the duration of a
//! frame. Hosts edit their own copy (directly, or through the named
//! [`VisualiserParams::set`] surface) and hand it to the visualiser, which
//! diffs it against the previous snapshot to decide what must be rebuilt.

use crate::constants::{decibels_to_gain, DEFAULT_ACTIVATION_THRESHOLD_DB, DEFAULT_REGION_COLOURS, MAX_PARTICLES};
use crate::error::ParamError;
use glam::Vec4;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    Core,
    Equator,
    Meridian,
    North,
    South,
}

impl Region {
    pub const COUNT: usize = 5;
    pub const ALL: [Region; Region::COUNT] = [
        Region::Core,
        Region::Equator,
        Region::Meridian,
        Region::North,
        Region::South,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Region::Core => "core",
            Region::Equator => "equator",
            Region::Meridian => "meridian",
            Region::North => "north",
            Region::South => "south",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Region::ALL.into_iter().find(|r| r.name() == name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
            Channel::Alpha => "alpha",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Channel::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// Colour and radius modifier for one screen region, as reached at full activation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionSettings {
    pub colour: Vec4,
    pub radius_mod: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualiserParams {
    // camera and view
    pub camera_y: f32,
    pub camera_z: f32,
    pub camera_fov: f32, // degrees
    pub rotation_speed: f32, // degrees per second

    // population and appearance
    pub num_particles: usize,
    pub particle_size: f32,
    pub particle_size_randomness: f32,
    pub particle_smoothness: f32,
    pub background_fade: f32,

    // activation envelope
    pub activation_threshold: f32, // linear gain
    pub activation_attack: f32, // ms
    pub activation_release: f32, // ms

    // physics
    pub base_radius: f32,
    pub movement_style: f32, // 0 = springy, 1 = snappy
    pub snappy_speed: f32, // ms
    pub force_scale: f32,
    pub damping_factor: f32,
    pub jitter_amount: f32,
    pub escape_speed_multiplier: f32,
    pub escape_duration: f32, // s

    // mouse interaction
    pub mouse_effect_radius: f32,
    pub mouse_repulsion: f32, // positive repels, negative attracts
    pub mouse_effect_duration: f32, // s

    // screen-space regions
    pub horizontal_band_size: f32,
    pub vertical_band_size: f32,
    pub band_smoothness: f32,
    pub regions: [RegionSettings; Region::COUNT],
}

impl Default for VisualiserParams {
    fn default() -> Self {
        Self {
            camera_y: 2.0,
            camera_z: 5.0,
            camera_fov: 90.0,
            rotation_speed: -10.0,
            num_particles: 2500,
            particle_size: 0.05,
            particle_size_randomness: 0.25,
            particle_smoothness: 0.1,
            background_fade: 0.5,
            activation_threshold: decibels_to_gain(DEFAULT_ACTIVATION_THRESHOLD_DB),
            activation_attack: 250.0,
            activation_release: 250.0,
            base_radius: 3.0,
            movement_style: 0.0,
            snappy_speed: 100.0,
            force_scale: 1.0,
            damping_factor: 0.5,
            jitter_amount: 1.0,
            escape_speed_multiplier: 0.1,
            escape_duration: 1.0,
            mouse_effect_radius: 1.0,
            mouse_repulsion: 10.0,
            mouse_effect_duration: 1.0,
            horizontal_band_size: 0.2,
            vertical_band_size: 0.2,
            band_smoothness: 0.2,
            regions: DEFAULT_REGION_COLOURS.map(|c| RegionSettings {
                colour: Vec4::from_array(c),
                radius_mod: 0.0,
            }),
        }
    }
}

// Declares every plain f32 parameter once: variant, field, string id and range.
macro_rules! scalar_params {
    ($($variant:ident => $field:ident, $id:literal, $min:expr, $max:expr;)*) => {
        /// Identifies a single settable parameter.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum ParamId {
            $($variant,)*
            NumParticles,
            RegionColour(Region, Channel),
            RegionRadiusMod(Region),
        }

        impl ParamId {
            const SCALARS: &'static [ParamId] = &[$(ParamId::$variant,)*];

            fn scalar_name(self) -> Option<&'static str> {
                match self {
                    $(ParamId::$variant => Some($id),)*
                    _ => None,
                }
            }

            fn scalar_from_name(name: &str) -> Option<Self> {
                match name {
                    $($id => Some(ParamId::$variant),)*
                    _ => None,
                }
            }

            /// Inclusive `(min, max)` range the parameter is clamped into.
            pub fn range(self) -> (f32, f32) {
                match self {
                    $(ParamId::$variant => ($min, $max),)*
                    ParamId::NumParticles => (0.0, MAX_PARTICLES as f32),
                    ParamId::RegionColour(..) => (0.0, 1.0),
                    ParamId::RegionRadiusMod(_) => (0.0, 0.5),
                }
            }
        }

        impl VisualiserParams {
            fn scalar(&self, id: ParamId) -> Option<f32> {
                match id {
                    $(ParamId::$variant => Some(self.$field),)*
                    _ => None,
                }
            }

            fn scalar_mut(&mut self, id: ParamId) -> Option<&mut f32> {
                match id {
                    $(ParamId::$variant => Some(&mut self.$field),)*
                    _ => None,
                }
            }
        }
    };
}

scalar_params! {
    CameraY => camera_y, "camera_y", -10.0, 10.0;
    CameraZ => camera_z, "camera_z", 0.1, 20.0;
    CameraFov => camera_fov, "camera_fov", 10.0, 170.0;
    RotationSpeed => rotation_speed, "rotation_speed", -180.0, 180.0;
    ParticleSize => particle_size, "particle_size", 0.0, 0.25;
    ParticleSizeRandomness => particle_size_randomness, "particle_size_randomness", 0.0, 1.0;
    ParticleSmoothness => particle_smoothness, "particle_smoothness", 0.0001, 1.0;
    BackgroundFade => background_fade, "background_fade", 0.0, 1.0;
    ActivationThreshold => activation_threshold, "activation_threshold", 0.0, 1.0;
    ActivationAttack => activation_attack, "activation_attack", 0.0, 2000.0;
    ActivationRelease => activation_release, "activation_release", 0.0, 2000.0;
    BaseRadius => base_radius, "base_radius", 0.1, 5.0;
    MovementStyle => movement_style, "movement_style", 0.0, 1.0;
    SnappySpeed => snappy_speed, "snappy_speed", 0.0, 1000.0;
    ForceScale => force_scale, "force_scale", 0.0, 50.0;
    DampingFactor => damping_factor, "damping_factor", 0.0, 1.0;
    JitterAmount => jitter_amount, "jitter_amount", 0.0, 50.0;
    EscapeSpeedMultiplier => escape_speed_multiplier, "escape_speed_multiplier", 0.0, 1.0;
    EscapeDuration => escape_duration, "escape_duration", 0.01, 5.0;
    MouseEffectRadius => mouse_effect_radius, "mouse_effect_radius", 0.0, 2.0;
    MouseRepulsion => mouse_repulsion, "mouse_repulsion", -50.0, 50.0;
    MouseEffectDuration => mouse_effect_duration, "mouse_effect_duration", 0.01, 5.0;
    HorizontalBandSize => horizontal_band_size, "horizontal_band_size", 0.0001, 1.0;
    VerticalBandSize => vertical_band_size, "vertical_band_size", 0.0001, 1.0;
    BandSmoothness => band_smoothness, "band_smoothness", 0.0001, 2.0;
}

impl ParamId {
    /// Every parameter, scalars first, then per-region colour channels and radius modifiers.
    pub fn all() -> Vec<ParamId> {
        let mut ids = ParamId::SCALARS.to_vec();
        ids.push(ParamId::NumParticles);
        for region in Region::ALL {
            for channel in Channel::ALL {
                ids.push(ParamId::RegionColour(region, channel));
            }
            ids.push(ParamId::RegionRadiusMod(region));
        }
        ids
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamId::NumParticles => f.write_str("num_particles"),
            ParamId::RegionColour(r, c) => write!(f, "region.{}.{}", r.name(), c.name()),
            ParamId::RegionRadiusMod(r) => write!(f, "region.{}.radius_mod", r.name()),
            other => f.write_str(other.scalar_name().unwrap_or("?")),
        }
    }
}

impl FromStr for ParamId {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "num_particles" {
            return Ok(ParamId::NumParticles);
        }
        if let Some(id) = ParamId::scalar_from_name(s) {
            return Ok(id);
        }
        let unknown = || ParamError::UnknownParameter(s.to_string());
        let rest = s.strip_prefix("region.").ok_or_else(unknown)?;
        let (region, field) = rest.split_once('.').ok_or_else(unknown)?;
        let region = Region::from_name(region).ok_or_else(unknown)?;
        if field == "radius_mod" {
            return Ok(ParamId::RegionRadiusMod(region));
        }
        Channel::from_name(field)
            .map(|c| ParamId::RegionColour(region, c))
            .ok_or_else(unknown)
    }
}

/// What a new parameter snapshot requires of the visualiser.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParamChanges {
    pub camera: bool,
    pub rebuild_particles: bool,
    pub resize_particles: bool,
}

impl ParamChanges {
    pub fn is_empty(&self) -> bool {
        !(self.camera || self.rebuild_particles || self.resize_particles)
    }
}

impl VisualiserParams {
    #[inline]
    pub fn region(&self, region: Region) -> &RegionSettings {
        &self.regions[region.index()]
    }

    #[inline]
    pub fn region_mut(&mut self, region: Region) -> &mut RegionSettings {
        &mut self.regions[region.index()]
    }

    pub fn get_id(&self, id: ParamId) -> f32 {
        match id {
            ParamId::NumParticles => self.num_particles as f32,
            ParamId::RegionColour(r, c) => self.region(r).colour[c.index()],
            ParamId::RegionRadiusMod(r) => self.region(r).radius_mod,
            scalar => self.scalar(scalar).unwrap_or_default(),
        }
    }

    /// Writes `value` clamped into the parameter's range.
    pub fn set_id(&mut self, id: ParamId, value: f32) -> Result<(), ParamError> {
        if !value.is_finite() {
            return Err(ParamError::NonFinite {
                id: id.to_string(),
                value,
            });
        }
        let (min, max) = id.range();
        let value = value.clamp(min, max);
        match id {
            ParamId::NumParticles => self.num_particles = value.round() as usize,
            ParamId::RegionColour(r, c) => self.region_mut(r).colour[c.index()] = value,
            ParamId::RegionRadiusMod(r) => self.region_mut(r).radius_mod = value,
            scalar => {
                if let Some(slot) = self.scalar_mut(scalar) {
                    *slot = value;
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<f32, ParamError> {
        Ok(self.get_id(id.parse()?))
    }

    pub fn set(&mut self, id: &str, value: f32) -> Result<(), ParamError> {
        self.set_id(id.parse()?, value)
    }

    /// Copy with every value clamped into range; non-finite values fall back to defaults.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let mut out = self.clone();
        for id in ParamId::all() {
            let value = self.get_id(id);
            let value = if value.is_finite() {
                value
            } else {
                defaults.get_id(id)
            };
            // value is finite here, so set_id cannot fail
            let _ = out.set_id(id, value);
        }
        out
    }

    /// Diff against the snapshot currently in use.
    pub fn changes_from(&self, previous: &Self) -> ParamChanges {
        let camera = self.camera_y != previous.camera_y
            || self.camera_z != previous.camera_z
            || self.camera_fov != previous.camera_fov;
        let rebuild_particles = self.particle_size != previous.particle_size
            || self.particle_size_randomness != previous.particle_size_randomness;
        let resize_particles = !rebuild_particles && self.num_particles != previous.num_particles;
        ParamChanges {
            camera,
            rebuild_particles,
            resize_particles,
        }
    }
}
