pub mod activation;
pub mod camera;
pub mod constants;
pub mod error;
pub mod fps;
pub mod mouse;
pub mod params;
pub mod particles;
pub mod regions;
pub mod shared;
pub mod visualiser;

pub use activation::*;
pub use camera::*;
pub use constants::*;
pub use error::*;
pub use fps::*;
pub use mouse::*;
pub use params::*;
pub use particles::*;
pub use regions::*;
pub use shared::*;
pub use visualiser::*;

pub static PARTICLE_WGSL: &str = include_str!("../shaders/particle.wgsl");
