//! Error types for the named parameter surface.
//!
//! The simulation itself never fails: out-of-range values are clamped and
//! degenerate numeric states are guarded locally. Only looking parameters up
//! by name can be rejected.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    /// The identifier does not name any visualiser parameter.
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
    /// NaN or infinite values are refused rather than clamped.
    #[error("non-finite value {value} for parameter `{id}`")]
    NonFinite { id: String, value: f32 },
}
