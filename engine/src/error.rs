//! Error type for the terrain tools engine.
//!
//! Geometric degeneracy (collapsed curves, zero-length vectors, the falloff
//! singularity) is never reported here; those cases are resolved locally.

use thiserror::Error;

use crate::layer::node::Plug;

pub type Result<T> = std::result::Result<T, LayerError>;

#[derive(Debug, Error)]
pub enum LayerError {
    /// A required input plug has no value.
    #[error("required input `{plug}` is not connected")]
    MissingInput { plug: Plug },

    /// Compute was requested for a plug this node does not produce.
    #[error("plug `{plug}` is not computed by this node")]
    UnknownPlug { plug: Plug },

    #[error("invalid mesh: {reason}")]
    InvalidMesh { reason: String },

    #[error("invalid curve: {reason}")]
    InvalidCurve { reason: String },

    #[error("invalid config field `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("topology mismatch: expected {expected} vertices, got {actual}")]
    TopologyMismatch { expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LayerError {
    #[must_use]
    pub fn invalid_mesh(reason: impl Into<String>) -> Self {
        Self::InvalidMesh {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// True for the "not handled here" outcome, as opposed to a failed computation.
    ///
    /// A host graph uses this to route the request to another node.
    #[must_use]
    pub fn is_unhandled(&self) -> bool {
        matches!(self, Self::UnknownPlug { .. })
    }
}
