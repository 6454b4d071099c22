//! Error types shared by the data model

use uuid::Uuid;

/// Geometry lookup errors
///
/// Raised by [`crate::mesh::GeometryProvider`] when an anchor can no longer
/// be resolved. Drawing code turns these into prune requests rather than
/// surfacing them to the host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("vertex index {index} out of range ({len} vertices)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("spline index {index} out of range ({len} splines)")]
    SplineOutOfRange { index: usize, len: usize },
    #[error("object not found: {0}")]
    MissingObject(Uuid),
    #[error("object has no mesh or curve data")]
    NoMeshData,
}

/// Configuration file errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
}
