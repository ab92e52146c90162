//! Error type shared by the scene graph runtime.

use thiserror::Error;

/// Scene runtime errors
#[derive(Debug, Error)]
pub enum SceneError {
    /// Null or contradictory parameters: duplicate direct-child attachment,
    /// mismatched instantiation counts on reparent, non-transform node handed
    /// to a transform operation, duplicate item list names.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A by-name lookup missed: resource registry entry, item list, or a
    /// child that is not attached under the given parent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A bounded container is full: the resource registry at capacity.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Malformed serialized data at the loader boundary.
    #[error("Format error: {0}")]
    FormatError(String),
}
