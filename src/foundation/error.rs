/// Convenience result type used across voxframe.
pub type VoxframeResult<T> = Result<T, VoxframeError>;

/// Top-level error taxonomy used by pipeline stages.
///
/// Degenerate inputs (a zero-length frame axis, a zero-duration request) are not errors: they
/// produce valid empty results.
#[derive(thiserror::Error, Debug)]
pub enum VoxframeError {
    /// Invalid stage configuration: missing required input, frame axis out of range,
    /// incompatible inputs. Raised before any buffer is allocated.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid user-provided values: malformed regions, requests outside the
    /// largest-possible extent, bad execution options.
    #[error("validation error: {0}")]
    Validation(String),

    /// A region computed by the propagation passes does not fit where it must. Indicates a
    /// propagation bug; the run is aborted.
    #[error("internal invariant violated: {0}")]
    Invariant(String),

    /// The run was cancelled between work units.
    #[error("execution cancelled")]
    Cancelled,

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VoxframeError {
    /// Build a [`VoxframeError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`VoxframeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`VoxframeError::Invariant`] value.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Build a [`VoxframeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors that indicate a bug in region propagation.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}

impl From<serde_json::Error> for VoxframeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
