/// Convenience result type used across the player.
pub type PlayerResult<T> = Result<T, PlayerError>;

/// Reasons a resource could not be turned into a frame model.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The resource did not reference any bytes.
    #[error("resource is empty")]
    EmptySource,

    /// The resource could not be read from its locator.
    #[error("resource unreadable: {0}")]
    Io(String),

    /// The byte stream is not a well-formed sprite document.
    #[error("malformed container: {0}")]
    MalformedContainer(String),

    /// The document declares a format version this decoder does not understand.
    #[error("unsupported version: {0}")]
    UnsupportedVersion(String),

    /// A frame references an asset that is absent from the asset table, or an asset source failed
    /// to load.
    #[error("missing asset: {0}")]
    MissingAsset(String),
}

/// Failures reported by a renderer backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RendererError {
    /// The presentation surface went away or cannot be (re)created.
    #[error("surface lost: {0}")]
    SurfaceLost(String),

    /// The backend refused a single frame submission.
    #[error("submission rejected: {0}")]
    SubmissionRejected(String),

    /// The requested backend is not compiled in or has no usable device.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// `submit_frame` was called before a successful `prepare`, or after `teardown`.
    #[error("renderer not prepared")]
    NotPrepared,
}

/// Top-level error taxonomy used by player APIs.
#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    /// Resource decoding failed.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Renderer binding or preparation failed.
    #[error("renderer error: {0}")]
    Renderer(#[from] RendererError),

    /// Invalid user-provided configuration or values.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlayerError {
    /// Build a [`PlayerError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl DecodeError {
    /// Build a [`DecodeError::MalformedContainer`] value.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedContainer(msg.into())
    }

    /// Build a [`DecodeError::MissingAsset`] value.
    pub fn missing_asset(msg: impl Into<String>) -> Self {
        Self::MissingAsset(msg.into())
    }
}

impl RendererError {
    /// Build a [`RendererError::SubmissionRejected`] value.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::SubmissionRejected(msg.into())
    }

    /// Build a [`RendererError::SurfaceLost`] value.
    pub fn surface_lost(msg: impl Into<String>) -> Self {
        Self::SurfaceLost(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
