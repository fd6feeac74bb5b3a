use space_canon::{EnvelopeError, VerificationFailure};
use space_types::SpaceId;

pub type SpaceResult<T> = Result<T, SpaceError>;

#[derive(Debug, thiserror::Error)]
pub enum SpaceError {
    #[error("tab '{tab}' not found in space {space}")]
    TabNotFound { space: SpaceId, tab: String },
    #[error("tab '{tab}' already exists in space {space}")]
    TabExists { space: SpaceId, tab: String },
    #[error("invalid tab name '{name}': {reason}")]
    InvalidTabName { name: String, reason: &'static str },
    #[error("tab order for space {space} rejected: {reason}")]
    OrderMismatch { space: SpaceId, reason: String },
    #[error("sealing failed: {0}")]
    Seal(#[from] EnvelopeError),
    #[error("commit to '{path}' failed: {source}")]
    CommitFailure {
        path: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("fetching '{path}' failed: {source}")]
    Fetch {
        path: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("artifact '{path}' is not a valid envelope: {source}")]
    Decode {
        path: String,
        #[source]
        source: EnvelopeError,
    },
    #[error("artifact '{path}' failed verification: {reason}")]
    VerificationFailure {
        path: String,
        reason: VerificationFailure,
    },
    #[error("artifact '{path}' belongs to space {found}, expected {expected}")]
    SpaceMismatch {
        path: String,
        expected: SpaceId,
        found: SpaceId,
    },
}

impl SpaceError {
    /// Sort an error from opening an artifact into verification versus
    /// decoding trouble.
    pub(crate) fn from_open(path: String, err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Verification(reason) => SpaceError::VerificationFailure { path, reason },
            other => SpaceError::Decode {
                path,
                source: other,
            },
        }
    }
}
