use crate::types::Id;

/// Domain errors raised by the edit workflow.
///
/// Validation and conflict errors abort the enclosing transaction and
/// surface to the caller verbatim; apply-time prerequisite failures are
/// caught by the edit service and converted into a comment plus FAILED
/// status instead of propagating.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    // --- lifecycle ---
    #[error("edit not found")]
    EditNotFound,

    #[error("edit already applied")]
    EditAlreadyApplied,

    #[error("{kind} not found: {id}")]
    EntityNotFound { kind: &'static str, id: Id },

    // --- conflict ---
    #[error("{kind} is deleted: {id}")]
    EntityDeleted { kind: &'static str, id: Id },

    #[error("edit contains no changes")]
    NoChanges,

    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("target id is required for this operation")]
    TargetIdMissing,

    #[error("merge target id is required")]
    MergeIdMissing,

    #[error("merge target cannot be used as source")]
    MergeTargetIsSource,

    #[error("no merge sources found")]
    NoMergeSources,

    // --- validation ---
    #[error("invalid studio id: {0}")]
    InvalidStudio(Id),

    #[error("invalid tag id: {0}")]
    InvalidTag(Id),

    #[error("invalid performer id: {0}")]
    InvalidPerformer(Id),

    #[error("invalid image id: {0}")]
    InvalidImage(Id),

    #[error("invalid url site id: {0}")]
    InvalidSite(Id),

    #[error("unsupported edit payload version: {0}")]
    UnsupportedPayloadVersion(u32),

    #[error("edit payload does not match the edit's target type")]
    PayloadMismatch,

    #[error("malformed edit payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    // --- authorization ---
    #[error("only the creator can update edits")]
    UnauthorizedUpdate,

    #[error("you do not have permission to submit bot edits")]
    UnauthorizedBot,

    #[error("you do not have permission to vote on edits")]
    UnauthorizedVote,

    #[error("votes can only be cast on pending edits")]
    ClosedEdit,

    #[error("voting on your own edit is not allowed")]
    OwnEditVote,

    #[error("edit update limit reached")]
    UpdateLimit,

    // --- concurrency ---
    #[error("invalid vote status: {0}")]
    InvalidVoteStatus(String),

    /// A stored TEXT enum column holds a value this build does not know.
    #[error("invalid stored value: {0}")]
    InvalidStoredValue(String),

    /// The edit's stored `old` snapshot no longer matches the live entity.
    /// Raised before any mutation occurs.
    #[error("expected {field} to be '{expected}', but was '{actual}'")]
    PrerequisiteFailed {
        field: &'static str,
        expected: String,
        actual: String,
    },
}

impl CoreError {
    /// True for apply-time failures that should be recorded as a comment
    /// and move the edit to FAILED rather than abort the request.
    pub fn is_prerequisite_failure(&self) -> bool {
        matches!(self, CoreError::PrerequisiteFailed { .. })
    }
}
