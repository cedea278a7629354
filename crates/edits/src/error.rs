use curio_core::error::CoreError;

/// Errors surfaced by the edit service.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl EditError {
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(e) => Some(e),
            Self::Db(_) => None,
        }
    }
}
