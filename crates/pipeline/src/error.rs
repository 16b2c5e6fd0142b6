use idioms_cloud::openai::OpenAiError;
use idioms_cloud::storage::StorageError;
use idioms_core::generation::GenerationParseError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("idiom {0} already exists")]
    Duplicate(String),

    #[error("idiom {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Parse(#[from] GenerationParseError),

    #[error(transparent)]
    Generation(#[from] OpenAiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl PipelineError {
    /// Whether retrying the same input can never succeed.
    ///
    /// Storage, database and retryable generation failures are transient:
    /// the queued input is kept for the next tick. A generation API that
    /// rejects the request outright would reject it on every tick.
    pub fn is_permanent(&self) -> bool {
        match self {
            Self::Duplicate(_) | Self::NotFound(_) | Self::Parse(_) => true,
            Self::Generation(e) => !e.is_retryable(),
            Self::Storage(_) | Self::Database(_) => false,
        }
    }
}
