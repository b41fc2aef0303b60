use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// No verified identity on the call.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Authenticated but not entitled: wrong sender for a delete,
    /// non-participant for a conversation-scoped operation.
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for ChatError {
    fn from(e: anyhow::Error) -> Self {
        tracing::debug!("store error: {e:#}");
        ChatError::Internal("store error".into())
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
