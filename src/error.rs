use thiserror::Error;

use crate::providers::ProviderError;

/// Failure of one workflow step. Converted to a notification at the
/// controller boundary and never shown verbatim to the user.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("User not authenticated")]
    NotAuthenticated,
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
