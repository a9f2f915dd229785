use thiserror::Error;

use crate::groq_client::ClientError;

/// Failures a single chat turn can end with.
///
/// `EmptyInput` is a warning for the user rather than a fault: nothing was
/// sent and nothing was recorded.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message is empty, describe your symptoms before sending")]
    EmptyInput,

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ChatError {
    pub fn is_warning(&self) -> bool {
        matches!(self, ChatError::EmptyInput)
    }
}
