use thiserror::Error;

/// Why a submission was refused; the conversation is left untouched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    #[error("an exchange is already in flight for this conversation")]
    Busy,

    #[error("nothing to send: no text and no attachments")]
    EmptyInput,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
