use thiserror::Error;

/// Longest body excerpt kept on a transport failure.
pub const BODY_EXCERPT_CHARS: usize = 512;

#[derive(Error, Debug)]
pub enum RelayError {
    /// Upstream answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Transport { status: u16, body: String },

    /// Required setting missing; raised before any network attempt.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stream error: {0}")]
    Stream(String),
}

impl RelayError {
    pub fn transport(status: u16, body: &str) -> Self {
        RelayError::Transport {
            status,
            body: excerpt(body, BODY_EXCERPT_CHARS),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RelayError::Transport { status, .. } => Some(*status),
            RelayError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

fn excerpt(body: &str, max_chars: usize) -> String {
    let body = body.trim();
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}
