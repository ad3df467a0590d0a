use thiserror::Error;

/// Errors talking to the hosting provider.
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("app credential exchange failed with status {status}")]
    Auth { status: u16 },

    #[error("provider returned {status} during {operation}")]
    Api {
        operation: &'static str,
        status: u16,
    },

    #[error("app private key rejected: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}
