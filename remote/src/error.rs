use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("invalid service URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    Request(#[from] reqwest::Error),

    /// Any non-success HTTP status. The body is not inspected.
    #[error("Failed to get response from server")]
    Status { status: u16 },

    #[error("login failed: {message}")]
    Login { message: String },
}

pub type Result<T> = std::result::Result<T, RemoteError>;
