use mc_core::McError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {url} returned {status}: {body}")]
    Api {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("login rejected: {0}")]
    Login(String),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("unexpected response: {0}")]
    Response(String),

    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<PlatformError> for McError {
    fn from(e: PlatformError) -> Self {
        let msg = e.to_string();
        match e {
            PlatformError::Login(reason) => McError::LoginFailed(reason),
            PlatformError::NotLoggedIn | PlatformError::Api { status: 401, .. } => {
                McError::LoginFailed(msg)
            }
            PlatformError::Http(_)
            | PlatformError::Api { .. }
            | PlatformError::Response(_)
            | PlatformError::Parse(_) => McError::Network(msg),
        }
    }
}
