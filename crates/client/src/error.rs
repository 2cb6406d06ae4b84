//! Client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Missing credentials: {0} must be provided")]
    MissingCredentials(&'static str),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Authentication rejected by {url} (HTTP {status}); check your credentials")]
    AuthRejected { url: String, status: u16 },

    #[error("No access token received from authentication")]
    MissingToken,

    #[error("Not authenticated: authenticate() must succeed before fetching")]
    NotAuthenticated,

    #[error("HTTP {status} from {url}: {message}")]
    Api {
        status: u16,
        url: String,
        message: String,
    },

    #[error("Unexpected response from {url}: {message}")]
    UnexpectedResponse { url: String, message: String },

    #[error("Pagination cursor {0:?} was returned twice")]
    PaginationLoop(String),

    #[error("Blueprint not found: {0}")]
    BlueprintNotFound(String),

    #[error("Entities not found: {}", .0.join(", "))]
    EntitiesNotFound(Vec<String>),

    #[error("No entities matched the selection")]
    NothingExported,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
