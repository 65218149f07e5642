// HTTP adapter errors (never cross the port boundary)

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpAdapterError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}
