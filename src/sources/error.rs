use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Missing or empty configuration value '{0}'")]
    MissingCredential(&'static str),

    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected response payload from {url}")]
    InvalidResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid data in response from {url}: {message}")]
    SchemaViolation { url: String, message: String },

    #[error("No historical document found for location '{0}'")]
    DocumentNotFound(String),

    #[error("Failed to build historical frame")]
    Frame(#[source] PolarsError),
}
