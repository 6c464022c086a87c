use crate::endpoint::Endpoint;
use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Environment variable not found: {0}")]
    EnvVar(#[from] env::VarError),

    #[error("API returned status {status} for endpoint {endpoint}")]
    Status { endpoint: Endpoint, status: i64 },

    #[error("Failed to deserialize response: {0}")]
    Deserialize(String),
}
