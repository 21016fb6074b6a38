use serde::{Deserialize, Serialize};

/// JSON error envelope returned for dispatch failures
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Payload of the built-in health endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub routes: usize,
}
