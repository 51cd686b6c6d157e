use reqwest::Client;
use std::time::Duration;

use crate::error::AppError;

/// Shared client for Gemini calls. Image generation can take well over a minute.
pub fn new_api_client() -> Result<Client, AppError> {
    Client::builder()
        .timeout(Duration::from_secs(180))
        .connect_timeout(Duration::from_secs(20))
        // Below the upstream keep-alive so pooled connections are not reused after the peer closed them
        .pool_idle_timeout(Some(Duration::from_secs(240)))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Client for identity lookups, which should answer quickly.
pub fn new_auth_client() -> Result<Client, AppError> {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))
}
