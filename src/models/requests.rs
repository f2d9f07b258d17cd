//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Maximum accepted version label length
pub const MAX_VERSION_LENGTH: usize = 128;

/// Request body for registering a cache version (PUT /_offline/version)
///
/// # Fields
/// - `version`: Label naming the new cache store
/// - `essential_resources`: Paths to seed; the configured set when omitted
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterVersionRequest {
    /// The version label
    pub version: String,
    /// Optional essential resource override
    #[serde(default)]
    pub essential_resources: Option<Vec<String>>,
}

impl RegisterVersionRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.version.trim().is_empty() {
            return Some("Version cannot be empty".to_string());
        }
        if self.version.len() > MAX_VERSION_LENGTH {
            return Some(format!(
                "Version exceeds maximum length of {} characters",
                MAX_VERSION_LENGTH
            ));
        }
        None
    }
}
