use crate::config::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SYNTHESIS_ENDPOINT, default_endpoint,
    default_request_timeout,
};

use serde::{Deserialize, Serialize};

/// Remote speech-synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Endpoint of the hosted text-to-speech function.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SYNTHESIS_ENDPOINT.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}
