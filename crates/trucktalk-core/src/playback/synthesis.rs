use crate::{AudioError, CoreResult};

use std::{future::Future, panic::Location, pin::Pin, time::Duration};

use error_location::ErrorLocation;
use serde::Serialize;
use tracing::debug;

/// Remote speech synthesis.
///
/// The canonical contract is one shape: JSON `{"text": ...}` in, raw audio
/// bytes (`audio/mpeg`) out. A non-success status is an error, never a
/// fallback to a second response format.
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` into compressed audio bytes.
    fn synthesize<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = CoreResult<Vec<u8>>> + Send + 'a>>;
}

#[derive(Serialize)]
struct SynthesisBody<'a> {
    text: &'a str,
}

/// [`SpeechSynthesizer`] calling the hosted text-to-speech function.
pub struct HttpSynthesisClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpSynthesisClient {
    /// Build a client for `endpoint` with a fixed per-request timeout.
    #[track_caller]
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> CoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| AudioError::SynthesisRequestFailed {
                reason: format!("Failed to build HTTP client: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

impl SpeechSynthesizer for HttpSynthesisClient {
    fn synthesize<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = CoreResult<Vec<u8>>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .http
                .post(&self.endpoint)
                .json(&SynthesisBody { text })
                .send()
                .await
                .map_err(|e| AudioError::SynthesisRequestFailed {
                    reason: format!("Request failed: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(AudioError::SynthesisRejected {
                    status: status.as_u16(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| AudioError::SynthesisRequestFailed {
                    reason: format!("Failed to read response body: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            debug!(
                byte_len = bytes.len(),
                text_len = text.len(),
                "Synthesis response received"
            );

            Ok(bytes.to_vec())
        })
    }
}
