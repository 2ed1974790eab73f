use crate::{
    AudioError, CoreResult, Notice, Notifier, PermissionGate,
    platform::{AudioPlatform, PlaybackHandle},
    playback::{Resampler, decode_audio_bytes, synthesis::SpeechSynthesizer},
};

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
};

use serde::Serialize;
use tracing::{debug, instrument, warn};

/// Tracked state of one logical playback operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestStatus {
    /// A call with this identifier is in flight.
    pub loading: bool,
    /// Failure detail of the most recent settled call, if any.
    pub error: Option<String>,
}

/// Serializes text-to-speech requests by identifier.
///
/// Requests with distinct identifiers never interfere with each other's
/// tracked state. Two calls sharing an identifier are the same logical
/// operation: the second call overwrites the first's tracked state and
/// neither is cancelled, so overlapping audio is possible (last write
/// wins). Settled entries are retained until [`clear_settled`] is called.
///
/// [`clear_settled`]: PlaybackDispatcher::clear_settled
pub struct PlaybackDispatcher {
    gate: Arc<PermissionGate>,
    platform: Arc<dyn AudioPlatform>,
    synth: Arc<dyn SpeechSynthesizer>,
    notifier: Arc<dyn Notifier>,
    requests: StdMutex<HashMap<String, RequestStatus>>,
}

impl PlaybackDispatcher {
    /// Create a dispatcher over the shared gate and platform.
    pub fn new(
        gate: Arc<PermissionGate>,
        platform: Arc<dyn AudioPlatform>,
        synth: Arc<dyn SpeechSynthesizer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            gate,
            platform,
            synth,
            notifier,
            requests: StdMutex::new(HashMap::new()),
        }
    }

    /// Speak `text` once, tracking the operation under `identifier`.
    ///
    /// Failures never propagate: permission denial aborts before any
    /// network call, and synthesis/playback errors settle into the
    /// identifier's error flag plus one user-visible notice. The entry is
    /// always left re-invokable; retry is a new call, never automatic.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn play_text(&self, text: &str, identifier: &str) {
        self.begin(identifier);

        if !self.gate.ensure_playback_permission().await {
            // The gate already surfaced the denial; no network call is made.
            self.settle(identifier, None);
            return;
        }

        match self.try_play(text).await {
            Ok(handle) => {
                self.settle(identifier, None);
                // Keep the platform stream alive until its samples drain.
                tokio::spawn(async move {
                    let mut handle = handle;
                    handle.wait().await;
                });
            }
            Err(e) => {
                warn!(identifier, error = %e, "Playback request failed");
                let detail = e.to_string();
                let notice = match &e {
                    AudioError::SynthesisRequestFailed { .. }
                    | AudioError::SynthesisRejected { .. } => Notice::SynthesisFailed {
                        detail: detail.clone(),
                    },
                    _ => Notice::PlaybackFailed {
                        detail: detail.clone(),
                    },
                };
                self.notifier.notify(notice);
                self.settle(identifier, Some(detail));
            }
        }
    }

    /// Tracked state for `identifier`, if any call ever used it.
    pub fn status(&self, identifier: &str) -> Option<RequestStatus> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(identifier)
            .cloned()
    }

    /// Drop entries whose operation has settled, bounding map growth.
    /// Never called automatically.
    pub fn clear_settled(&self) {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|_, status| status.loading);
    }

    async fn try_play(&self, text: &str) -> CoreResult<PlaybackHandle> {
        let bytes = self.synth.synthesize(text).await?;
        let decoded = decode_audio_bytes(bytes, Some("mp3"))?;

        let mut sink = self.platform.open_playback()?;

        let samples = if decoded.sample_rate == sink.sample_rate() {
            decoded.samples
        } else {
            Resampler::new(decoded.sample_rate, sink.sample_rate())?.resample(&decoded.samples)?
        };

        debug!(sample_count = samples.len(), "Starting synthesis playback");

        sink.play(samples)
    }

    fn begin(&self, identifier: &str) {
        // Last write wins: a fresh call overwrites any previous entry for
        // the identifier, including a stale error.
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                identifier.to_string(),
                RequestStatus {
                    loading: true,
                    error: None,
                },
            );
    }

    fn settle(&self, identifier: &str, error: Option<String>) {
        let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(status) = requests.get_mut(identifier) {
            status.loading = false;
            status.error = error;
        }
    }
}
