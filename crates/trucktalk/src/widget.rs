use std::{path::PathBuf, sync::Arc};

use tokio::sync::{mpsc, watch};
use tracing::warn;
use trucktalk_core::{
    AudioPlatform, CaptureConstraints, Notifier, PermissionGate, RecorderCallbacks,
    RecorderConfig, RecorderSession, RecorderSnapshot,
};

/// Inputs of the recorder widget contract.
#[derive(Debug, Clone)]
pub struct WidgetOptions {
    /// Automatic stop bound in seconds.
    pub max_duration_secs: u32,
    /// Reference line shown before recording, if any. Display only.
    pub expected_text: Option<String>,
    /// Constraints for the capture stream.
    pub constraints: CaptureConstraints,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            max_duration_secs: 30,
            expected_text: None,
            constraints: CaptureConstraints::default(),
        }
    }
}

/// Events the widget surfaces to the host loop.
#[derive(Debug)]
pub enum WidgetEvent {
    /// A take finished.
    Completed {
        /// Size of the WAV blob.
        byte_len: usize,
        /// Playable path of the clip.
        path: PathBuf,
    },
    /// The microphone permission check was denied.
    PermissionDenied,
}

/// One on-screen recorder instance wrapping a core session.
///
/// Completion and denial callbacks are forwarded as [`WidgetEvent`]s on
/// the channel supplied at construction.
pub struct RecorderWidget {
    session: RecorderSession,
    expected_text: Option<String>,
}

impl RecorderWidget {
    /// Build a widget over the shared platform and gate.
    pub fn new(
        platform: Arc<dyn AudioPlatform>,
        gate: Arc<PermissionGate>,
        notifier: Arc<dyn Notifier>,
        options: WidgetOptions,
        events: mpsc::Sender<WidgetEvent>,
    ) -> Self {
        let complete_events = events.clone();
        let denied_events = events;

        let callbacks = RecorderCallbacks {
            on_recording_complete: Some(Box::new(move |bytes, path| {
                let event = WidgetEvent::Completed {
                    byte_len: bytes.len(),
                    path: path.to_path_buf(),
                };
                if complete_events.try_send(event).is_err() {
                    warn!("Widget event channel full, completion dropped");
                }
            })),
            on_permission_denied: Some(Box::new(move || {
                if denied_events.try_send(WidgetEvent::PermissionDenied).is_err() {
                    warn!("Widget event channel full, denial dropped");
                }
            })),
        };

        let session = RecorderSession::new(
            platform,
            gate,
            notifier,
            RecorderConfig {
                max_duration_secs: options.max_duration_secs,
                constraints: options.constraints,
            },
            callbacks,
        );

        Self {
            session,
            expected_text: options.expected_text,
        }
    }

    /// The reference line to show before recording, if configured.
    pub fn expected_text(&self) -> Option<&str> {
        self.expected_text.as_deref()
    }

    /// Subscribe to recorder snapshots.
    pub fn subscribe(&self) -> watch::Receiver<RecorderSnapshot> {
        self.session.subscribe()
    }

    /// Current snapshot.
    pub async fn snapshot(&self) -> RecorderSnapshot {
        self.session.snapshot().await
    }

    /// Start a take.
    pub async fn record(&self) {
        self.session.start().await;
    }

    /// Stop the current take early.
    pub async fn stop(&self) {
        self.session.stop().await;
    }

    /// Play back the recorded take.
    pub async fn replay(&self) {
        self.session.play().await;
    }

    /// Stop playback of the recorded take.
    pub async fn pause(&self) {
        self.session.pause().await;
    }

    /// Discard the take and return to idle.
    pub async fn reset(&self) {
        self.session.reset().await;
    }
}
