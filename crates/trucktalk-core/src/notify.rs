//! User-visible failure notices.
//!
//! The gate, dispatcher, and recorder never throw permission or media
//! failures past their boundaries; they convert them into a [`Notice`]
//! delivered through whatever [`Notifier`] the host wires in (desktop
//! toasts in the TruckTalk binary).

use serde::Serialize;

/// A user-visible notice describing a recoverable failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Notice {
    /// Playback permission was denied or could not be acquired.
    PlaybackPermissionDenied,
    /// Microphone permission was denied or no capture device exists.
    MicrophonePermissionDenied,
    /// The remote speech synthesis call failed.
    SynthesisFailed {
        /// Human-readable failure detail.
        detail: String,
    },
    /// Local playback of synthesized or recorded audio failed.
    PlaybackFailed {
        /// Human-readable failure detail.
        detail: String,
    },
    /// The recorder hit a capture or encoding error.
    RecordingError {
        /// Human-readable failure detail.
        detail: String,
    },
}

/// Sink for user-visible notices.
///
/// Implementations must be cheap and non-blocking; they are invoked from
/// async context.
pub trait Notifier: Send + Sync {
    /// Deliver one notice to the user.
    fn notify(&self, notice: Notice);
}

/// A [`Notifier`] that drops every notice. Useful for headless hosts.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notice: Notice) {}
}
