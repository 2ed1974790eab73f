use notify_rust::Notification;
use tracing::{debug, warn};
use trucktalk_core::{Notice, Notifier};

/// Desktop toast surface for coordinator notices.
///
/// Failures to display are logged and swallowed; a broken notification
/// daemon must never take the audio path down with it.
pub struct DesktopNotifier {
    enabled: bool,
}

impl DesktopNotifier {
    /// Create a notifier; `enabled = false` suppresses all toasts.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, notice: Notice) {
        if !self.enabled {
            debug!(notice = ?notice, "Toast suppressed by configuration");
            return;
        }

        let (summary, body) = match &notice {
            Notice::PlaybackPermissionDenied => (
                "Audio unavailable",
                "Playback permission was denied.".to_string(),
            ),
            Notice::MicrophonePermissionDenied => (
                "Microphone denied",
                "Allow microphone access to practice pronunciation.".to_string(),
            ),
            Notice::SynthesisFailed { detail } => ("Speech unavailable", detail.clone()),
            Notice::PlaybackFailed { detail } => ("Playback failed", detail.clone()),
            Notice::RecordingError { detail } => ("Recording error", detail.clone()),
        };

        if let Err(e) = Notification::new()
            .appname("TruckTalk")
            .summary(summary)
            .body(&body)
            .show()
        {
            warn!(error = %e, "Failed to show toast");
        }
    }
}
