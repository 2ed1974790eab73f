use crate::{
    Notice, Notifier,
    permission::{MicPermission, PermissionKind, PermissionPrompt, PermissionState},
    platform::{AudioPlatform, CaptureConstraints, CaptureStream, PlaybackSink},
};

use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// How the gate may acquire playback permission.
#[derive(Debug, Clone, Copy)]
pub struct ProbePolicy {
    /// When `true`, the gate first tries to initialize playback without
    /// asking; the confirmation dialog only appears if the probe fails.
    /// When `false` (restricted context), every first grant goes through
    /// the dialog.
    pub allow_silent_probe: bool,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            allow_silent_probe: true,
        }
    }
}

/// Platform handles the gate keeps alive while a grant is cached.
#[derive(Default)]
struct ProbeHandles {
    playback: Option<Box<dyn PlaybackSink>>,
    capture: Option<Box<dyn CaptureStream>>,
}

/// Process-wide gatekeeper for playback and microphone permission.
///
/// Denial is never an error: both `ensure` operations return `false` and
/// surface a [`Notice`]; the caller re-invokes after a new user gesture.
/// The cached grant is the only cross-session shared state; it is written
/// only here and read by every dispatcher/recorder.
pub struct PermissionGate {
    platform: Arc<dyn AudioPlatform>,
    prompt: Arc<dyn PermissionPrompt>,
    notifier: Arc<dyn Notifier>,
    policy: ProbePolicy,
    constraints: CaptureConstraints,
    state: StdMutex<PermissionState>,
    /// Also serializes concurrent `ensure` calls so the platform is probed
    /// at most once per grant.
    probes: Mutex<ProbeHandles>,
}

impl PermissionGate {
    /// Create a gate over `platform`, confirming restricted grants through
    /// `prompt` and reporting denials through `notifier`.
    pub fn new(
        platform: Arc<dyn AudioPlatform>,
        prompt: Arc<dyn PermissionPrompt>,
        notifier: Arc<dyn Notifier>,
        policy: ProbePolicy,
        constraints: CaptureConstraints,
    ) -> Self {
        Self {
            platform,
            prompt,
            notifier,
            policy,
            constraints,
            state: StdMutex::new(PermissionState::default()),
            probes: Mutex::new(ProbeHandles::default()),
        }
    }

    /// Current cached permission flags.
    pub fn state(&self) -> PermissionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Ensure audio playback is permitted and initialized.
    ///
    /// Cached grants return `true` immediately with no platform calls.
    /// Otherwise the gate probes the platform (silently when policy
    /// allows, after a blocking confirmation otherwise) and caches the
    /// result. Returns `false` on any denial or platform error.
    #[instrument(skip(self))]
    pub async fn ensure_playback_permission(&self) -> bool {
        if self.state().has_playback_permission {
            return true;
        }

        let mut probes = self.probes.lock().await;

        // A concurrent caller may have finished the grant while we waited.
        if self.state().has_playback_permission {
            return true;
        }

        let mut sink = if self.policy.allow_silent_probe {
            match self.platform.open_playback() {
                Ok(sink) => Some(sink),
                Err(e) => {
                    debug!(error = %e, "Silent playback probe failed, falling back to prompt");
                    None
                }
            }
        } else {
            None
        };

        if sink.is_none() {
            if !self.confirm(PermissionKind::Playback).await {
                info!("Playback permission denied by user");
                self.notifier.notify(Notice::PlaybackPermissionDenied);
                return false;
            }

            sink = match self.platform.open_playback() {
                Ok(sink) => Some(sink),
                Err(e) => {
                    warn!(error = %e, "Playback initialization failed after confirmation");
                    self.notifier.notify(Notice::PlaybackPermissionDenied);
                    return false;
                }
            };
        }

        let Some(sink) = sink else {
            return false;
        };

        if sink.is_suspended() {
            warn!("Playback context created but suspended");
            self.notifier.notify(Notice::PlaybackPermissionDenied);
            return false;
        }

        probes.playback = Some(sink);

        {
            // Set together: a granted playback permission implies
            // initialization happened.
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.has_playback_permission = true;
            state.is_initialized = true;
        }

        info!("Playback permission granted");
        true
    }

    /// Ensure microphone capture is permitted.
    ///
    /// Idempotent: while the gate holds a live capture probe this returns
    /// `true` without touching the platform. Failure records `Denied` and
    /// surfaces a notice; no automatic retry.
    #[instrument(skip(self))]
    pub async fn ensure_microphone_permission(&self) -> bool {
        let mut probes = self.probes.lock().await;

        if probes.capture.is_some() {
            return true;
        }

        match self.platform.open_capture(&self.constraints) {
            Ok(stream) => {
                probes.capture = Some(stream);
                let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                state.microphone = MicPermission::Granted;
                info!("Microphone permission granted");
                true
            }
            Err(e) => {
                warn!(error = %e, "Microphone capture request rejected");
                {
                    let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                    state.microphone = MicPermission::Denied;
                }
                self.notifier.notify(Notice::MicrophonePermissionDenied);
                false
            }
        }
    }

    /// Release held platform handles and forget cached grants.
    ///
    /// Called when the owning UI scope unmounts; subsequent `ensure` calls
    /// re-probe from scratch.
    #[instrument(skip(self))]
    pub async fn teardown(&self) {
        let mut probes = self.probes.lock().await;

        if let Some(mut capture) = probes.capture.take() {
            if let Err(e) = capture.stop() {
                warn!(error = %e, "Failed to stop capture probe during teardown");
            }
        }
        probes.playback = None;

        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = PermissionState::default();

        info!("Permission gate torn down");
    }

    async fn confirm(&self, kind: PermissionKind) -> bool {
        // Prompts block on a modal dialog; bridge them off the runtime.
        let prompt = Arc::clone(&self.prompt);
        tokio::task::spawn_blocking(move || prompt.confirm(kind))
            .await
            .unwrap_or(false)
    }
}

/// Slot publishing one gate process-wide so non-component code can reach
/// it. Installed once at application root, removed on shutdown.
static CURRENT_GATE: StdMutex<Option<Arc<PermissionGate>>> = StdMutex::new(None);

/// Publish `gate` as the process-wide permission gate.
pub fn install_gate(gate: Arc<PermissionGate>) {
    let mut slot = CURRENT_GATE.lock().unwrap_or_else(|e| e.into_inner());
    if slot.replace(gate).is_some() {
        warn!("Replacing an already-installed permission gate");
    }
}

/// The currently installed gate, if any.
pub fn current_gate() -> Option<Arc<PermissionGate>> {
    CURRENT_GATE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

/// Remove and tear down the installed gate.
pub async fn uninstall_gate() {
    let gate = CURRENT_GATE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .take();
    if let Some(gate) = gate {
        gate.teardown().await;
    }
}
