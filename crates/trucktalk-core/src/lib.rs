//! TruckTalk Audio Coordination Library
//!
//! Permission gating, text-to-speech playback dispatch, and a
//! pronunciation-practice recorder over CPAL.
//!
//! # Example
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use trucktalk_core::{
//!     AudioPlatform, AutoConfirmPrompt, CaptureConstraints, CoreResult, CpalPlatform,
//!     HttpSynthesisClient, NoopNotifier, PermissionGate, PlaybackDispatcher, ProbePolicy,
//! };
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let platform: Arc<dyn AudioPlatform> = Arc::new(CpalPlatform::new());
//!     let notifier = Arc::new(NoopNotifier);
//!
//!     let gate = Arc::new(PermissionGate::new(
//!         Arc::clone(&platform),
//!         Arc::new(AutoConfirmPrompt),
//!         notifier.clone(),
//!         ProbePolicy::default(),
//!         CaptureConstraints::default(),
//!     ));
//!
//!     let synth = Arc::new(HttpSynthesisClient::new(
//!         "https://api.trucktalk.app/functions/v1/text-to-speech",
//!         Duration::from_secs(20),
//!     )?);
//!
//!     let dispatcher = PlaybackDispatcher::new(gate, platform, synth, notifier);
//!     dispatcher.play_text("Good morning, dispatch", "line-1").await;
//!     Ok(())
//! }
//! ```

mod error;
mod notify;
mod permission;
mod platform;
mod playback;
mod recorder;

pub use {
    error::{AudioError, Result as CoreResult},
    notify::{Notice, Notifier, NoopNotifier},
    permission::{
        AutoConfirmPrompt, MicPermission, PermissionGate, PermissionKind, PermissionPrompt,
        PermissionState, ProbePolicy, current_gate, install_gate, uninstall_gate,
    },
    platform::{
        AudioPlatform, CaptureConstraints, CaptureStream, CpalPlatform, PlaybackHandle,
        PlaybackSink, probe_output_route,
    },
    playback::{
        HttpSynthesisClient, OutputRoute, PlaybackDispatcher, ROUTE_RESOLVE_TIMEOUT,
        RequestStatus, SpeechSynthesizer, resolve_route,
    },
    recorder::{
        AudioClip, PermissionDeniedFn, RecorderCallbacks, RecorderConfig, RecorderSession,
        RecorderSnapshot, RecorderState, RecordingCompleteFn, level_from_samples,
    },
};

#[cfg(test)]
mod tests;
