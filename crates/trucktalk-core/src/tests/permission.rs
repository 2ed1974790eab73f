use crate::{
    AudioPlatform, CaptureConstraints, MicPermission, Notice, PermissionGate, ProbePolicy,
    current_gate, install_gate, uninstall_gate,
    tests::support::{CountingNotifier, FakePlatform, ScriptedPrompt},
};

use std::sync::{Arc, atomic::Ordering};

fn gate(
    platform: &Arc<FakePlatform>,
    prompt: &Arc<ScriptedPrompt>,
    notifier: &Arc<CountingNotifier>,
    allow_silent_probe: bool,
) -> Arc<PermissionGate> {
    Arc::new(PermissionGate::new(
        Arc::clone(platform) as Arc<dyn AudioPlatform>,
        Arc::clone(prompt) as Arc<dyn crate::PermissionPrompt>,
        Arc::clone(notifier) as Arc<dyn crate::Notifier>,
        ProbePolicy { allow_silent_probe },
        CaptureConstraints::default(),
    ))
}

/// WHAT: A cached playback grant short-circuits the second ensure call
/// WHY: Platform initialization must happen at most once per session
#[tokio::test]
async fn given_granted_playback_when_ensuring_again_then_platform_probed_once() {
    // Given: A gate that granted playback once via silent probe
    let platform = FakePlatform::new();
    let prompt = ScriptedPrompt::answering(true);
    let notifier = CountingNotifier::new();
    let gate = gate(&platform, &prompt, &notifier, true);

    assert!(gate.ensure_playback_permission().await);
    assert_eq!(platform.playback_opens.load(Ordering::SeqCst), 1);

    // When: Ensuring again without an intervening denial
    assert!(gate.ensure_playback_permission().await);

    // Then: No new platform calls, no prompt, flags set together
    assert_eq!(platform.playback_opens.load(Ordering::SeqCst), 1);
    assert_eq!(prompt.asked.load(Ordering::SeqCst), 0);
    let state = gate.state();
    assert!(state.has_playback_permission);
    assert!(state.is_initialized);
}

/// WHAT: Restricted context routes the first grant through the dialog
/// WHY: Silent probing is forbidden when an embedding restriction applies
#[tokio::test]
async fn given_restricted_context_when_user_confirms_then_playback_granted() {
    // Given: Silent probes disabled, user will confirm
    let platform = FakePlatform::new();
    let prompt = ScriptedPrompt::answering(true);
    let notifier = CountingNotifier::new();
    let gate = gate(&platform, &prompt, &notifier, false);

    // When: Ensuring playback
    let granted = gate.ensure_playback_permission().await;

    // Then: Exactly one confirmation, then one platform init
    assert!(granted);
    assert_eq!(prompt.asked.load(Ordering::SeqCst), 1);
    assert_eq!(platform.playback_opens.load(Ordering::SeqCst), 1);
}

/// WHAT: User denial resolves to false with a single notice
/// WHY: Denial is a boolean plus a toast, never an exception
#[tokio::test]
async fn given_user_denies_dialog_when_ensuring_playback_then_false_with_one_notice() {
    // Given: Silent probes disabled, user will deny
    let platform = FakePlatform::new();
    let prompt = ScriptedPrompt::answering(false);
    let notifier = CountingNotifier::new();
    let gate = gate(&platform, &prompt, &notifier, false);

    // When: Ensuring playback
    let granted = gate.ensure_playback_permission().await;

    // Then: False, no platform call, one denial notice, flags untouched
    assert!(!granted);
    assert_eq!(platform.playback_opens.load(Ordering::SeqCst), 0);
    assert_eq!(
        notifier.count(|n| matches!(n, Notice::PlaybackPermissionDenied)),
        1
    );
    let state = gate.state();
    assert!(!state.has_playback_permission);
    assert!(!state.is_initialized);
}

/// WHAT: Confirmation cannot rescue a platform that keeps failing
/// WHY: A grant requires a live, unsuspended platform handle
#[tokio::test]
async fn given_failing_platform_when_user_confirms_then_still_denied() {
    // Given: Probe and post-confirmation init both fail
    let platform = FakePlatform::new();
    platform.deny_playback();
    let prompt = ScriptedPrompt::answering(true);
    let notifier = CountingNotifier::new();
    let gate = gate(&platform, &prompt, &notifier, true);

    // When: Ensuring playback
    let granted = gate.ensure_playback_permission().await;

    // Then: Silent probe + retry both attempted, grant still false
    assert!(!granted);
    assert_eq!(platform.playback_opens.load(Ordering::SeqCst), 2);
    assert_eq!(prompt.asked.load(Ordering::SeqCst), 1);
    assert!(!gate.state().has_playback_permission);
}

/// WHAT: Missing capture device records a denial
/// WHY: Absence of capture APIs is a denial, not a crash
#[tokio::test]
async fn given_no_capture_device_when_ensuring_microphone_then_denied_recorded() {
    // Given: A platform with no microphone
    let platform = FakePlatform::new();
    platform.deny_capture();
    let prompt = ScriptedPrompt::answering(true);
    let notifier = CountingNotifier::new();
    let gate = gate(&platform, &prompt, &notifier, true);

    // When: Ensuring microphone permission
    let granted = gate.ensure_microphone_permission().await;

    // Then: False, Denied recorded, one notice
    assert!(!granted);
    assert_eq!(gate.state().microphone, MicPermission::Denied);
    assert!(!gate.state().has_microphone_permission());
    assert_eq!(
        notifier.count(|n| matches!(n, Notice::MicrophonePermissionDenied)),
        1
    );
}

/// WHAT: A held capture probe makes the second ensure a no-op
/// WHY: Idempotency; no re-prompting while a live stream is held
#[tokio::test]
async fn given_live_capture_probe_when_ensuring_microphone_again_then_no_new_request() {
    // Given: Microphone granted once
    let platform = FakePlatform::new();
    let prompt = ScriptedPrompt::answering(true);
    let notifier = CountingNotifier::new();
    let gate = gate(&platform, &prompt, &notifier, true);
    assert!(gate.ensure_microphone_permission().await);

    // When: Ensuring again
    assert!(gate.ensure_microphone_permission().await);

    // Then: Only one capture stream was ever requested
    assert_eq!(platform.capture_opens.load(Ordering::SeqCst), 1);
    assert_eq!(gate.state().microphone, MicPermission::Granted);
}

/// WHAT: Teardown stops held probe streams and resets cached grants
/// WHY: The gate's handles must not outlive the owning UI scope
#[tokio::test]
async fn given_granted_gate_when_torn_down_then_probe_stream_stopped_and_state_reset() {
    // Given: Playback and microphone both granted
    let platform = FakePlatform::new();
    let prompt = ScriptedPrompt::answering(true);
    let notifier = CountingNotifier::new();
    let gate = gate(&platform, &prompt, &notifier, true);
    assert!(gate.ensure_playback_permission().await);
    assert!(gate.ensure_microphone_permission().await);

    // When: Tearing the gate down
    gate.teardown().await;

    // Then: The capture probe is stopped and all flags are reset
    let flags = platform.capture_stopped_flags();
    assert_eq!(flags.len(), 1);
    assert!(flags[0].load(Ordering::SeqCst));
    let state = gate.state();
    assert!(!state.has_playback_permission);
    assert!(!state.is_initialized);
    assert_eq!(state.microphone, MicPermission::Unknown);
}

/// WHAT: Install/current/uninstall round-trips the process-wide gate
/// WHY: Non-component code reaches the gate through the published slot
#[tokio::test]
async fn given_installed_gate_when_uninstalled_then_slot_empty_and_torn_down() {
    // Given: A gate published process-wide
    let platform = FakePlatform::new();
    let prompt = ScriptedPrompt::answering(true);
    let notifier = CountingNotifier::new();
    let gate = gate(&platform, &prompt, &notifier, true);
    assert!(gate.ensure_microphone_permission().await);
    install_gate(Arc::clone(&gate));
    assert!(current_gate().is_some());

    // When: Uninstalling
    uninstall_gate().await;

    // Then: Slot is empty and the gate was torn down
    assert!(current_gate().is_none());
    assert_eq!(gate.state().microphone, MicPermission::Unknown);
}
