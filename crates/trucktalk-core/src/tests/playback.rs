use crate::{
    AudioPlatform, CaptureConstraints, Notice, OutputRoute, PermissionGate, PlaybackDispatcher,
    ProbePolicy, resolve_route,
    tests::support::{
        CountingNotifier, FakePlatform, FakeSynthesizer, ScriptedPrompt, SynthOutcome, wav_fixture,
    },
};

use std::sync::{Arc, atomic::Ordering};

fn dispatcher(
    platform: &Arc<FakePlatform>,
    synth: &Arc<FakeSynthesizer>,
    notifier: &Arc<CountingNotifier>,
    confirm: bool,
) -> PlaybackDispatcher {
    let gate = Arc::new(PermissionGate::new(
        Arc::clone(platform) as Arc<dyn AudioPlatform>,
        ScriptedPrompt::answering(confirm),
        Arc::clone(notifier) as Arc<dyn crate::Notifier>,
        ProbePolicy::default(),
        CaptureConstraints::default(),
    ));
    PlaybackDispatcher::new(
        gate,
        Arc::clone(platform) as Arc<dyn AudioPlatform>,
        Arc::clone(synth) as Arc<dyn crate::SpeechSynthesizer>,
        Arc::clone(notifier) as Arc<dyn crate::Notifier>,
    )
}

/// Fixture at the fake sink's rate so no resampling is involved.
fn speech_bytes() -> Vec<u8> {
    wav_fixture(&[0.2f32; 4800], 48_000)
}

/// WHAT: A rejected synthesis call settles into error + exactly one toast
/// WHY: Failures must leave the button re-invokable, not throw
#[tokio::test]
async fn given_rejecting_synthesis_when_playing_then_error_flag_and_one_notice() {
    // Given: A synthesis function answering 500
    let platform = FakePlatform::new();
    let synth = FakeSynthesizer::rejecting(500);
    let notifier = CountingNotifier::new();
    let dispatcher = dispatcher(&platform, &synth, &notifier, true);

    // When: Playing a line
    dispatcher.play_text("Hello", "id-1").await;

    // Then: Loading cleared, error set, one synthesis notice
    let status = dispatcher.status("id-1").unwrap_or_default();
    assert!(!status.loading);
    assert!(status.error.is_some());
    assert_eq!(
        notifier.count(|n| matches!(n, Notice::SynthesisFailed { .. })),
        1
    );
}

/// WHAT: Permission denial aborts before any network call
/// WHY: No synthesis request may be made without a playback grant
#[tokio::test]
async fn given_denied_permission_when_playing_then_no_synthesis_call() {
    // Given: Playback init fails and the user denies the dialog
    let platform = FakePlatform::new();
    platform.deny_playback();
    let synth = FakeSynthesizer::bytes(speech_bytes());
    let notifier = CountingNotifier::new();
    let dispatcher = dispatcher(&platform, &synth, &notifier, false);

    // When: Playing a line
    dispatcher.play_text("Hello", "id-1").await;

    // Then: The synthesis function was never invoked, loading cleared
    assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
    let status = dispatcher.status("id-1").unwrap_or_default();
    assert!(!status.loading);
    assert!(status.error.is_none());
    assert_eq!(
        notifier.count(|n| matches!(n, Notice::PlaybackPermissionDenied)),
        1
    );
}

/// WHAT: Distinct identifiers never interfere with each other's flags
/// WHY: Per-button spinners must track independently
#[tokio::test]
async fn given_two_identifiers_when_one_fails_then_other_unaffected() {
    // Given: First call succeeds, second call's synthesis rejects
    let platform = FakePlatform::new();
    let synth = FakeSynthesizer::bytes(speech_bytes());
    let notifier = CountingNotifier::new();
    let dispatcher = dispatcher(&platform, &synth, &notifier, true);

    dispatcher.play_text("First line", "id-1").await;
    synth.set_outcome(SynthOutcome::Reject(503));

    // When: Playing the second line
    dispatcher.play_text("Second line", "id-2").await;

    // Then: id-1 is clean, id-2 carries the error
    let first = dispatcher.status("id-1").unwrap_or_default();
    assert!(!first.loading);
    assert!(first.error.is_none());
    let second = dispatcher.status("id-2").unwrap_or_default();
    assert!(!second.loading);
    assert!(second.error.is_some());
}

/// WHAT: A repeated identifier observes the second call's outcome
/// WHY: Duplicate identifiers are last-write-wins, never coalesced
#[tokio::test]
async fn given_duplicate_identifier_when_second_call_succeeds_then_last_write_wins() {
    // Given: A first call that failed under "id-1"
    let platform = FakePlatform::new();
    let synth = FakeSynthesizer::rejecting(500);
    let notifier = CountingNotifier::new();
    let dispatcher = dispatcher(&platform, &synth, &notifier, true);
    dispatcher.play_text("Hello", "id-1").await;
    assert!(
        dispatcher
            .status("id-1")
            .unwrap_or_default()
            .error
            .is_some()
    );

    // When: Re-running the same identifier after synthesis recovers
    synth.set_outcome(SynthOutcome::Bytes(speech_bytes()));
    dispatcher.play_text("Hello", "id-1").await;

    // Then: The second call's clean outcome is the one observed
    let status = dispatcher.status("id-1").unwrap_or_default();
    assert!(!status.loading);
    assert!(status.error.is_none());
}

/// WHAT: clear_settled drops finished entries only
/// WHY: The tracking map otherwise grows without bound
#[tokio::test]
async fn given_settled_entries_when_clearing_then_status_gone() {
    // Given: One settled request
    let platform = FakePlatform::new();
    let synth = FakeSynthesizer::bytes(speech_bytes());
    let notifier = CountingNotifier::new();
    let dispatcher = dispatcher(&platform, &synth, &notifier, true);
    dispatcher.play_text("Hello", "id-1").await;
    assert!(dispatcher.status("id-1").is_some());

    // When: Clearing settled entries
    dispatcher.clear_settled();

    // Then: The entry is gone
    assert!(dispatcher.status("id-1").is_none());
}

/// WHAT: A hung route loader falls back to no route within the bound
/// WHY: Optional capabilities must never stall startup
#[tokio::test(start_paused = true)]
async fn given_hung_loader_when_resolving_route_then_none_after_timeout() {
    // Given/When: A loader that never completes
    let route = resolve_route(std::future::pending::<Option<OutputRoute>>()).await;

    // Then: The capability resolves to absent
    assert!(route.is_none());
}
