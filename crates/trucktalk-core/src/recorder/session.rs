use crate::{
    CoreResult, Notice, Notifier, PermissionGate,
    permission::MicPermission,
    platform::{AudioPlatform, CaptureConstraints, CaptureStream, PlaybackHandle},
    playback::Resampler,
    recorder::{encoder, meter},
};

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Weak},
    time::Duration,
};

use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

/// Interval between elapsed-seconds ticks.
///
/// The timer itself enforces max duration by finalizing once the elapsed
/// count reaches the bound, so the last partial second is always included,
/// never truncated mid-chunk.
const TIMER_INTERVAL: Duration = Duration::from_secs(1);

/// Interval between level-meter updates (~30 Hz).
const METER_INTERVAL: Duration = Duration::from_millis(33);

/// Recorder states. `Idle` is initial and the reset target; `Error` is
/// recoverable only by calling `start()` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecorderState {
    /// Nothing captured, nothing in flight.
    Idle,
    /// Waiting on the microphone permission check.
    Requesting,
    /// Capture stream live, timer and meter running.
    Recording,
    /// A clip is held and playable.
    Recorded,
    /// The held clip is playing back locally.
    Playing,
    /// Capture, encoding, or playback failed; retry via `start()`.
    Error,
}

/// Point-in-time view of a session, published on every change.
#[derive(Debug, Clone, Serialize)]
pub struct RecorderSnapshot {
    /// Current state.
    pub state: RecorderState,
    /// Whole seconds elapsed in the current/most recent take.
    pub elapsed_seconds: u32,
    /// Cosmetic input level, 0..=100.
    pub audio_level: u8,
    /// Microphone authorization as last observed.
    pub permission_status: MicPermission,
}

/// Per-session recorder configuration.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Automatic stop bound in seconds.
    pub max_duration_secs: u32,
    /// Constraints for the capture stream.
    pub constraints: CaptureConstraints,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: 30,
            constraints: CaptureConstraints::default(),
        }
    }
}

/// Invoked with the finished clip's WAV bytes and playable path.
pub type RecordingCompleteFn = dyn Fn(Arc<Vec<u8>>, &Path) + Send + Sync;

/// Invoked when the microphone permission check is denied.
pub type PermissionDeniedFn = dyn Fn() + Send + Sync;

/// Caller hooks fired on session milestones.
#[derive(Default)]
pub struct RecorderCallbacks {
    /// Completion hook; receives the blob and its playable path.
    pub on_recording_complete: Option<Box<RecordingCompleteFn>>,
    /// Denial hook; fired once per denied `start()`.
    pub on_permission_denied: Option<Box<PermissionDeniedFn>>,
}

struct SessionShared {
    state: RecorderState,
    elapsed_seconds: u32,
    audio_level: u8,
    permission_status: MicPermission,
    capture: Option<Box<dyn CaptureStream>>,
    clip: Option<encoder::AudioClip>,
    task_shutdown: Option<watch::Sender<bool>>,
    playback: Option<PlaybackHandle>,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            state: RecorderState::Idle,
            elapsed_seconds: 0,
            audio_level: 0,
            permission_status: MicPermission::Unknown,
            capture: None,
            clip: None,
            task_shutdown: None,
            playback: None,
        }
    }
}

struct SessionInner {
    platform: Arc<dyn AudioPlatform>,
    gate: Arc<PermissionGate>,
    notifier: Arc<dyn Notifier>,
    config: RecorderConfig,
    callbacks: RecorderCallbacks,
    shared: Mutex<SessionShared>,
    snapshot_tx: watch::Sender<RecorderSnapshot>,
}

/// One recorder instance.
///
/// Transitions are strictly sequential: each is driven by one user action
/// or one timer/platform callback, and the session lock serializes them.
/// Dropping the session force-releases the capture stream, timers, and
/// clip file regardless of state; the background tasks hold only weak
/// references and exit on their next tick.
pub struct RecorderSession {
    inner: Arc<SessionInner>,
}

impl RecorderSession {
    /// Create an idle session.
    pub fn new(
        platform: Arc<dyn AudioPlatform>,
        gate: Arc<PermissionGate>,
        notifier: Arc<dyn Notifier>,
        config: RecorderConfig,
        callbacks: RecorderCallbacks,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(RecorderSnapshot {
            state: RecorderState::Idle,
            elapsed_seconds: 0,
            audio_level: 0,
            permission_status: MicPermission::Unknown,
        });

        Self {
            inner: Arc::new(SessionInner {
                platform,
                gate,
                notifier,
                config,
                callbacks,
                shared: Mutex::new(SessionShared::new()),
                snapshot_tx,
            }),
        }
    }

    /// Subscribe to state snapshots; one is published on every change.
    pub fn subscribe(&self) -> watch::Receiver<RecorderSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Current snapshot.
    pub async fn snapshot(&self) -> RecorderSnapshot {
        let s = self.inner.shared.lock().await;
        SessionInner::snapshot_of(&s)
    }

    /// Current state.
    pub async fn state(&self) -> RecorderState {
        self.inner.shared.lock().await.state
    }

    /// WAV bytes of the held clip, if any.
    pub async fn clip_bytes(&self) -> Option<Arc<Vec<u8>>> {
        let s = self.inner.shared.lock().await;
        s.clip.as_ref().map(|c| Arc::clone(c.bytes()))
    }

    /// Playable path of the held clip, if any.
    pub async fn clip_path(&self) -> Option<PathBuf> {
        let s = self.inner.shared.lock().await;
        s.clip.as_ref().map(|c| c.path().to_path_buf())
    }

    /// Begin a take: permission check, then capture with timer and meter.
    ///
    /// Valid from `Idle` and `Error`; ignored elsewhere. Denial lands in
    /// `Error` with the denial hook fired and no resources allocated.
    pub async fn start(&self) {
        SessionInner::start(&self.inner).await;
    }

    /// Stop the current take early and assemble the clip.
    pub async fn stop(&self) {
        self.inner.finalize_recording().await;
    }

    /// Play the held clip locally. No permission re-check is needed.
    pub async fn play(&self) {
        SessionInner::start_playback(&self.inner).await;
    }

    /// Stop local playback, returning to `Recorded`.
    pub async fn pause(&self) {
        self.inner.pause_playback().await;
    }

    /// Discard the held clip and return to `Idle`.
    ///
    /// Revokes the clip's playable path, zeros the timer and level, and
    /// releases any lingering resources. Valid from `Recorded` and
    /// `Error`.
    pub async fn reset(&self) {
        self.inner.reset().await;
    }
}

impl SessionInner {
    #[instrument(skip(inner))]
    async fn start(inner: &Arc<Self>) {
        {
            let mut s = inner.shared.lock().await;
            match s.state {
                RecorderState::Idle | RecorderState::Error => {}
                other => {
                    debug!(state = ?other, "start() ignored");
                    return;
                }
            }
            s.state = RecorderState::Requesting;
            inner.publish(&s);
        }

        if !inner.gate.ensure_microphone_permission().await {
            {
                let mut s = inner.shared.lock().await;
                s.state = RecorderState::Error;
                s.permission_status = MicPermission::Denied;
                inner.publish(&s);
            }
            if let Some(cb) = &inner.callbacks.on_permission_denied {
                cb();
            }
            info!("Recording aborted: microphone permission denied");
            return;
        }

        let capture = match inner.platform.open_capture(&inner.config.constraints) {
            Ok(capture) => capture,
            Err(e) => {
                warn!(error = %e, "Failed to open capture stream");
                {
                    let mut s = inner.shared.lock().await;
                    s.state = RecorderState::Error;
                    inner.publish(&s);
                }
                inner.notifier.notify(Notice::RecordingError {
                    detail: e.to_string(),
                });
                return;
            }
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        {
            let mut s = inner.shared.lock().await;
            s.permission_status = MicPermission::Granted;
            s.capture = Some(capture);
            // A new take replaces the previous clip.
            s.clip = None;
            s.elapsed_seconds = 0;
            s.audio_level = 0;
            s.state = RecorderState::Recording;
            s.task_shutdown = Some(shutdown_tx);
            inner.publish(&s);
        }

        tokio::spawn(run_timer(Arc::downgrade(inner), shutdown_rx.clone()));
        tokio::spawn(run_meter(Arc::downgrade(inner), shutdown_rx));

        info!("Recording started");
    }

    /// Stop capture and assemble the clip. No-op outside `Recording`.
    /// Timers, meter, and stream are released here regardless of whether
    /// encoding succeeds.
    #[instrument(skip(self))]
    async fn finalize_recording(&self) {
        let (samples, sample_rate) = {
            let mut s = self.shared.lock().await;
            if s.state != RecorderState::Recording {
                debug!(state = ?s.state, "stop() ignored");
                return;
            }

            if let Some(tx) = s.task_shutdown.take() {
                let _ = tx.send(true);
            }

            let Some(mut capture) = s.capture.take() else {
                s.state = RecorderState::Error;
                self.publish(&s);
                warn!("Recording state held no capture stream");
                return;
            };

            let sample_rate = capture.sample_rate();
            match capture.stop() {
                Ok(samples) => (samples, sample_rate),
                Err(e) => {
                    warn!(error = %e, "Failed to stop capture stream");
                    s.state = RecorderState::Error;
                    s.audio_level = 0;
                    self.publish(&s);
                    drop(s);
                    self.notifier.notify(Notice::RecordingError {
                        detail: e.to_string(),
                    });
                    return;
                }
            }
        };

        match encoder::encode_clip(&samples, sample_rate) {
            Ok(clip) => {
                let bytes = Arc::clone(clip.bytes());
                let path = clip.path().to_path_buf();
                {
                    let mut s = self.shared.lock().await;
                    s.clip = Some(clip);
                    s.audio_level = 0;
                    s.state = RecorderState::Recorded;
                    self.publish(&s);
                }
                info!(byte_len = bytes.len(), "Recording complete");
                if let Some(cb) = &self.callbacks.on_recording_complete {
                    cb(bytes, &path);
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to encode clip");
                {
                    let mut s = self.shared.lock().await;
                    s.state = RecorderState::Error;
                    s.audio_level = 0;
                    self.publish(&s);
                }
                self.notifier.notify(Notice::RecordingError {
                    detail: e.to_string(),
                });
            }
        }
    }

    #[instrument(skip(inner))]
    async fn start_playback(inner: &Arc<Self>) {
        let bytes = {
            let s = inner.shared.lock().await;
            if s.state != RecorderState::Recorded {
                debug!(state = ?s.state, "play() ignored");
                return;
            }
            match &s.clip {
                Some(clip) => Arc::clone(clip.bytes()),
                None => return,
            }
        };

        match inner.open_clip_playback(&bytes) {
            Ok(handle) => {
                let mut finished = handle.finished_signal();
                {
                    let mut s = inner.shared.lock().await;
                    if s.state != RecorderState::Recorded {
                        return;
                    }
                    s.playback = Some(handle);
                    s.state = RecorderState::Playing;
                    inner.publish(&s);
                }

                // Watch for natural end of playback; pause() wins the race
                // harmlessly because the state check below no-ops.
                let weak = Arc::downgrade(inner);
                tokio::spawn(async move {
                    loop {
                        if *finished.borrow_and_update() {
                            break;
                        }
                        if finished.changed().await.is_err() {
                            break;
                        }
                    }
                    let Some(inner) = weak.upgrade() else { return };
                    let mut s = inner.shared.lock().await;
                    if s.state == RecorderState::Playing {
                        s.playback = None;
                        s.state = RecorderState::Recorded;
                        inner.publish(&s);
                    }
                });

                debug!("Clip playback started");
            }
            Err(e) => {
                warn!(error = %e, "Failed to play recorded clip");
                {
                    let mut s = inner.shared.lock().await;
                    s.state = RecorderState::Error;
                    inner.publish(&s);
                }
                inner.notifier.notify(Notice::PlaybackFailed {
                    detail: e.to_string(),
                });
            }
        }
    }

    async fn pause_playback(&self) {
        let mut s = self.shared.lock().await;
        if s.state != RecorderState::Playing {
            debug!(state = ?s.state, "pause() ignored");
            return;
        }
        if let Some(mut handle) = s.playback.take() {
            handle.stop();
        }
        s.state = RecorderState::Recorded;
        self.publish(&s);
    }

    #[instrument(skip(self))]
    async fn reset(&self) {
        let mut s = self.shared.lock().await;
        match s.state {
            RecorderState::Recorded | RecorderState::Error => {}
            other => {
                debug!(state = ?other, "reset() ignored");
                return;
            }
        }

        if let Some(tx) = s.task_shutdown.take() {
            let _ = tx.send(true);
        }
        if let Some(mut capture) = s.capture.take() {
            let _ = capture.stop();
        }
        if let Some(mut handle) = s.playback.take() {
            handle.stop();
        }
        // Dropping the clip deletes its temp file: the local reference is
        // revoked and no longer resolvable.
        s.clip = None;
        s.elapsed_seconds = 0;
        s.audio_level = 0;
        s.state = RecorderState::Idle;
        self.publish(&s);

        info!("Recorder reset");
    }

    fn open_clip_playback(&self, wav_bytes: &[u8]) -> CoreResult<PlaybackHandle> {
        let (samples, sample_rate) = encoder::decode_clip(wav_bytes)?;
        let mut sink = self.platform.open_playback()?;
        let samples = if sample_rate == sink.sample_rate() {
            samples
        } else {
            Resampler::new(sample_rate, sink.sample_rate())?.resample(&samples)?
        };
        sink.play(samples)
    }

    fn snapshot_of(s: &SessionShared) -> RecorderSnapshot {
        RecorderSnapshot {
            state: s.state,
            elapsed_seconds: s.elapsed_seconds,
            audio_level: s.audio_level,
            permission_status: s.permission_status,
        }
    }

    fn publish(&self, s: &SessionShared) {
        let _ = self.snapshot_tx.send_replace(Self::snapshot_of(s));
    }
}

/// Elapsed-seconds timer; enforces the max-duration bound itself.
async fn run_timer(session: Weak<SessionInner>, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(TIMER_INTERVAL);
    // The first tick completes immediately; consume it so the remaining
    // ticks land at 1s, 2s, ...
    interval.tick().await;

    loop {
        tokio::select! {
            // Completes on stop/reset, or with Err when the session drops.
            _ = shutdown.changed() => break,
            _ = interval.tick() => {
                let Some(inner) = session.upgrade() else { break };
                let reached_max = {
                    let mut s = inner.shared.lock().await;
                    if s.state != RecorderState::Recording {
                        break;
                    }
                    s.elapsed_seconds += 1;
                    inner.publish(&s);
                    s.elapsed_seconds >= inner.config.max_duration_secs
                };
                if reached_max {
                    inner.finalize_recording().await;
                    break;
                }
            }
        }
    }
}

/// Level-meter loop; republishes `audio_level` while recording.
async fn run_meter(session: Weak<SessionInner>, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(METER_INTERVAL);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = interval.tick() => {
                let Some(inner) = session.upgrade() else { break };
                let mut s = inner.shared.lock().await;
                if s.state != RecorderState::Recording {
                    break;
                }
                if let Some(capture) = &s.capture {
                    let window = capture.level_window();
                    s.audio_level = meter::level_from_samples(&window);
                    inner.publish(&s);
                }
            }
        }
    }
}
