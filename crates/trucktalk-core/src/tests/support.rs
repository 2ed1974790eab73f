//! Scripted doubles standing in for the host platform, the synthesis
//! function, the confirmation dialog, and the toast surface.

use crate::{
    AudioError, CoreResult, Notice, Notifier, PermissionKind, PermissionPrompt,
    platform::{AudioPlatform, CaptureConstraints, CaptureStream, PlaybackHandle, PlaybackSink},
    playback::SpeechSynthesizer,
};

use std::{
    future::Future,
    panic::Location,
    pin::Pin,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use error_location::ErrorLocation;
use tokio::sync::watch;

/// Scripted [`AudioPlatform`]: configurable grants, counted opens,
/// observable stream teardown.
pub(crate) struct FakePlatform {
    playback_ok: AtomicBool,
    capture_ok: AtomicBool,
    auto_finish_playback: AtomicBool,
    pub(crate) playback_opens: AtomicUsize,
    pub(crate) capture_opens: AtomicUsize,
    capture_script: Mutex<Vec<f32>>,
    capture_stopped: Mutex<Vec<Arc<AtomicBool>>>,
    sink_finishers: Arc<Mutex<Vec<watch::Sender<bool>>>>,
}

impl FakePlatform {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            playback_ok: AtomicBool::new(true),
            capture_ok: AtomicBool::new(true),
            auto_finish_playback: AtomicBool::new(true),
            playback_opens: AtomicUsize::new(0),
            capture_opens: AtomicUsize::new(0),
            capture_script: Mutex::new(vec![0.25; 4800]),
            capture_stopped: Mutex::new(Vec::new()),
            sink_finishers: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub(crate) fn deny_playback(&self) {
        self.playback_ok.store(false, Ordering::SeqCst);
    }

    pub(crate) fn deny_capture(&self) {
        self.capture_ok.store(false, Ordering::SeqCst);
    }

    /// Sinks created after this call keep playing until
    /// [`finish_last_playback`](Self::finish_last_playback).
    pub(crate) fn manual_finish_playback(&self) {
        self.auto_finish_playback.store(false, Ordering::SeqCst);
    }

    pub(crate) fn finish_last_playback(&self) {
        let finishers = self
            .sink_finishers
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = finishers.last() {
            let _ = tx.send(true);
        }
    }

    pub(crate) fn capture_stopped_flags(&self) -> Vec<Arc<AtomicBool>> {
        self.capture_stopped
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl AudioPlatform for FakePlatform {
    fn open_playback(&self) -> CoreResult<Box<dyn PlaybackSink>> {
        self.playback_opens.fetch_add(1, Ordering::SeqCst);
        if !self.playback_ok.load(Ordering::SeqCst) {
            return Err(AudioError::NoOutputDevice {
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(Box::new(FakeSink {
            auto_finish: self.auto_finish_playback.load(Ordering::SeqCst),
            finishers: Arc::clone(&self.sink_finishers),
        }))
    }

    fn open_capture(&self, _constraints: &CaptureConstraints) -> CoreResult<Box<dyn CaptureStream>> {
        self.capture_opens.fetch_add(1, Ordering::SeqCst);
        if !self.capture_ok.load(Ordering::SeqCst) {
            return Err(AudioError::NoMicrophoneFound {
                location: ErrorLocation::from(Location::caller()),
            });
        }
        let stopped = Arc::new(AtomicBool::new(false));
        self.capture_stopped
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::clone(&stopped));
        Ok(Box::new(FakeCaptureStream {
            samples: self
                .capture_script
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
            stopped,
        }))
    }
}

struct FakeSink {
    auto_finish: bool,
    finishers: Arc<Mutex<Vec<watch::Sender<bool>>>>,
}

impl PlaybackSink for FakeSink {
    fn sample_rate(&self) -> u32 {
        48_000
    }

    fn is_suspended(&self) -> bool {
        false
    }

    fn play(&mut self, _samples: Vec<f32>) -> CoreResult<PlaybackHandle> {
        let (tx, rx) = watch::channel(self.auto_finish);
        if !self.auto_finish {
            self.finishers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(tx);
        }
        Ok(PlaybackHandle::new(rx, Box::new(())))
    }
}

struct FakeCaptureStream {
    samples: Vec<f32>,
    stopped: Arc<AtomicBool>,
}

impl CaptureStream for FakeCaptureStream {
    fn sample_rate(&self) -> u32 {
        16_000
    }

    fn level_window(&self) -> Vec<f32> {
        self.samples.iter().take(256).copied().collect()
    }

    fn stop(&mut self) -> CoreResult<Vec<f32>> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(self.samples.clone())
    }
}

impl Drop for FakeCaptureStream {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// What the fake synthesis function returns next.
pub(crate) enum SynthOutcome {
    /// Raw audio bytes, as the canonical contract delivers.
    Bytes(Vec<u8>),
    /// Non-success HTTP status.
    Reject(u16),
}

/// Scripted [`SpeechSynthesizer`] with counted calls.
pub(crate) struct FakeSynthesizer {
    pub(crate) calls: AtomicUsize,
    outcome: Mutex<SynthOutcome>,
}

impl FakeSynthesizer {
    pub(crate) fn bytes(bytes: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            outcome: Mutex::new(SynthOutcome::Bytes(bytes)),
        })
    }

    pub(crate) fn rejecting(status: u16) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            outcome: Mutex::new(SynthOutcome::Reject(status)),
        })
    }

    pub(crate) fn set_outcome(&self, outcome: SynthOutcome) {
        *self.outcome.lock().unwrap_or_else(|e| e.into_inner()) = outcome;
    }
}

impl SpeechSynthesizer for FakeSynthesizer {
    fn synthesize<'a>(
        &'a self,
        _text: &'a str,
    ) -> Pin<Box<dyn Future<Output = CoreResult<Vec<u8>>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = match &*self.outcome.lock().unwrap_or_else(|e| e.into_inner()) {
            SynthOutcome::Bytes(bytes) => Ok(bytes.clone()),
            SynthOutcome::Reject(status) => Err(AudioError::SynthesisRejected {
                status: *status,
                location: ErrorLocation::from(Location::caller()),
            }),
        };
        Box::pin(async move { outcome })
    }
}

/// Collects every notice for assertion.
#[derive(Default)]
pub(crate) struct CountingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl CountingNotifier {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn count(&self, predicate: impl Fn(&Notice) -> bool) -> usize {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|n| predicate(n))
            .count()
    }
}

impl Notifier for CountingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notice);
    }
}

/// Prompt returning a fixed answer, counting invocations.
pub(crate) struct ScriptedPrompt {
    answer: bool,
    pub(crate) asked: AtomicUsize,
}

impl ScriptedPrompt {
    pub(crate) fn answering(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            asked: AtomicUsize::new(0),
        })
    }
}

impl PermissionPrompt for ScriptedPrompt {
    fn confirm(&self, _kind: PermissionKind) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

/// A small mono WAV blob, for feeding the decoder as synthesis output.
pub(crate) fn wav_fixture(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .unwrap_or_else(|e| unreachable!("WAV writer on in-memory cursor: {e}"));
        for &sample in samples {
            let _ = writer.write_sample((sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16);
        }
        let _ = writer.finalize();
    }
    cursor.into_inner()
}

/// Yield repeatedly so spawned session tasks can run between assertions.
pub(crate) async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}
