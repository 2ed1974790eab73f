//! Host media-platform boundary.
//!
//! The coordinator never talks to audio hardware directly; it goes through
//! [`AudioPlatform`], which hands out capture streams and playback sinks.
//! [`CpalPlatform`] is the production implementation. Tests substitute a
//! scripted platform so permission and recorder behavior can be exercised
//! without devices.

mod cpal;

pub use self::cpal::{CpalPlatform, probe_output_route};

use crate::CoreResult;

use std::any::Any;

use tokio::sync::watch;

/// Capture constraints requested when opening a microphone stream.
///
/// cpal exposes no direct toggles for these; the backend applies them where
/// the host honors them and logs the requested set. They are carried so the
/// gate and recorder open streams with one consistent contract.
#[derive(Debug, Clone)]
pub struct CaptureConstraints {
    /// Preferred input device name (`None` = default device).
    pub input_device: Option<String>,
    /// Request echo cancellation from the host.
    pub echo_cancellation: bool,
    /// Request noise suppression from the host.
    pub noise_suppression: bool,
    /// Request automatic gain control from the host.
    pub auto_gain_control: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            input_device: None,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Factory for platform capture streams and playback sinks.
pub trait AudioPlatform: Send + Sync {
    /// Create a playback context on the configured output route.
    ///
    /// Succeeding here is the platform half of playback permission: the
    /// device exists and accepts streams.
    fn open_playback(&self) -> CoreResult<Box<dyn PlaybackSink>>;

    /// Open a live microphone stream under `constraints`.
    ///
    /// The stream is capturing as soon as this returns.
    fn open_capture(&self, constraints: &CaptureConstraints) -> CoreResult<Box<dyn CaptureStream>>;
}

/// A playback context bound to one output device.
pub trait PlaybackSink: Send {
    /// Output sample rate; callers must resample to this before [`play`].
    ///
    /// [`play`]: PlaybackSink::play
    fn sample_rate(&self) -> u32;

    /// Whether the context is suspended and cannot produce audio.
    ///
    /// Desktop backends never suspend; the check exists for hosts that
    /// gate playback behind a user gesture.
    fn is_suspended(&self) -> bool;

    /// Start playing mono samples (already at [`sample_rate`]).
    ///
    /// Playback continues as long as the returned handle is kept alive.
    ///
    /// [`sample_rate`]: PlaybackSink::sample_rate
    fn play(&mut self, samples: Vec<f32>) -> CoreResult<PlaybackHandle>;
}

/// A live microphone stream.
///
/// Dropping the stream releases the device even if [`stop`] was never
/// called; `stop` additionally returns the buffered samples.
///
/// [`stop`]: CaptureStream::stop
pub trait CaptureStream: Send {
    /// Capture sample rate of the buffered samples.
    fn sample_rate(&self) -> u32;

    /// Copy of the most recent samples, for level metering only.
    fn level_window(&self) -> Vec<f32>;

    /// Stop capturing and return everything buffered since open.
    fn stop(&mut self) -> CoreResult<Vec<f32>>;
}

/// Handle to an in-flight playback started by [`PlaybackSink::play`].
///
/// The platform stream lives inside the handle's guard; dropping the handle
/// (or calling [`stop`]) tears playback down.
///
/// [`stop`]: PlaybackHandle::stop
pub struct PlaybackHandle {
    finished: watch::Receiver<bool>,
    guard: Option<Box<dyn Any + Send>>,
}

impl PlaybackHandle {
    /// Build a handle from a completion signal and the object keeping the
    /// underlying stream alive.
    pub fn new(finished: watch::Receiver<bool>, guard: Box<dyn Any + Send>) -> Self {
        Self {
            finished,
            guard: Some(guard),
        }
    }

    /// A clone of the completion signal, flipped to `true` when the queued
    /// samples have drained. The signal also completes (with an error on
    /// `changed`) if playback is torn down early.
    pub fn finished_signal(&self) -> watch::Receiver<bool> {
        self.finished.clone()
    }

    /// Stop playback immediately by releasing the underlying stream.
    pub fn stop(&mut self) {
        self.guard = None;
    }

    /// Wait until the queued samples have drained or playback is torn down.
    pub async fn wait(&mut self) {
        loop {
            if *self.finished.borrow_and_update() {
                break;
            }
            if self.finished.changed().await.is_err() {
                break;
            }
        }
    }
}

impl std::fmt::Debug for PlaybackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackHandle")
            .field("finished", &*self.finished.borrow())
            .field("active", &self.guard.is_some())
            .finish()
    }
}
