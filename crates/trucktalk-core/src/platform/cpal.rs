use crate::{
    AudioError, CoreResult, OutputRoute,
    platform::{AudioPlatform, CaptureConstraints, CaptureStream, PlaybackHandle, PlaybackSink},
};

use std::{
    collections::VecDeque,
    panic::Location,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// Maximum samples to buffer (2 minutes at 48kHz mono).
/// Prevents unbounded memory growth if a stop never arrives; practice
/// clips are capped well below this by the recorder's max duration.
pub(crate) const MAX_BUFFER_SAMPLES: usize = 48_000 * 60 * 2;

/// Samples exposed to the level meter (~43ms at 48kHz).
const LEVEL_WINDOW_SAMPLES: usize = 2048;

/// Production [`AudioPlatform`] backed by cpal.
pub struct CpalPlatform {
    preferred_output: Option<String>,
}

impl CpalPlatform {
    /// Create a platform using the host's default devices.
    pub fn new() -> Self {
        Self {
            preferred_output: None,
        }
    }

    /// Route playback to a named output device when present; falls back to
    /// the default device when the name no longer resolves.
    pub fn with_preferred_output(mut self, device: Option<String>) -> Self {
        self.preferred_output = device;
        self
    }

    fn output_device(&self) -> CoreResult<Device> {
        let host = cpal::default_host();

        if let Some(name) = &self.preferred_output {
            if let Some(device) = find_device(host.output_devices().ok(), name) {
                return Ok(device);
            }
            warn!(device = %name, "Preferred output device not found, using default");
        }

        host.default_output_device()
            .ok_or(AudioError::NoOutputDevice {
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

impl Default for CpalPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioPlatform for CpalPlatform {
    fn open_playback(&self) -> CoreResult<Box<dyn PlaybackSink>> {
        let device = self.output_device()?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceError {
                reason: format!("Failed to get output config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        let config: StreamConfig = config.into();

        // Confirm the device actually accepts streams before reporting a
        // usable playback context. The probe stream is dropped immediately.
        let probe = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| data.fill(0.0),
                |err| {
                    error!("Playback probe stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::DeviceError {
                reason: format!("Failed to build output stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        probe.play().map_err(|e| AudioError::DeviceError {
            reason: format!("Failed to start output stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;
        drop(probe);

        info!(
            device = %device_display_name(&device),
            sample_rate = config.sample_rate,
            channels = config.channels,
            "Playback context opened"
        );

        Ok(Box::new(CpalSink { device, config }))
    }

    fn open_capture(&self, constraints: &CaptureConstraints) -> CoreResult<Box<dyn CaptureStream>> {
        Ok(Box::new(CpalCaptureStream::open(constraints)?))
    }
}

/// Playback context bound to one cpal output device.
struct CpalSink {
    device: Device,
    config: StreamConfig,
}

impl PlaybackSink for CpalSink {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn is_suspended(&self) -> bool {
        // cpal contexts are live once built; the suspended state only
        // exists on hosts that gate audio behind a user gesture.
        false
    }

    fn play(&mut self, samples: Vec<f32>) -> CoreResult<PlaybackHandle> {
        let channels = usize::from(self.config.channels);
        let mut queue: VecDeque<f32> = samples.into();
        let (finished_tx, finished_rx) = tokio::sync::watch::channel(false);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        match queue.pop_front() {
                            Some(sample) => frame.fill(sample),
                            None => frame.fill(0.0),
                        }
                    }
                    if queue.is_empty() && !*finished_tx.borrow() {
                        let _ = finished_tx.send(true);
                    }
                },
                |err| {
                    error!("Playback stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::PlaybackRejected {
                reason: format!("Failed to build playback stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        stream.play().map_err(|e| AudioError::PlaybackRejected {
            reason: format!("Failed to start playback: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!("Playback started");

        // The handle owns the stream; dropping it stops playback and drops
        // finished_tx, which completes the signal for any waiter.
        Ok(PlaybackHandle::new(finished_rx, Box::new(stream)))
    }
}

/// Live microphone stream buffering mono samples.
pub(crate) struct CpalCaptureStream {
    config: StreamConfig,
    stream: Option<Stream>,
    samples: Arc<Mutex<VecDeque<f32>>>,
    /// Signals the audio callback to stop writing. Set to `true` before
    /// dropping the stream so no in-flight callback writes after the lock
    /// is acquired in `stop()`.
    shutdown: Arc<AtomicBool>,
}

impl CpalCaptureStream {
    #[track_caller]
    #[instrument(skip(constraints))]
    pub(crate) fn open(constraints: &CaptureConstraints) -> CoreResult<Self> {
        let host = cpal::default_host();

        let device = match &constraints.input_device {
            Some(name) => find_device(host.input_devices().ok(), name).ok_or(
                AudioError::NoMicrophoneFound {
                    location: ErrorLocation::from(Location::caller()),
                },
            )?,
            None => host
                .default_input_device()
                .ok_or(AudioError::NoMicrophoneFound {
                    location: ErrorLocation::from(Location::caller()),
                })?,
        };

        let supported = device
            .default_input_config()
            .map_err(|e| AudioError::DeviceError {
                reason: format!("Failed to get input config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        let config: StreamConfig = supported.into();
        let channels = usize::from(config.channels).max(1);

        // cpal has no per-stream toggles for these; hosts that honor them
        // apply them at the device level. Logged so the requested contract
        // is visible next to the stream open.
        debug!(
            echo_cancellation = constraints.echo_cancellation,
            noise_suppression = constraints.noise_suppression,
            auto_gain_control = constraints.auto_gain_control,
            "Capture constraints requested"
        );

        let samples = Arc::new(Mutex::new(VecDeque::with_capacity(MAX_BUFFER_SAMPLES)));
        let shutdown = Arc::new(AtomicBool::new(false));

        let callback_samples = Arc::clone(&samples);
        let callback_shutdown = Arc::clone(&shutdown);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Check shutdown before acquiring the lock: once stop()
                    // sets this flag, no new samples are written even if the
                    // backend fires one more callback before the stream drops.
                    if callback_shutdown.load(Ordering::Acquire) {
                        return;
                    }
                    // Recover from lock poison rather than silently dropping
                    // audio; the VecDeque data is still valid after a panic
                    // in a previous holder.
                    let mut buf = callback_samples.lock().unwrap_or_else(|e| {
                        error!("Sample buffer lock poisoned, recovering: {}", e);
                        e.into_inner()
                    });
                    // Downmix interleaved frames to mono.
                    buf.extend(
                        data.chunks(channels)
                            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
                    );
                    // Ring bound: O(1) amortized drop of oldest samples.
                    while buf.len() > MAX_BUFFER_SAMPLES {
                        buf.pop_front();
                    }
                },
                |err| {
                    error!("Capture stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::DeviceError {
                reason: format!("Failed to build capture stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        stream.play().map_err(|e| AudioError::DeviceError {
            reason: format!("Failed to start capture stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(
            device = %device_display_name(&device),
            sample_rate = config.sample_rate,
            channels = config.channels,
            "Capture stream opened"
        );

        Ok(Self {
            config,
            stream: Some(stream),
            samples,
            shutdown,
        })
    }
}

impl CaptureStream for CpalCaptureStream {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn level_window(&self) -> Vec<f32> {
        let buf = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        let start = buf.len().saturating_sub(LEVEL_WINDOW_SAMPLES);
        buf.iter().skip(start).copied().collect()
    }

    fn stop(&mut self) -> CoreResult<Vec<f32>> {
        // Signal the callback to stop writing BEFORE dropping the stream,
        // so a backend whose drop is asynchronous cannot write after we
        // collect below.
        self.shutdown.store(true, Ordering::Release);

        if let Some(stream) = self.stream.take() {
            drop(stream);
            // Brief yield so any in-flight callback observes the shutdown
            // flag. Most backends join the audio thread in drop, making
            // this redundant; it costs <5ms and holds on the rest.
            std::thread::sleep(std::time::Duration::from_millis(5));
            info!("Capture stream stopped");
        }

        let samples: Vec<f32> = self
            .samples
            .lock()
            .map_err(|e| AudioError::DeviceError {
                reason: format!("Failed to lock samples: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?
            .iter()
            .copied()
            .collect();

        debug!(sample_count = samples.len(), "Captured audio samples");

        Ok(samples)
    }
}

impl Drop for CpalCaptureStream {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        // Stream drop releases the device if stop() was never called.
    }
}

/// Resolve the optional output-route capability for a named device.
///
/// Enumerates output devices off the async runtime and returns a route only
/// when the named device currently exists. Callers bound this with
/// [`resolve_route`](crate::resolve_route) so a slow or hung audio host
/// cannot stall startup.
pub async fn probe_output_route(device: String) -> Option<OutputRoute> {
    let probed = tokio::task::spawn_blocking(move || {
        let host = cpal::default_host();
        find_device(host.output_devices().ok(), &device).map(|_| device)
    })
    .await;

    match probed {
        Ok(Some(device)) => Some(OutputRoute {
            output_device: Some(device),
        }),
        Ok(None) => None,
        Err(e) => {
            warn!(error = ?e, "Output route probe panicked");
            None
        }
    }
}

fn device_display_name(device: &Device) -> String {
    device
        .description()
        .map(|desc| desc.name().to_string())
        .unwrap_or_else(|_| {
            #[allow(deprecated)]
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        })
}

fn find_device<I>(devices: Option<I>, name: &str) -> Option<Device>
where
    I: Iterator<Item = Device>,
{
    devices?.find(|d| device_display_name(d) == name)
}
