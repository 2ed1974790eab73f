use error_location::ErrorLocation;
use thiserror::Error;

/// Audio coordination errors with source location tracking.
#[derive(Error, Debug)]
pub enum AudioError {
    /// No audio input device found.
    #[error("No microphone found {location}")]
    NoMicrophoneFound {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No audio output device found.
    #[error("No output device found {location}")]
    NoOutputDevice {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio device operation failed.
    #[error("Audio device error: {reason} {location}")]
    DeviceError {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The speech synthesis request could not be sent or read.
    #[error("Synthesis request failed: {reason} {location}")]
    SynthesisRequestFailed {
        /// Description of the transport failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The speech synthesis function returned a non-success status.
    #[error("Synthesis rejected with status {status} {location}")]
    SynthesisRejected {
        /// HTTP status returned by the remote function.
        status: u16,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Synthesized or recorded audio bytes could not be decoded.
    #[error("Audio decode failed: {reason} {location}")]
    DecodeFailed {
        /// Description of the decode failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio resampling failed.
    #[error("Resampling error: {reason} {location}")]
    ResamplingError {
        /// Description of the resampling error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Captured samples could not be encoded into a clip.
    #[error("Clip encoding failed: {reason} {location}")]
    EncodingFailed {
        /// Description of the encoding failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The platform refused to start playback.
    #[error("Playback rejected: {reason} {location}")]
    PlaybackRejected {
        /// Description of the playback rejection.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No audio data captured or provided.
    #[error("No audio captured {location}")]
    NoAudioCaptured {
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Result type alias using [`AudioError`].
pub type Result<T> = std::result::Result<T, AudioError>;
