//! Text-to-speech playback dispatch.
//!
//! Turns a line of lesson text into audible speech exactly once per call,
//! tracking concurrent in-flight requests independently by identifier so
//! the UI can show per-button spinners without global locking.

mod decode;
mod dispatcher;
mod resampler;
mod route;
mod synthesis;

pub use {
    dispatcher::{PlaybackDispatcher, RequestStatus},
    route::{OutputRoute, ROUTE_RESOLVE_TIMEOUT, resolve_route},
    synthesis::{HttpSynthesisClient, SpeechSynthesizer},
};

pub(crate) use {
    decode::{DecodedAudio, decode_audio_bytes},
    resampler::Resampler,
};
