//! Pronunciation-practice recorder.
//!
//! A flat six-state machine (`Idle`, `Requesting`, `Recording`, `Recorded`,
//! `Playing`, `Error`) per widget instance. Concurrency is avoided by
//! construction: one session owns at most one capture stream, one elapsed
//! timer, one level-meter loop, and one playback handle, and all of them
//! are released together on any exit from `Recording`.

mod encoder;
mod meter;
mod session;

pub(crate) use encoder::encode_wav;

pub use {
    encoder::AudioClip,
    meter::level_from_samples,
    session::{
        PermissionDeniedFn, RecorderCallbacks, RecorderConfig, RecorderSession, RecorderSnapshot,
        RecorderState, RecordingCompleteFn,
    },
};
