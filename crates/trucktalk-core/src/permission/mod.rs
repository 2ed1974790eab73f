//! Playback and microphone permission coordination.
//!
//! One [`PermissionGate`] instance is the single source of truth for "can
//! we play/record audio right now". It caches grants, performs the
//! user-confirmation dance at most once per session, and can be published
//! process-wide for code outside the UI tree.

mod gate;
mod prompt;
mod state;

pub use {
    gate::{PermissionGate, ProbePolicy, current_gate, install_gate, uninstall_gate},
    prompt::{AutoConfirmPrompt, PermissionKind, PermissionPrompt},
    state::{MicPermission, PermissionState},
};
