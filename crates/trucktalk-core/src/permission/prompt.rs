/// Which capability a confirmation dialog is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    /// Permission to initialize audio playback.
    Playback,
    /// Permission to open the microphone.
    Microphone,
}

/// Blocking user-confirmation surface shown when a silent probe is not
/// permitted or fails.
///
/// Implementations may block the calling thread (the gate bridges them
/// through `spawn_blocking`). They must not be dismissible ambiently: the
/// user either confirms or denies.
pub trait PermissionPrompt: Send + Sync {
    /// Ask the user to confirm the capability. `true` means proceed.
    fn confirm(&self, kind: PermissionKind) -> bool;
}

/// A prompt that confirms everything without asking. For headless hosts
/// and examples.
#[derive(Debug, Default)]
pub struct AutoConfirmPrompt;

impl PermissionPrompt for AutoConfirmPrompt {
    fn confirm(&self, _kind: PermissionKind) -> bool {
        true
    }
}
