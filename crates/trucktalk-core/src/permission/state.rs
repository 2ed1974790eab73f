use serde::Serialize;

/// Microphone authorization as last observed by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MicPermission {
    /// Never requested.
    Unknown,
    /// A capture stream was successfully opened.
    Granted,
    /// The platform rejected the capture request.
    Denied,
}

/// Cached permission flags, written only by the gate.
///
/// Invariant: `has_playback_permission` and `is_initialized` are set
/// together; a granted playback permission implies initialization was
/// attempted and succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PermissionState {
    /// Playback context created and confirmed not suspended.
    pub has_playback_permission: bool,
    /// Playback initialization was performed.
    pub is_initialized: bool,
    /// Microphone authorization status.
    pub microphone: MicPermission,
}

impl PermissionState {
    /// Whether a microphone grant is currently cached.
    pub fn has_microphone_permission(&self) -> bool {
        self.microphone == MicPermission::Granted
    }
}

impl Default for PermissionState {
    fn default() -> Self {
        Self {
            has_playback_permission: false,
            is_initialized: false,
            microphone: MicPermission::Unknown,
        }
    }
}
