use crate::config::default_true;

use serde::{Deserialize, Serialize};

/// Permission acquisition policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionConfig {
    /// When `true`, playback permission is first probed silently; the
    /// confirmation dialog only appears if the probe fails. Set to `false`
    /// for restricted environments that must always ask.
    #[serde(default = "default_true")]
    pub allow_silent_probe: bool,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self {
            allow_silent_probe: true,
        }
    }
}
