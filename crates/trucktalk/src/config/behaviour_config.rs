use crate::config::{DEFAULT_MAX_DURATION_SECS, default_max_duration, default_true};

use serde::{Deserialize, Serialize};

/// Application behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Recorder automatic stop bound in seconds.
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: u32,
    /// Whether to show desktop toasts for failures.
    #[serde(default = "default_true")]
    pub show_toasts: bool,
    /// Reference line shown before recording, if any. Display only.
    #[serde(default)]
    pub practice_line: Option<String>,
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
            show_toasts: true,
            practice_line: None,
        }
    }
}
