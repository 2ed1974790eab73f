use crate::config::default_true;

use serde::{Deserialize, Serialize};
use trucktalk_core::CaptureConstraints;

/// Audio device and capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Input device name (None = default device).
    #[serde(default)]
    pub input_device: Option<String>,
    /// Output device name (None = default device).
    #[serde(default)]
    pub output_device: Option<String>,
    /// Request echo cancellation on capture.
    #[serde(default = "default_true")]
    pub echo_cancellation: bool,
    /// Request noise suppression on capture.
    #[serde(default = "default_true")]
    pub noise_suppression: bool,
    /// Request automatic gain control on capture.
    #[serde(default = "default_true")]
    pub auto_gain_control: bool,
}

impl AudioConfig {
    /// Capture constraints the gate and recorder open streams with.
    pub fn capture_constraints(&self) -> CaptureConstraints {
        CaptureConstraints {
            input_device: self.input_device.clone(),
            echo_cancellation: self.echo_cancellation,
            noise_suppression: self.noise_suppression,
            auto_gain_control: self.auto_gain_control,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            input_device: None,
            output_device: None,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}
