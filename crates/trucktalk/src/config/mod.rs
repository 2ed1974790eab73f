mod audio_config;
mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod permission_config;
mod synthesis_config;

pub(crate) use {
    audio_config::AudioConfig, behaviour_config::BehaviourConfig, config::Config,
    permission_config::PermissionConfig, synthesis_config::SynthesisConfig,
};

pub(crate) const DEFAULT_MAX_DURATION_SECS: u32 = 30;
pub(crate) const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
pub(crate) const DEFAULT_SYNTHESIS_ENDPOINT: &str =
    "https://api.trucktalk.app/functions/v1/text-to-speech";

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_max_duration() -> u32 {
    DEFAULT_MAX_DURATION_SECS
}

pub(crate) fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

pub(crate) fn default_endpoint() -> String {
    DEFAULT_SYNTHESIS_ENDPOINT.to_string()
}
