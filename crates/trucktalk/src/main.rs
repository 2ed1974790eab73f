//! TruckTalk practice console: speak lesson lines through the hosted
//! text-to-speech function and record pronunciation takes.

mod app;
mod app_command;
mod config;
mod error;
mod prompt;
#[cfg(test)]
mod tests;
mod toast;
mod widget;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    error::{AppError, Result as AppResult},
    prompt::RfdPrompt,
    toast::DesktopNotifier,
    widget::{RecorderWidget, WidgetOptions},
};

use crate::config::Config;

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;
use tracing::error;
use trucktalk_core::{
    AudioPlatform, CpalPlatform, HttpSynthesisClient, PermissionGate, PlaybackDispatcher,
    ProbePolicy, install_gate, probe_output_route, resolve_route, uninstall_gate,
};

/// Application entry point.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("trucktalk=debug")
        .init();

    if let Err(e) = run().await {
        error!("Fatal: {:?}", e);
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let config = Config::load()?;
    config.validate_synthesis_endpoint()?;

    let notifier = Arc::new(DesktopNotifier::new(config.behaviour.show_toasts));

    // Optional output-route capability, bounded by a fixed timeout so a
    // slow audio host cannot stall startup; absent means default device.
    let route = match &config.audio.output_device {
        Some(device) => resolve_route(probe_output_route(device.clone())).await,
        None => None,
    };

    let platform: Arc<dyn AudioPlatform> = Arc::new(
        CpalPlatform::new().with_preferred_output(route.and_then(|r| r.output_device)),
    );

    let gate = Arc::new(PermissionGate::new(
        Arc::clone(&platform),
        Arc::new(RfdPrompt),
        notifier.clone(),
        ProbePolicy {
            allow_silent_probe: config.permission.allow_silent_probe,
        },
        config.audio.capture_constraints(),
    ));
    // Published so code outside the console loop can reach the gate.
    install_gate(Arc::clone(&gate));

    let synth = Arc::new(HttpSynthesisClient::new(
        &config.synthesis.endpoint,
        Duration::from_secs(config.synthesis.request_timeout_secs),
    )?);

    let dispatcher = PlaybackDispatcher::new(
        Arc::clone(&gate),
        Arc::clone(&platform),
        synth,
        notifier.clone(),
    );

    let (widget_tx, widget_rx) = mpsc::channel(32);
    let widget = RecorderWidget::new(
        Arc::clone(&platform),
        gate,
        notifier,
        WidgetOptions {
            max_duration_secs: config.behaviour.max_duration_secs,
            expected_text: config.behaviour.practice_line.clone(),
            constraints: config.audio.capture_constraints(),
        },
        widget_tx,
    );

    let result = App::new(dispatcher, widget, widget_rx).run().await;

    // Tear the published gate down with the console scope.
    uninstall_gate().await;

    result
}
