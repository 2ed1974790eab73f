use std::{future::Future, time::Duration};

use tracing::{debug, warn};

/// Optional output-route capability.
///
/// Resolved once at startup; the coordinator behaves identically whether or
/// not it is present.
#[derive(Debug, Clone, Default)]
pub struct OutputRoute {
    /// Output device playback should prefer.
    pub output_device: Option<String>,
}

/// Wall-clock bound on resolving the optional route capability.
pub const ROUTE_RESOLVE_TIMEOUT: Duration = Duration::from_secs(3);

/// Resolve an optional [`OutputRoute`] from `loader`, bounded by
/// [`ROUTE_RESOLVE_TIMEOUT`].
///
/// A slow or absent loader must never stall startup: on timeout the route
/// is simply dropped and playback uses the default device.
pub async fn resolve_route<F>(loader: F) -> Option<OutputRoute>
where
    F: Future<Output = Option<OutputRoute>> + Send,
{
    match tokio::time::timeout(ROUTE_RESOLVE_TIMEOUT, loader).await {
        Ok(route) => {
            debug!(resolved = route.is_some(), "Output route loader finished");
            route
        }
        Err(_) => {
            warn!(
                timeout_ms = ROUTE_RESOLVE_TIMEOUT.as_millis() as u64,
                "Output route loader timed out, continuing without it"
            );
            None
        }
    }
}
