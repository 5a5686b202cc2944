//! Subscriber initialization. Sink failure degrades to an stdout-only
//! layer rather than raising into request paths — a broken log
//! destination must never take the service down with it.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber: env-filtered, JSON-formatted.
/// Safe to call more than once — a second call is a no-op rather than a panic,
/// since `set_global_default` failing here is exactly the "sink init
/// failure" case C19 requires falling back from.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_layer = fmt::layer().json().with_target(true).with_current_span(true);

    let registry = tracing_subscriber::registry().with(filter).with(json_layer);

    if registry.try_init().is_err() {
        // Another subscriber is already installed, or install failed for
        // some other reason. Fall back to a bare stdout layer so logging
        // degrades instead of disappearing; if even that fails there is
        // nothing left to do but proceed without structured logs.
        let _ = tracing_subscriber::fmt().with_env_filter(EnvFilter::new("info")).try_init();
    }
}
