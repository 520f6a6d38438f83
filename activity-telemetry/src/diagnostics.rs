//! Diagnostic log setup
//!
//! The library only emits `tracing` events. Hosts without a subscriber of
//! their own can install a console one here.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "activity_telemetry=info,activity=info";

/// Install a console subscriber honoring `RUST_LOG`, falling back to
/// `default_filter`.
///
/// Returns false when a global subscriber was already set.
pub fn init(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
