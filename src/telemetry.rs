//! Tracing subscriber setup and metric descriptions.

use std::sync::Once;

use anyhow::{Result, anyhow};
use metrics::{Unit, describe_counter};
use tracing_subscriber::{
    EnvFilter,
    filter::LevelFilter,
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Installs a global tracing subscriber.
///
/// `RUST_LOG` directives win over `level`; an unparsable `level` falls back
/// to `info`. `format` is `text` or `json`.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn init(level: &str, format: &str) -> Result<()> {
    describe_metrics();

    let default_directive = level
        .parse()
        .unwrap_or_else(|_| LevelFilter::INFO.into());
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_directive)
        .from_env_lossy();

    let fmt_layer = match format {
        "json" => fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .boxed(),
        _ => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}

/// Registers units and help text for the cache counters.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "cache_provider_hit_total",
            Unit::Count,
            "Cached calls answered from the backend."
        );
        describe_counter!(
            "cache_provider_miss_total",
            Unit::Count,
            "Cached calls that ran the original method."
        );
        describe_counter!(
            "cache_provider_store_total",
            Unit::Count,
            "Computed values accepted by the backend."
        );
        describe_counter!(
            "cache_provider_store_failed_total",
            Unit::Count,
            "Computed values the backend failed to store."
        );
        describe_counter!(
            "cache_provider_get_error_total",
            Unit::Count,
            "Backend lookups that failed."
        );
        describe_counter!(
            "cache_provider_collision_total",
            Unit::Count,
            "Hits holding a value of another type."
        );
    });
}
