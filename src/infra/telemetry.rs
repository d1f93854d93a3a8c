use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing::Subscriber;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the global tracing subscriber and register metric descriptions.
///
/// `RUST_LOG` directives refine the configured level; they never replace it.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    METRIC_DESCRIPTIONS.call_once(describe_metrics);

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(output_layer(logging.format))
        .try_init()
        .map_err(|err| InfraError::telemetry(format!("subscriber already installed: {err}")))
}

fn output_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    }
}

fn describe_metrics() {
    describe_histogram!(
        "isupipe_cache_load_ms",
        Unit::Milliseconds,
        "Full cache reload latency, labelled by outcome."
    );
    describe_counter!(
        "isupipe_cache_load_failures_total",
        Unit::Count,
        "Aborted cache reloads, labelled by the entity whose query failed."
    );
    describe_gauge!(
        "isupipe_cache_generation",
        Unit::Count,
        "Completed cache reloads since process start."
    );
}
