use crate::config::TracingConfig;

#[cfg(feature = "telemetry")]
use opentelemetry::trace::TracerProvider as _;
#[cfg(feature = "telemetry")]
use opentelemetry_otlp::WithExportConfig;
#[cfg(feature = "telemetry")]
use opentelemetry_sdk::trace::TracerProvider;

#[cfg(feature = "telemetry")]
pub fn init_telemetry(config: &TracingConfig) -> Option<TracerProvider> {
    if !config.enabled {
        return None;
    }

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(&config.otlp_endpoint);

    let provider = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(opentelemetry_sdk::trace::Sampler::TraceIdRatioBased(
                    config.sample_rate,
                ))
                .with_resource(opentelemetry_sdk::Resource::new(vec![
                    opentelemetry::KeyValue::new("service.name", config.service_name.clone()),
                ])),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)
        .expect("failed to install OpenTelemetry tracer");

    Some(provider)
}

#[cfg(feature = "telemetry")]
pub fn make_otel_layer(
    provider: &TracerProvider,
) -> tracing_opentelemetry::OpenTelemetryLayer<
    tracing_subscriber::Registry,
    opentelemetry_sdk::trace::Tracer,
> {
    let tracer = provider.tracer("metafleet");
    tracing_opentelemetry::layer().with_tracer(tracer)
}

#[cfg(not(feature = "telemetry"))]
pub fn init_telemetry(_config: &TracingConfig) -> Option<()> {
    None
}
