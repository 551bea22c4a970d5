//! Logging and trace export.
//!
//! Logs always go to stdout through `tracing-subscriber`, filtered by
//! `RUST_LOG` (default `info`). With the `telemetry` feature, spans are also
//! exported over OTLP/gRPC when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.

use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

#[cfg(feature = "telemetry")]
use opentelemetry::KeyValue;
#[cfg(feature = "telemetry")]
use opentelemetry::trace::TracerProvider;
#[cfg(feature = "telemetry")]
use opentelemetry_sdk::Resource;
#[cfg(feature = "telemetry")]
use opentelemetry_sdk::trace::SdkTracerProvider;
#[cfg(feature = "telemetry")]
use opentelemetry_semantic_conventions::{
    SCHEMA_URL,
    attribute::{SERVICE_NAME, SERVICE_VERSION},
};

const DEFAULT_FILTER: &str = "info";

#[cfg(feature = "telemetry")]
const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Builder for the process-wide tracing subscriber.
#[derive(Debug, Clone)]
#[cfg_attr(not(feature = "telemetry"), allow(dead_code))]
pub struct Telemetry {
    name: String,
    version: String,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Service name reported to the trace collector.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Installs the global subscriber.
    ///
    /// Keep the returned [`TelemetryProviders`] alive for the lifetime of the
    /// process; dropping it flushes and shuts down trace export.
    pub fn register(self) -> TelemetryProviders {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let registry = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer());

        #[cfg(feature = "telemetry")]
        let tracer_provider = self.tracer_provider();
        #[cfg(feature = "telemetry")]
        let registry = registry.with(tracer_provider.as_ref().map(|provider| {
            tracing_opentelemetry::layer().with_tracer(provider.tracer(self.name.clone()))
        }));

        if let Err(e) = registry.try_init() {
            eprintln!("Tracing subscriber already installed: {e}");
        }

        TelemetryProviders {
            #[cfg(feature = "telemetry")]
            tracer_provider,
        }
    }

    #[cfg(feature = "telemetry")]
    fn resource(&self) -> Resource {
        Resource::builder()
            .with_schema_url(
                [
                    KeyValue::new(SERVICE_NAME, self.name.clone()),
                    KeyValue::new(SERVICE_VERSION, self.version.clone()),
                ],
                SCHEMA_URL,
            )
            .build()
    }

    #[cfg(feature = "telemetry")]
    fn tracer_provider(&self) -> Option<SdkTracerProvider> {
        std::env::var(OTLP_ENDPOINT_VAR).ok()?;
        let exporter = match opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .build()
        {
            Ok(exporter) => exporter,
            Err(e) => {
                eprintln!("OTLP span exporter disabled: {e}");
                return None;
            }
        };
        let provider = SdkTracerProvider::builder()
            .with_resource(self.resource())
            .with_batch_exporter(exporter)
            .build();
        opentelemetry::global::set_tracer_provider(provider.clone());
        Some(provider)
    }
}

/// Handles to the installed exporters.
pub struct TelemetryProviders {
    #[cfg(feature = "telemetry")]
    tracer_provider: Option<SdkTracerProvider>,
}

impl TelemetryProviders {
    /// Request/response spans for the HTTP server.
    pub fn http_tracing(&self) -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
        TraceLayer::new_for_http()
    }

    #[cfg(feature = "telemetry")]
    pub fn exports_traces(&self) -> bool {
        self.tracer_provider.is_some()
    }
}

impl Drop for TelemetryProviders {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        if let Some(provider) = self.tracer_provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("{e:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_service_identity() {
        let telemetry = Telemetry::new()
            .with_name("x402-bridge-facilitator")
            .with_version("9.9.9");
        assert_eq!(telemetry.name, "x402-bridge-facilitator");
        assert_eq!(telemetry.version, "9.9.9");
    }

    #[test]
    fn test_register_twice_does_not_panic() {
        let _first = Telemetry::new().register();
        let _second = Telemetry::new().register();
    }
}
