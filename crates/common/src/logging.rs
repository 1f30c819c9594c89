//! Initializes structured logging and the optional OpenTelemetry span exporter.
use std::env;

use opentelemetry::{trace::TracerProvider, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};
use tracing::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Environment variable holding the OTLP collector endpoint.
pub const OTLP_URL_ENVVAR: &str = "GBPL_CUSTODY_OTLP_URL";

/// Environment variable name for the service label, which is appended to the
/// whoami string.
pub const SVC_LABEL_ENVVAR: &str = "GBPL_CUSTODY_SVC_LABEL";

/// Name of the tracer registered with the span exporter.
const TRACER_NAME: &str = "gbpl-custody";

/// Configuration for the logger.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Identifies this service in logs and exported spans.
    whoami: String,

    /// Where spans get exported to, if anywhere.
    otel_url: Option<String>,
}

impl LoggerConfig {
    /// Creates a new empty instance with whoami set.
    pub const fn new(whoami: String) -> Self {
        Self {
            whoami,
            otel_url: None,
        }
    }

    /// Creates a new instance whose whoami string is derived from `s` and the service label in
    /// the environment, if any.
    pub fn with_base_name(s: &str) -> Self {
        Self::new(get_whoami_string(s))
    }

    /// Sets the opentelemetry URL to the provided string.
    pub fn set_otlp_url(&mut self, url: String) {
        self.otel_url = Some(url);
    }

    /// The whoami string.
    pub fn whoami(&self) -> &str {
        &self.whoami
    }

    /// The configured OTLP endpoint.
    pub fn otlp_url(&self) -> Option<&str> {
        self.otel_url.as_deref()
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::with_base_name("(gbpl-custody)")
    }
}

/// Initializes the logging subsystem with the provided config.
///
/// Stdout logging is always enabled and filtered via `RUST_LOG`. If an OTLP endpoint is
/// configured but the exporter cannot be built, the failure is logged and only stdout logging is
/// kept.
pub fn init(config: LoggerConfig) {
    let filt = tracing_subscriber::EnvFilter::from_default_env();

    let log_file = env::var("LOG_FILE").is_ok_and(|v| v == "1");
    let log_line_num = env::var("LOG_LINE_NUM").is_ok_and(|v| v == "1");

    let stdout_sub = tracing_subscriber::fmt::layer()
        .compact()
        .event_format(
            tracing_subscriber::fmt::format()
                .with_file(log_file)
                .with_line_number(log_line_num),
        )
        .with_filter(filt);

    let Some(otel_url) = config.otlp_url() else {
        tracing_subscriber::registry().with(stdout_sub).init();
        info!(whoami = %config.whoami, "logging started");
        return;
    };

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(otel_url)
        .build();

    match exporter {
        Ok(exporter) => {
            let resource = Resource::builder()
                .with_attribute(KeyValue::new("service.name", config.whoami.clone()))
                .build();

            let tp = SdkTracerProvider::builder()
                .with_resource(resource)
                .with_batch_exporter(exporter)
                .build();

            let otel_sub = tracing_opentelemetry::layer().with_tracer(tp.tracer(TRACER_NAME));

            tracing_subscriber::registry()
                .with(stdout_sub)
                .with(otel_sub)
                .init();
        }
        Err(err) => {
            tracing_subscriber::registry().with(stdout_sub).init();
            warn!(%otel_url, %err, "could not build span exporter, exporting to stdout only");
        }
    }

    info!(whoami = %config.whoami, "logging started");
}

/// Gets the OTLP URL from the standard envvar.
pub fn get_otlp_url_from_env() -> Option<String> {
    env::var(OTLP_URL_ENVVAR).ok()
}

/// Gets the service label from the standard envvar, which should be included
/// in the whoami string.
pub fn get_service_label_from_env() -> Option<String> {
    env::var(SVC_LABEL_ENVVAR).ok()
}

/// Computes a standard whoami string.
pub fn get_whoami_string(base: &str) -> String {
    match get_service_label_from_env() {
        Some(label) => format!("{base}%{label}"),
        None => base.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_config_otlp_url() {
        let mut config = LoggerConfig::new("coordinator".to_string());
        assert!(config.otlp_url().is_none());

        config.set_otlp_url("http://localhost:4317".to_string());
        assert_eq!(config.otlp_url(), Some("http://localhost:4317"));
        assert_eq!(config.whoami(), "coordinator");
    }
}
