//! Observability & Logging Config

use std::time::Duration;

use clap::Args;

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Tracing and request timing settings.
#[derive(Debug, Args)]
pub struct ObservabilityConfig {
    /// Export request spans over OTLP.
    #[arg(long, env = "OTEL_ENABLED", default_value_t = false)]
    pub otel_enabled: bool,

    /// Continue traces started by the caller's `traceparent` header.
    #[arg(long, env = "OTEL_PARENT_PROPAGATION_ENABLED", default_value_t = false)]
    pub otel_parent_propagation_enabled: bool,

    /// Requests slower than this many milliseconds are logged at `warn`.
    #[arg(long, env = "SLOW_REQUEST_THRESHOLD_MS", default_value_t = 1_000_u64)]
    pub slow_request_threshold_ms: u64,

    /// Where and how spans are exported.
    #[command(flatten)]
    pub export: TraceExportConfig,

    /// Resource attributes attached to every span.
    #[command(flatten)]
    pub service: ServiceIdentity,
}

impl ObservabilityConfig {
    /// Parent propagation only applies while spans are exported.
    pub fn parent_propagation(&self) -> bool {
        self.otel_enabled && self.otel_parent_propagation_enabled
    }
}

/// OTLP exporter settings.
#[derive(Debug, Args)]
pub struct TraceExportConfig {
    /// OTLP gRPC collector endpoint.
    #[arg(
        long,
        env = "OTEL_EXPORTER_OTLP_ENDPOINT",
        default_value = "http://localhost:4317"
    )]
    pub otel_exporter_otlp_endpoint: String,

    /// Seconds before an export attempt is abandoned.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_TIMEOUT_SECONDS", default_value_t = 3_u64)]
    pub otel_exporter_otlp_timeout_seconds: u64,

    /// Fraction of root traces sampled.
    #[arg(long, env = "OTEL_TRACE_SAMPLE_RATIO", default_value_t = 1.0_f64)]
    pub otel_trace_sample_ratio: f64,
}

impl TraceExportConfig {
    /// Export timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.otel_exporter_otlp_timeout_seconds)
    }

    /// Sampling ratio in `[0.0, 1.0]`. NaN samples nothing.
    pub fn sample_ratio(&self) -> f64 {
        if self.otel_trace_sample_ratio.is_nan() {
            return 0.0;
        }

        self.otel_trace_sample_ratio.clamp(0.0, 1.0)
    }
}

/// How this deployment identifies itself to the collector.
#[derive(Debug, Args)]
pub struct ServiceIdentity {
    /// `service.name` resource attribute.
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "amoss-json")]
    pub otel_service_name: String,

    /// `service.version` resource attribute.
    #[arg(long, env = "OTEL_SERVICE_VERSION", default_value = env!("CARGO_PKG_VERSION"))]
    pub otel_service_version: String,

    /// `deployment.environment.name` resource attribute.
    #[arg(long, env = "OTEL_DEPLOYMENT_ENVIRONMENT", default_value = "development")]
    pub otel_deployment_environment: String,
}
