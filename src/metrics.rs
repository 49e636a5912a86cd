// Prometheus counters for inbox operations

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::core::errors::InboxError;

/// Per-operation outcome counters exposed on `/metrics`
pub struct InboxMetrics {
    registry: Registry,
    operations: IntCounterVec,
}

impl InboxMetrics {
    pub fn new() -> Result<Self, InboxError> {
        let registry = Registry::new();
        let operations = IntCounterVec::new(
            Opts::new("inbox_operations_total", "Inbox operations by outcome"),
            &["operation", "outcome"],
        )
        .map_err(|e| InboxError::ConfigurationError(format!("Invalid metric definition: {}", e)))?;

        registry
            .register(Box::new(operations.clone()))
            .map_err(|e| InboxError::ConfigurationError(format!("Failed to register metrics: {}", e)))?;

        Ok(Self {
            registry,
            operations,
        })
    }

    /// Count one call of `operation`, labelled "ok" or by error kind
    pub fn record<T>(&self, operation: &str, result: &Result<T, InboxError>) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        self.operations.with_label_values(&[operation, outcome]).inc();
    }

    pub fn count(&self, operation: &str, outcome: &str) -> u64 {
        self.operations.with_label_values(&[operation, outcome]).get()
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String, InboxError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| InboxError::ConfigurationError(format!("Failed to encode metrics: {}", e)))?;
        String::from_utf8(buffer)
            .map_err(|e| InboxError::ConfigurationError(format!("Metrics are not UTF-8: {}", e)))
    }
}
