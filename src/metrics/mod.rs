use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Order creation and failures per operation
// - Status transitions
// - Product validation round trips (latency, failures)
// - Circuit breaker state of the product client
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the service
pub struct Metrics {
    registry: Registry,

    // Order Metrics
    pub orders_created: IntCounter,
    pub order_failures: IntCounterVec,
    pub status_changes: IntCounterVec,

    // Product Validation Metrics
    pub product_validation_duration: HistogramVec,
    pub product_validation_failures: IntCounterVec,

    // Circuit Breaker Metrics
    pub circuit_breaker_state: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounter::new("orders_created_total", "Total orders created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let order_failures = IntCounterVec::new(
            Opts::new("order_failures_total", "Failed order operations"),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(order_failures.clone()))?;

        let status_changes = IntCounterVec::new(
            Opts::new("order_status_changes_total", "Persisted order status transitions"),
            &["from", "to"],
        )?;
        registry.register(Box::new(status_changes.clone()))?;

        let product_validation_duration = HistogramVec::new(
            HistogramOpts::new(
                "product_validation_duration_seconds",
                "Product validation round trip duration",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(product_validation_duration.clone()))?;

        let product_validation_failures = IntCounterVec::new(
            Opts::new("product_validation_failures_total", "Failed product validation round trips"),
            &["reason"],
        )?;
        registry.register(Box::new(product_validation_failures.clone()))?;

        let circuit_breaker_state = IntGauge::new(
            "circuit_breaker_state",
            "Product client circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            order_failures,
            status_changes,
            product_validation_duration,
            product_validation_failures,
            circuit_breaker_state,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_failure(&self, operation: &str, kind: &str) {
        self.order_failures.with_label_values(&[operation, kind]).inc();
    }

    pub fn record_status_change(&self, from: &str, to: &str) {
        self.status_changes.with_label_values(&[from, to]).inc();
    }

    pub fn record_validation(&self, duration_secs: f64, failure: Option<&str>) {
        let outcome = if failure.is_some() { "failure" } else { "success" };
        self.product_validation_duration
            .with_label_values(&[outcome])
            .observe(duration_secs);
        if let Some(reason) = failure {
            self.product_validation_failures.with_label_values(&[reason]).inc();
        }
    }

    pub fn update_circuit_breaker_state(&self, state: u8) {
        self.circuit_breaker_state.set(i64::from(state));
    }

    /// Render every registered metric in the Prometheus text format
    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_failure() {
        let metrics = Metrics::new().unwrap();
        metrics.record_failure("create", "upstream");
        metrics.record_failure("create", "upstream");
        metrics.record_failure("find_one", "not_found");

        let gathered = metrics.registry().gather();
        let failures = gathered.iter().find(|m| m.name() == "order_failures_total").unwrap();
        assert_eq!(failures.metric.len(), 2);
    }

    #[test]
    fn test_record_validation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_validation(0.02, None);
        metrics.record_validation(5.0, Some("timeout"));

        let gathered = metrics.registry().gather();
        let failures = gathered
            .iter()
            .find(|m| m.name() == "product_validation_failures_total")
            .unwrap();
        assert_eq!(failures.metric[0].counter.value, Some(1.0));
    }

    #[test]
    fn test_encode_text_format() {
        let metrics = Metrics::new().unwrap();
        metrics.orders_created.inc();
        metrics.update_circuit_breaker_state(1);

        let text = String::from_utf8(metrics.encode().unwrap()).unwrap();
        assert!(text.contains("orders_created_total 1"));
        assert!(text.contains("circuit_breaker_state 1"));
    }
}
