use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use rdkafka::Message;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::order::{Product, ProductId};
use crate::health::{ComponentHealth, HealthCheckable, HealthStatus};
use crate::metrics::Metrics;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};
use super::pending::PendingReplies;
use super::wire::{ReplyOutcome, ValidateProductsReply, ValidateProductsRequest};
use super::{ensure_complete, ProductClientError, ProductValidator};

// ============================================================================
// Product Client - request/reply over Redpanda
// ============================================================================
//
// 1. Register a waiter under a fresh correlation id
// 2. Publish the request (keyed by correlation id) to the request topic
// 3. The reply listener task consumes the reply topic and completes waiters
// 4. The caller waits at most `timeout`; expiry counts as an upstream failure
// 5. The waiter is removed when the caller finishes or is dropped
//
// Bus faults (send errors, timeouts) feed the circuit breaker. Business
// rejections from the product service do not.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct ProductClientConfig {
    pub brokers: String,
    pub request_topic: String,
    pub reply_topic: String,
    /// Consumer group of the reply listener; unique per instance so every
    /// instance sees the replies addressed to it
    pub group_id: String,
    pub timeout: Duration,
    pub circuit_breaker: CircuitBreakerConfig,
}

pub struct ProductClient {
    producer: FutureProducer,
    pending: Arc<PendingReplies>,
    circuit_breaker: CircuitBreaker,
    listener: Mutex<Option<JoinHandle<()>>>,
    metrics: Arc<Metrics>,
    config: ProductClientConfig,
}

impl ProductClient {
    /// Create the producer, subscribe to the reply topic and spawn the
    /// reply listener. Must be called inside a tokio runtime.
    pub fn start(config: ProductClientConfig, metrics: Arc<Metrics>) -> Result<Self, ProductClientError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("message.timeout.ms", config.timeout.as_millis().to_string())
            .create()
            .map_err(|e| ProductClientError::Transport(format!("producer: {e}")))?;

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "latest")
            .create()
            .map_err(|e| ProductClientError::Transport(format!("consumer: {e}")))?;

        consumer
            .subscribe(&[config.reply_topic.as_str()])
            .map_err(|e| ProductClientError::Transport(format!("subscribe: {e}")))?;

        let pending = Arc::new(PendingReplies::default());
        let listener = tokio::spawn(listen_for_replies(consumer, pending.clone()));

        tracing::info!(
            brokers = %config.brokers,
            request_topic = %config.request_topic,
            reply_topic = %config.reply_topic,
            "Product client started"
        );

        Ok(Self {
            producer,
            pending,
            circuit_breaker: CircuitBreaker::new(config.circuit_breaker.clone()),
            listener: Mutex::new(Some(listener)),
            metrics,
            config,
        })
    }

    /// Stop the reply listener and flush outstanding requests
    pub async fn shutdown(&self) {
        if let Some(listener) = self.listener.lock().await.take() {
            listener.abort();
        }
        if let Err(e) = self.producer.flush(Timeout::After(Duration::from_secs(5))) {
            tracing::warn!(error = %e, "Failed to flush product client producer");
        }
        tracing::info!("Product client stopped");
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    async fn round_trip(&self, ids: &[ProductId]) -> Result<ReplyOutcome, ProductClientError> {
        let correlation_id = Uuid::new_v4();
        let request = ValidateProductsRequest {
            correlation_id,
            reply_to: self.config.reply_topic.clone(),
            product_ids: ids.to_vec(),
        };
        let payload = serde_json::to_string(&request)?;
        let key = correlation_id.to_string();

        let mut waiter = self.pending.register(correlation_id);

        let record = FutureRecord::to(&self.config.request_topic)
            .key(&key)
            .payload(&payload);
        if let Err((e, _)) = self.producer.send(record, Timeout::After(self.config.timeout)).await {
            return Err(ProductClientError::Transport(e.to_string()));
        }

        tracing::debug!(%correlation_id, product_count = ids.len(), "Product validation requested");

        match tokio::time::timeout(self.config.timeout, waiter.reply()).await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(_)) => Err(ProductClientError::Closed),
            Err(_) => Err(ProductClientError::Timeout(self.config.timeout)),
        }
    }

    async fn validate(&self, ids: &[ProductId]) -> Result<Vec<Product>, ProductClientError> {
        let outcome = match self.circuit_breaker.call(self.round_trip(ids)).await {
            Ok(outcome) => outcome,
            Err(CircuitBreakerError::CircuitOpen) => return Err(ProductClientError::CircuitOpen),
            Err(CircuitBreakerError::OperationFailed(e)) => return Err(e),
        };

        match outcome {
            ReplyOutcome::Products { products } => ensure_complete(ids, products),
            ReplyOutcome::Error { error } => Err(ProductClientError::Rejected {
                status: error.status,
                message: error.message,
            }),
        }
    }
}

#[async_trait]
impl ProductValidator for ProductClient {
    async fn validate_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, ProductClientError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let result = self.validate(ids).await;
        let elapsed = started.elapsed().as_secs_f64();

        match &result {
            Ok(products) => {
                tracing::debug!(product_count = products.len(), elapsed, "Products validated");
                self.metrics.record_validation(elapsed, None);
            }
            Err(e) => {
                tracing::warn!(error = %e, ?ids, elapsed, "Product validation failed");
                self.metrics.record_validation(elapsed, Some(e.reason()));
            }
        }
        self.metrics
            .update_circuit_breaker_state(self.circuit_breaker.state().code());

        result
    }
}

#[async_trait]
impl HealthCheckable for ProductClient {
    fn component_name(&self) -> &str {
        "product_client"
    }

    async fn check_health(&self) -> ComponentHealth {
        let status = match self.circuit_state() {
            CircuitState::Closed => HealthStatus::Healthy,
            CircuitState::HalfOpen => HealthStatus::Degraded("circuit half-open".into()),
            CircuitState::Open => HealthStatus::Unhealthy("circuit open".into()),
        };

        ComponentHealth::new(self.component_name(), status)
            .with_details(format!("{} pending requests", self.pending.len()))
    }
}

async fn listen_for_replies(consumer: StreamConsumer, pending: Arc<PendingReplies>) {
    let mut stream = consumer.stream();

    while let Some(message) = stream.next().await {
        let reply = match message {
            Ok(message) => decode_reply(message.payload(), message.offset()),
            Err(e) => {
                tracing::warn!(error = %e, "Error receiving product reply");
                None
            }
        };

        if let Some(reply) = reply {
            let correlation_id = reply.correlation_id;
            if !pending.complete(reply) {
                tracing::debug!(%correlation_id, "No waiter for product reply, dropping");
            }
        }
    }

    tracing::info!("Product reply stream ended");
}

fn decode_reply(payload: Option<&[u8]>, offset: i64) -> Option<ValidateProductsReply> {
    let Some(payload) = payload else {
        tracing::debug!(offset, "Skipping empty product reply");
        return None;
    };

    match serde_json::from_slice(payload) {
        Ok(reply) => Some(reply),
        Err(e) => {
            tracing::warn!(error = %e, offset, "Malformed product reply");
            None
        }
    }
}
