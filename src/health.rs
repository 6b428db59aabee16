use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::persistence::OrderRepository;

// ============================================================================
// Health Check Abstractions
// ============================================================================
//
// Every external dependency (order store, product client) reports a
// `ComponentHealth`; `/health` aggregates them into a `SystemHealth`.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, HealthStatus::Unhealthy(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub last_check: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ComponentHealth {
    pub fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
            last_check: Utc::now(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[async_trait]
pub trait HealthCheckable: Send + Sync {
    fn component_name(&self) -> &str;

    async fn check_health(&self) -> ComponentHealth;
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    pub status: &'static str,
    pub service: &'static str,
    pub components: Vec<ComponentHealth>,
}

impl SystemHealth {
    /// "unhealthy" if any component is down, "degraded" if any is not fully healthy
    pub fn from_components(components: Vec<ComponentHealth>) -> Self {
        let status = if components.iter().any(|c| c.status.is_unhealthy()) {
            "unhealthy"
        } else if components.iter().all(|c| c.status.is_healthy()) {
            "healthy"
        } else {
            "degraded"
        };

        Self {
            status,
            service: "orders-ms",
            components,
        }
    }

    pub fn is_unhealthy(&self) -> bool {
        self.status == "unhealthy"
    }
}

pub async fn check_all(checks: &[Arc<dyn HealthCheckable>]) -> SystemHealth {
    let mut components = Vec::with_capacity(checks.len());
    for check in checks {
        components.push(check.check_health().await);
    }
    SystemHealth::from_components(components)
}

/// Health probe for whichever order store is configured
pub struct StoreHealth {
    repository: Arc<dyn OrderRepository>,
}

impl StoreHealth {
    pub fn new(repository: Arc<dyn OrderRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl HealthCheckable for StoreHealth {
    fn component_name(&self) -> &str {
        "order_store"
    }

    async fn check_health(&self) -> ComponentHealth {
        match self.repository.ping().await {
            Ok(()) => ComponentHealth::new(self.component_name(), HealthStatus::Healthy),
            Err(e) => {
                tracing::warn!(error = %e, "Order store health check failed");
                ComponentHealth::new(self.component_name(), HealthStatus::Unhealthy("store unreachable".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryOrderRepository;

    #[test]
    fn test_overall_status() {
        let healthy = ComponentHealth::new("a", HealthStatus::Healthy);
        let degraded = ComponentHealth::new("b", HealthStatus::Degraded("slow".into()));
        let down = ComponentHealth::new("c", HealthStatus::Unhealthy("down".into()));

        assert_eq!(SystemHealth::from_components(vec![healthy.clone()]).status, "healthy");
        assert_eq!(
            SystemHealth::from_components(vec![healthy.clone(), degraded.clone()]).status,
            "degraded"
        );
        let system = SystemHealth::from_components(vec![healthy, degraded, down]);
        assert!(system.is_unhealthy());
    }

    #[tokio::test]
    async fn test_store_health() {
        let store: Arc<dyn HealthCheckable> =
            Arc::new(StoreHealth::new(Arc::new(InMemoryOrderRepository::new())));
        let system = check_all(&[store]).await;

        assert_eq!(system.status, "healthy");
        assert_eq!(system.components[0].name, "order_store");
    }

    #[test]
    fn test_component_serialization() {
        let component = ComponentHealth::new("product_client", HealthStatus::Degraded("half-open".into()))
            .with_details("0 pending requests");
        let json = serde_json::to_value(&component).unwrap();
        assert_eq!(json["status"]["state"], "degraded");
        assert_eq!(json["status"]["reason"], "half-open");
        assert_eq!(json["details"], "0 pending requests");
    }
}
