// ============================================================================
// Messaging - Product Service over the message bus
// ============================================================================
//
// `ProductValidator` is the single capability the order service needs from
// the Product Service: resolve a set of product ids to product records, or
// fail if any of them is unknown.
//
// - product_client/ - Redpanda/Kafka request/reply implementation
// - pending/        - correlation id -> waiting request
// - wire/           - JSON payloads exchanged on the bus
//
// ============================================================================

mod pending;
mod product_client;
mod wire;

#[cfg(test)]
pub(crate) mod stub;

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::order::{Product, ProductId};

pub use product_client::{ProductClient, ProductClientConfig};

#[derive(Debug, thiserror::Error)]
pub enum ProductClientError {
    #[error("unknown products: {0:?}")]
    UnknownProducts(Vec<ProductId>),

    #[error("product service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("no reply from product service within {0:?}")]
    Timeout(Duration),

    #[error("product service unavailable (circuit open)")]
    CircuitOpen,

    #[error("message bus error: {0}")]
    Transport(String),

    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("reply channel closed")]
    Closed,
}

impl ProductClientError {
    /// Short label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            ProductClientError::UnknownProducts(_) => "unknown_products",
            ProductClientError::Rejected { .. } => "rejected",
            ProductClientError::Timeout(_) => "timeout",
            ProductClientError::CircuitOpen => "circuit_open",
            ProductClientError::Transport(_) => "transport",
            ProductClientError::Decode(_) => "decode",
            ProductClientError::Closed => "closed",
        }
    }
}

#[async_trait]
pub trait ProductValidator: Send + Sync {
    /// Resolve every id in `ids` or fail. Never returns a partial match.
    async fn validate_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, ProductClientError>;
}

/// Enforce the exact-match contract on a reply: every requested id must be
/// present; records nobody asked for are dropped.
pub fn ensure_complete(
    requested: &[ProductId],
    products: Vec<Product>,
) -> Result<Vec<Product>, ProductClientError> {
    let wanted: HashSet<ProductId> = requested.iter().copied().collect();
    let returned: HashSet<ProductId> = products.iter().map(|p| p.id).collect();

    let mut missing: Vec<ProductId> = wanted.difference(&returned).copied().collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(ProductClientError::UnknownProducts(missing));
    }

    Ok(products.into_iter().filter(|p| wanted.contains(&p.id)).collect())
}
