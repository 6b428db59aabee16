use uuid::Uuid;

use crate::messaging::ProductClientError;
use crate::persistence::PersistenceError;
use super::value_objects::{OrderStatus, ProductId};

// ============================================================================
// Order Errors
// ============================================================================

/// Coarse classification used by the inbound boundary and by metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Upstream,
    Persistence,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Persistence => "persistence",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i32 },

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    #[error("Order totals are out of range")]
    MalformedTotals,

    #[error("Unknown products: {0:?}")]
    UnknownProducts(Vec<ProductId>),

    #[error("Products rejected: {0}")]
    ProductsRejected(String),

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order with id:{0} not found")]
    NotFound(Uuid),

    #[error("Order {0} was modified concurrently")]
    ConcurrentModification(Uuid),

    #[error("Products of order {order_id} are no longer available: {reason}")]
    ProductsUnavailable { order_id: Uuid, reason: String },

    #[error("Product validation failed: {0}")]
    Upstream(ProductClientError),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] PersistenceError),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::EmptyItems
            | OrderError::InvalidQuantity { .. }
            | OrderError::InvalidPagination(_)
            | OrderError::InvalidStatus(_)
            | OrderError::MalformedTotals
            | OrderError::UnknownProducts(_)
            | OrderError::ProductsRejected(_)
            | OrderError::InvalidTransition { .. } => ErrorKind::Validation,
            OrderError::NotFound(_) => ErrorKind::NotFound,
            OrderError::ConcurrentModification(_) => ErrorKind::Conflict,
            OrderError::ProductsUnavailable { .. } | OrderError::Upstream(_) => ErrorKind::Upstream,
            OrderError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

impl From<ProductClientError> for OrderError {
    fn from(err: ProductClientError) -> Self {
        match err {
            ProductClientError::UnknownProducts(ids) => OrderError::UnknownProducts(ids),
            ProductClientError::Rejected { message, .. } => OrderError::ProductsRejected(message),
            other => OrderError::Upstream(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_product_client_errors_are_classified() {
        let unknown: OrderError = ProductClientError::UnknownProducts(vec![7]).into();
        assert!(matches!(unknown, OrderError::UnknownProducts(ref ids) if ids == &vec![7]));
        assert_eq!(unknown.kind(), ErrorKind::Validation);

        let timeout: OrderError = ProductClientError::Timeout(Duration::from_secs(5)).into();
        assert_eq!(timeout.kind(), ErrorKind::Upstream);

        let rejected: OrderError = ProductClientError::Rejected {
            status: 400,
            message: "Some products were not found".into(),
        }
        .into();
        assert_eq!(rejected.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_not_found_message_names_the_order() {
        let id = Uuid::new_v4();
        let err = OrderError::NotFound(id);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), format!("Order with id:{id} not found"));
    }
}
