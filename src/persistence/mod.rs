// ============================================================================
// Persistence - Order Store
// ============================================================================
//
// `OrderRepository` is the contract the order service depends on.
// Implementations:
// - postgres/  - sqlx backed store, Order + items written in one transaction
// - in_memory/ - process-local store for tests and local runs
//
// ============================================================================

mod in_memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus};
use crate::domain::pagination::PageRequest;

pub use in_memory::InMemoryOrderRepository;
pub use postgres::PgOrderRepository;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt order row: {0}")]
    Corrupt(String),

    #[error("order {0} already exists")]
    Duplicate(Uuid),
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist an order together with all of its items, or nothing at all.
    async fn create(&self, order: Order) -> Result<Order, PersistenceError>;

    async fn count(&self, status: Option<OrderStatus>) -> Result<u64, PersistenceError>;

    /// One page of orders ordered by `created_at`, then `id`.
    async fn find_page(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Vec<Order>, PersistenceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, PersistenceError>;

    /// Set `status` only if the order is still in `expected`.
    /// Returns `None` when no order matched.
    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> Result<Option<Order>, PersistenceError>;

    /// Cheap connectivity probe used by the health endpoint.
    async fn ping(&self) -> Result<(), PersistenceError>;
}
