use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus};
use crate::domain::pagination::PageRequest;
use super::{OrderRepository, PersistenceError};

/// Process-local order store. Orders vanish with the process.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<Uuid, Order>>,
    writes: AtomicUsize,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Number of successful create/update writes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn matches(order: &Order, status: Option<OrderStatus>) -> bool {
        status.is_none_or(|status| order.status == status)
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: Order) -> Result<Order, PersistenceError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(PersistenceError::Duplicate(order.id));
        }
        orders.insert(order.id, order.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(order)
    }

    async fn count(&self, status: Option<OrderStatus>) -> Result<u64, PersistenceError> {
        let orders = self.orders.read().await;
        Ok(orders.values().filter(|o| Self::matches(o, status)).count() as u64)
    }

    async fn find_page(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Vec<Order>, PersistenceError> {
        let orders = self.orders.read().await;
        let mut matching: Vec<&Order> = orders.values().filter(|o| Self::matches(o, status)).collect();
        matching.sort_by_key(|o| (o.created_at, o.id));

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .skip(offset)
            .take(page.limit() as usize)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, PersistenceError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> Result<Option<Order>, PersistenceError> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&id) {
            Some(order) if order.status == expected => {
                order.status = status;
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn ping(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}
