use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::pagination::Paginated;
use crate::messaging::ProductValidator;
use crate::metrics::Metrics;
use crate::persistence::OrderRepository;

use super::commands::{ChangeOrderStatus, CreateOrder, CreateOrderItem, OrderPagination};
use super::errors::{ErrorKind, OrderError};
use super::transitions::TransitionPolicy;
use super::value_objects::{Order, OrderItem, OrderView, ProductCatalog, ProductId};

// ============================================================================
// Order Service
// ============================================================================
//
// Orchestrates: Command → Product validation → Order store → Enriched view
//
// Product prices and names always come from the product service at the time
// of the call; the store only keeps the price snapshot taken at creation.
//
// ============================================================================

pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductValidator>,
    policy: TransitionPolicy,
    metrics: Arc<Metrics>,
}

impl OrderService {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        products: Arc<dyn ProductValidator>,
        policy: TransitionPolicy,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            repository,
            products,
            policy,
            metrics,
        }
    }

    /// Validate the requested products, price every line from the catalog and
    /// persist the order with its items.
    pub async fn create(&self, command: CreateOrder) -> Result<OrderView, OrderError> {
        let result = self.try_create(command).await;
        self.observe("create", result)
    }

    pub async fn find_all(&self, query: OrderPagination) -> Result<Paginated<Order>, OrderError> {
        let result = self.try_find_all(query).await;
        self.observe("find_all", result)
    }

    pub async fn find_one(&self, id: Uuid) -> Result<OrderView, OrderError> {
        let result = self.try_find_one(id).await;
        self.observe("find_one", result)
    }

    /// Requests for the status the order already has return it unchanged
    /// without writing.
    pub async fn change_status(&self, command: ChangeOrderStatus) -> Result<OrderView, OrderError> {
        let result = self.try_change_status(command).await;
        self.observe("change_status", result)
    }

    async fn try_create(&self, command: CreateOrder) -> Result<OrderView, OrderError> {
        command.validate()?;

        let catalog = self.catalog(&command.product_ids()).await?;
        let (total_amount, total_items, items) = price_items(&command.items, &catalog)?;

        let order = self
            .repository
            .create(Order::new(total_amount, total_items, items))
            .await?;

        self.metrics.orders_created.inc();
        tracing::info!(
            order_id = %order.id,
            %total_amount,
            total_items,
            "Order created"
        );

        OrderView::enrich(order, &catalog)
    }

    async fn try_find_all(&self, query: OrderPagination) -> Result<Paginated<Order>, OrderError> {
        let page = query.page_request()?;

        let total = self.repository.count(query.status).await?;
        let data = self.repository.find_page(query.status, page).await?;

        Ok(Paginated::new(data, page.meta(total)))
    }

    async fn try_find_one(&self, id: Uuid) -> Result<OrderView, OrderError> {
        let order = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(OrderError::NotFound(id))?;

        let catalog = self
            .catalog(&order.product_ids())
            .await
            .map_err(|e| products_unavailable(id, e))?;

        OrderView::enrich(order, &catalog).map_err(|e| products_unavailable(id, e))
    }

    async fn try_change_status(&self, command: ChangeOrderStatus) -> Result<OrderView, OrderError> {
        let current = self.try_find_one(command.id).await?;
        if current.status == command.status {
            tracing::debug!(order_id = %command.id, status = %command.status, "Status unchanged");
            return Ok(current);
        }

        self.policy.check(current.status, command.status)?;

        let updated = self
            .repository
            .update_status(command.id, current.status, command.status)
            .await?
            .ok_or(OrderError::ConcurrentModification(command.id))?;

        self.metrics
            .record_status_change(current.status.as_str(), updated.status.as_str());
        tracing::info!(
            order_id = %command.id,
            from = %current.status,
            to = %updated.status,
            "Order status changed"
        );

        Ok(current.with_status(updated.status))
    }

    async fn catalog(&self, ids: &[ProductId]) -> Result<ProductCatalog, OrderError> {
        let products = self.products.validate_products(ids).await?;
        Ok(ProductCatalog::from(products))
    }

    fn observe<T>(&self, operation: &'static str, result: Result<T, OrderError>) -> Result<T, OrderError> {
        if let Err(e) = &result {
            let kind = e.kind();
            match kind {
                ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Conflict => {
                    tracing::warn!(operation, kind = kind.as_str(), error = %e, "Order request rejected");
                }
                ErrorKind::Upstream | ErrorKind::Persistence => {
                    tracing::error!(operation, kind = kind.as_str(), error = %e, "Order request failed");
                }
            }
            self.metrics.record_failure(operation, kind.as_str());
        }
        result
    }
}

/// Lines priced from the catalog plus `(total_amount, total_items)`.
fn price_items(
    lines: &[CreateOrderItem],
    catalog: &ProductCatalog,
) -> Result<(Decimal, i32, Vec<OrderItem>), OrderError> {
    let mut total_amount = Decimal::ZERO;
    let mut total_items: i32 = 0;
    let mut items = Vec::with_capacity(lines.len());

    for line in lines {
        let price = catalog.price(line.product_id)?;

        let subtotal = price
            .checked_mul(Decimal::from(line.quantity))
            .ok_or(OrderError::MalformedTotals)?;
        total_amount = total_amount
            .checked_add(subtotal)
            .ok_or(OrderError::MalformedTotals)?;
        total_items = total_items
            .checked_add(line.quantity)
            .ok_or(OrderError::MalformedTotals)?;

        items.push(OrderItem {
            product_id: line.product_id,
            quantity: line.quantity,
            price,
        });
    }

    Ok((total_amount, total_items, items))
}

/// A stored order whose products can no longer be resolved is an upstream
/// fault, not a bad request, whether the product service reports the
/// missing ids or rejects the request outright.
fn products_unavailable(order_id: Uuid, err: OrderError) -> OrderError {
    match err {
        OrderError::UnknownProducts(missing) => OrderError::ProductsUnavailable {
            order_id,
            reason: format!("unknown products {missing:?}"),
        },
        OrderError::ProductsRejected(message) => OrderError::ProductsUnavailable {
            order_id,
            reason: format!("rejected by product service: {message}"),
        },
        other => other,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
