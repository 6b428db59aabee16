use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::domain::order::{Order, OrderItem, OrderStatus};
use crate::domain::pagination::PageRequest;
use super::{OrderRepository, PersistenceError};

// ============================================================================
// Postgres Order Store
// ============================================================================
//
// Tables:
// - orders      - one row per order, status is the only mutable column
// - order_items - price snapshots, cascade-deleted with their order
//
// Product ids are plain BIGINTs: products live in another service, so there
// is no foreign key to enforce them.
//
// Money columns are unconstrained NUMERIC so prices and totals keep the exact
// value and scale they were computed with. Items keep their request order
// through `position`.
//
// ============================================================================

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS orders (
        id           UUID PRIMARY KEY,
        total_amount NUMERIC NOT NULL CHECK (total_amount >= 0),
        total_items  INTEGER NOT NULL CHECK (total_items >= 0),
        status       TEXT NOT NULL DEFAULT 'PENDING'
                     CHECK (status IN ('PENDING', 'PAID', 'DELIVERED', 'CANCELLED')),
        paid         BOOLEAN NOT NULL DEFAULT FALSE,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS order_items (
        id         UUID PRIMARY KEY,
        order_id   UUID NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
        product_id BIGINT NOT NULL,
        price      NUMERIC NOT NULL CHECK (price >= 0),
        quantity   INTEGER NOT NULL CHECK (quantity > 0),
        position   INTEGER NOT NULL,
        UNIQUE (order_id, position)
    )",
    "CREATE INDEX IF NOT EXISTS orders_status_created_idx ON orders (status, created_at, id)",
];

const ORDER_COLUMNS: &str = "id, total_amount, total_items, status, paid, created_at";
const ITEM_COLUMNS: &str = "order_id, product_id, price, quantity";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    total_amount: Decimal,
    total_items: i32,
    status: String,
    paid: bool,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: Uuid,
    product_id: i64,
    price: Decimal,
    quantity: i32,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, PersistenceError> {
        let status = self
            .status
            .parse::<OrderStatus>()
            .map_err(|_| PersistenceError::Corrupt(format!("order {} has status {:?}", self.id, self.status)))?;

        Ok(Order {
            id: self.id,
            total_amount: self.total_amount,
            total_items: self.total_items,
            status,
            paid: self.paid,
            created_at: self.created_at,
            items,
        })
    }
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            product_id: row.product_id,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, PersistenceError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;

        tracing::info!(max_connections, "Database connected");
        Ok(Self::new(pool))
    }

    /// Create tables and indexes when missing
    pub async fn init_schema(&self) -> Result<(), PersistenceError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!("Order schema ready");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }

    async fn load_items(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<OrderItem>>, PersistenceError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<OrderItemRow> = sqlx::query_as(
            &format!(
                "SELECT {ITEM_COLUMNS}
                 FROM order_items
                 WHERE order_id = ANY($1)
                 ORDER BY order_id, position"
            ),
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            items.entry(row.order_id).or_default().push(row.into());
        }
        Ok(items)
    }

    async fn assemble(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, PersistenceError> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut items = self.load_items(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_order(order_items)
            })
            .collect()
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create(&self, order: Order) -> Result<Order, PersistenceError> {
        let mut tx = self.pool.begin().await?;

        let row: OrderRow = sqlx::query_as(&format!(
            "INSERT INTO orders (id, total_amount, total_items, status, paid, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.id)
        .bind(order.total_amount)
        .bind(order.total_items)
        .bind(order.status.as_str())
        .bind(order.paid)
        .bind(order.created_at)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(order.items.len());
        for (position, item) in order.items.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| PersistenceError::Corrupt(format!("order {} has too many items", order.id)))?;

            let stored: OrderItemRow = sqlx::query_as(&format!(
                "INSERT INTO order_items (id, order_id, product_id, price, quantity, position)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING {ITEM_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(order.id)
            .bind(item.product_id)
            .bind(item.price)
            .bind(item.quantity)
            .bind(position)
            .fetch_one(&mut *tx)
            .await?;
            items.push(stored.into());
        }

        // Dropping `tx` on any early return above rolls everything back
        tx.commit().await?;

        tracing::debug!(order_id = %order.id, items = items.len(), "Order row and items committed");
        row.into_order(items)
    }

    async fn count(&self, status: Option<OrderStatus>) -> Result<u64, PersistenceError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE ($1::TEXT IS NULL OR status = $1)",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;

        u64::try_from(total).map_err(|_| PersistenceError::Corrupt(format!("negative count {total}")))
    }

    async fn find_page(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Vec<Order>, PersistenceError> {
        let offset = i64::try_from(page.offset())
            .map_err(|_| PersistenceError::Corrupt(format!("offset {} out of range", page.offset())))?;

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS}
             FROM orders
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at ASC, id ASC
             LIMIT $2 OFFSET $3"
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(i64::from(page.limit()))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        self.assemble(rows).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, PersistenceError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> Result<Option<Order>, PersistenceError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders SET status = $3
             WHERE id = $1 AND status = $2
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(expected.as_str())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn ping(&self) -> Result<(), PersistenceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
