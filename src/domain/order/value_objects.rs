use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Identifier of a product owned by the Product Service.
pub type ProductId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Storage and wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| OrderError::InvalidStatus(s.to_string()))
    }
}

/// Accepts any casing, the same rule as `FromStr`, so query strings and
/// JSON bodies agree.
impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

/// One persisted line of an order. `price` is the snapshot taken at creation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub total_amount: Decimal,
    pub total_items: i32,
    pub status: OrderStatus,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Fresh pending order. The timestamp is truncated to microseconds so it
    /// survives a round trip through the database unchanged.
    pub fn new(total_amount: Decimal, total_items: i32, items: Vec<OrderItem>) -> Self {
        Self {
            id: Uuid::new_v4(),
            total_amount,
            total_items,
            status: OrderStatus::Pending,
            paid: false,
            created_at: Utc::now().trunc_subsecs(6),
            items,
        }
    }

    pub fn product_ids(&self) -> Vec<ProductId> {
        distinct_product_ids(self.items.iter().map(|item| item.product_id))
    }
}

/// Product record as returned by the Product Service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
}

/// Products from one validation round trip, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: HashMap<ProductId, Product>,
}

impl ProductCatalog {
    pub fn price(&self, id: ProductId) -> Result<Decimal, OrderError> {
        self.get(id).map(|product| product.price)
    }

    pub fn name(&self, id: ProductId) -> Result<&str, OrderError> {
        self.get(id).map(|product| product.name.as_str())
    }

    fn get(&self, id: ProductId) -> Result<&Product, OrderError> {
        self.products
            .get(&id)
            .ok_or_else(|| OrderError::UnknownProducts(vec![id]))
    }
}

impl From<Vec<Product>> for ProductCatalog {
    fn from(products: Vec<Product>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}

/// Sorted, de-duplicated product ids.
pub fn distinct_product_ids(ids: impl IntoIterator<Item = ProductId>) -> Vec<ProductId> {
    ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

// ============================================================================
// Enriched Views - product names attached for the caller, never stored
// ============================================================================

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub total_amount: Decimal,
    pub total_items: i32,
    pub status: OrderStatus,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

impl OrderView {
    /// Attach product names from `catalog`. Fails if any item's product is missing.
    pub fn enrich(order: Order, catalog: &ProductCatalog) -> Result<Self, OrderError> {
        let items = order
            .items
            .into_iter()
            .map(|item| {
                Ok(OrderItemView {
                    name: catalog.name(item.product_id)?.to_string(),
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price,
                })
            })
            .collect::<Result<Vec<_>, OrderError>>()?;

        Ok(Self {
            id: order.id,
            total_amount: order.total_amount,
            total_items: order.total_items,
            status: order.status,
            paid: order.paid,
            created_at: order.created_at,
            items,
        })
    }

    pub fn with_status(self, status: OrderStatus) -> Self {
        Self { status, ..self }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
