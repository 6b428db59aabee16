use serde::Deserialize;
use uuid::Uuid;

use crate::domain::pagination::{PageRequest, DEFAULT_LIMIT, DEFAULT_PAGE};
use super::errors::OrderError;
use super::value_objects::{distinct_product_ids, OrderStatus, ProductId};

// ============================================================================
// Order Commands - Represent caller intent
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub items: Vec<CreateOrderItem>,
}

impl CreateOrder {
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        for item in &self.items {
            if item.quantity <= 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: item.product_id,
                    quantity: item.quantity,
                });
            }
        }

        Ok(())
    }

    pub fn product_ids(&self) -> Vec<ProductId> {
        distinct_product_ids(self.items.iter().map(|item| item.product_id))
    }
}

#[derive(Debug, Clone)]
pub struct ChangeOrderStatus {
    pub id: Uuid,
    pub status: OrderStatus,
}

/// Listing query: `page` and `limit` default to 1 and 10.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderPagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

fn default_page() -> u32 {
    DEFAULT_PAGE
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Default for OrderPagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            status: None,
        }
    }
}

impl OrderPagination {
    pub fn page_request(&self) -> Result<PageRequest, OrderError> {
        PageRequest::new(self.page, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: ProductId, quantity: i32) -> CreateOrderItem {
        CreateOrderItem { product_id, quantity }
    }

    #[test]
    fn test_create_order_rejects_empty_items() {
        let command = CreateOrder { items: vec![] };
        assert!(matches!(command.validate(), Err(OrderError::EmptyItems)));
    }

    #[test]
    fn test_create_order_rejects_non_positive_quantity() {
        let command = CreateOrder { items: vec![item(1, 2), item(2, 0)] };
        assert!(matches!(
            command.validate(),
            Err(OrderError::InvalidQuantity { product_id: 2, quantity: 0 })
        ));

        let command = CreateOrder { items: vec![item(3, -4)] };
        assert!(command.validate().is_err());
    }

    #[test]
    fn test_create_order_distinct_ids() {
        let command = CreateOrder { items: vec![item(5, 1), item(2, 1), item(5, 3)] };
        assert!(command.validate().is_ok());
        assert_eq!(command.product_ids(), vec![2, 5]);
    }

    #[test]
    fn test_create_order_deserializes_camel_case() {
        let command: CreateOrder =
            serde_json::from_str(r#"{"items":[{"productId":4,"quantity":2}]}"#).unwrap();
        assert_eq!(command.items[0].product_id, 4);
        assert_eq!(command.items[0].quantity, 2);
    }

    #[test]
    fn test_pagination_defaults() {
        let query: OrderPagination = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 10);
        assert!(query.status.is_none());

        let query: OrderPagination =
            serde_json::from_str(r#"{"page":2,"limit":5,"status":"paid"}"#).unwrap();
        assert_eq!(query.status, Some(OrderStatus::Paid));
        assert_eq!(query.page_request().unwrap().offset(), 5);
    }
}
