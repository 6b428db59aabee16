use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::order::{Product, ProductId};
use super::{ensure_complete, ProductClientError, ProductValidator};

/// Product service double backed by a fixed catalog.
#[derive(Default)]
pub(crate) struct StaticProducts {
    products: Mutex<HashMap<ProductId, Product>>,
    calls: AtomicUsize,
    offline: AtomicBool,
    reject_unknown: AtomicBool,
}

impl StaticProducts {
    pub fn with(products: &[(ProductId, &str, &str)]) -> Self {
        let stub = Self::default();
        for (id, name, price) in products {
            stub.insert(*id, name, price);
        }
        stub
    }

    pub fn insert(&self, id: ProductId, name: &str, price: &str) {
        let price: Decimal = price.parse().expect("valid decimal");
        self.products
            .lock()
            .unwrap()
            .insert(id, Product { id, name: name.to_string(), price });
    }

    pub fn remove(&self, id: ProductId) {
        self.products.lock().unwrap().remove(&id);
    }

    /// Simulate an unreachable product service
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Answer unknown ids with an error reply instead of a partial
    /// product list, as the real product service does
    pub fn reject_unknown(&self, reject: bool) {
        self.reject_unknown.store(reject, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductValidator for StaticProducts {
    async fn validate_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, ProductClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(ProductClientError::Transport("broker unreachable".into()));
        }

        let found: Vec<Product> = {
            let products = self.products.lock().unwrap();
            ids.iter().filter_map(|id| products.get(id).cloned()).collect()
        };
        if self.reject_unknown.load(Ordering::SeqCst) && found.len() < ids.len() {
            return Err(ProductClientError::Rejected {
                status: 400,
                message: "Some products were not found".into(),
            });
        }
        ensure_complete(ids, found)
    }
}
