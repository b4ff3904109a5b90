//! Order persistence interface and the in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use thiserror::Error;
use tokio::sync::RwLock;

use super::{Order, OrderStatus};

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum OrderStoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The storage backend failed.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Storage interface for orders.
///
/// `insert` is all-or-nothing: either the order and every one of its items
/// become durable together, or nothing from the attempt is ever visible.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order together with all its items.
    async fn insert(&self, order: &Order) -> Result<(), OrderStoreError>;

    /// Loads an order by ID.
    async fn get(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Persists a status change.
    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), OrderStoreError>;

    /// Persists the stock-applied guard flag.
    async fn set_stock_applied(&self, id: OrderId, applied: bool) -> Result<(), OrderStoreError>;

    /// Returns the most recent guest orders with the given name, newest
    /// first, up to `limit`.
    async fn recent_guest_orders(
        &self,
        name: &str,
        limit: usize,
    ) -> Result<Vec<Order>, OrderStoreError>;
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    orders: Vec<Order>,
    fail_after_items: Option<usize>,
}

/// In-memory order store implementation for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to fail any insert carrying more than `n` items,
    /// simulating a fault partway through persisting the line items.
    pub async fn set_fail_after_items(&self, n: Option<usize>) {
        self.state.write().await.fail_after_items = n;
    }

    /// Returns the number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), OrderStoreError> {
        let mut state = self.state.write().await;

        if let Some(n) = state.fail_after_items
            && order.items().len() > n
        {
            // Nothing was staged, so the failed attempt leaves no trace.
            return Err(OrderStoreError::Backend(format!(
                "injected fault after {n} items"
            )));
        }

        state.orders.push(order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id() == id).cloned())
    }

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), OrderStoreError> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id() == id)
            .ok_or(OrderStoreError::NotFound(id))?;
        order.set_status(status);
        Ok(())
    }

    async fn set_stock_applied(&self, id: OrderId, applied: bool) -> Result<(), OrderStoreError> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id() == id)
            .ok_or(OrderStoreError::NotFound(id))?;
        order.set_stock_applied(applied);
        Ok(())
    }

    async fn recent_guest_orders(
        &self,
        name: &str,
        limit: usize,
    ) -> Result<Vec<Order>, OrderStoreError> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|o| o.guest_name() == Some(name))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::GuestContact;
    use crate::order::{Buyer, OrderItem};
    use common::{Money, UserId};

    fn guest_order(name: &str) -> Order {
        Order::new(
            Buyer::Guest(GuestContact {
                name: name.to_string(),
                phone: "010-0000-0000".to_string(),
                email: "guest@example.com".to_string(),
                password_hash: "hash".to_string(),
            }),
            "",
            vec![OrderItem::new(None, "Mirror", Some(Money::new(1000)), 1)],
        )
    }

    #[tokio::test]
    async fn insert_then_get() {
        let store = InMemoryOrderStore::new();
        let order = guest_order("Kim");

        store.insert(&order).await.unwrap();
        let loaded = store.get(order.id()).await.unwrap().unwrap();
        assert_eq!(loaded.id(), order.id());
        assert_eq!(loaded.items().len(), 1);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = InMemoryOrderStore::new();
        assert!(store.get(OrderId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_status_persists() {
        let store = InMemoryOrderStore::new();
        let order = guest_order("Kim");
        store.insert(&order).await.unwrap();

        store
            .set_status(order.id(), OrderStatus::Confirmed)
            .await
            .unwrap();
        let loaded = store.get(order.id()).await.unwrap().unwrap();
        assert_eq!(loaded.status(), OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn set_status_on_missing_order_fails() {
        let store = InMemoryOrderStore::new();
        let result = store.set_status(OrderId::new(), OrderStatus::Confirmed).await;
        assert!(matches!(result, Err(OrderStoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn injected_fault_leaves_nothing_visible() {
        let store = InMemoryOrderStore::new();
        store.set_fail_after_items(Some(0)).await;

        let result = store.insert(&guest_order("Kim")).await;
        assert!(matches!(result, Err(OrderStoreError::Backend(_))));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn recent_guest_orders_filters_and_orders_newest_first() {
        let store = InMemoryOrderStore::new();
        let first = guest_order("Kim");
        let second = guest_order("Kim");
        let other = guest_order("Lee");
        let member = Order::new(Buyer::Member(UserId::new()), "", vec![]);

        for order in [&first, &second, &other, &member] {
            store.insert(order).await.unwrap();
        }

        let found = store.recent_guest_orders("Kim", 20).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id(), second.id());
        assert_eq!(found[1].id(), first.id());

        let limited = store.recent_guest_orders("Kim", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id(), second.id());
    }
}
