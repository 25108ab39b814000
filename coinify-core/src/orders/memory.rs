//! In-process order store, used by tests and local development.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{DeliveryKey, DeliveryLedger, Order, OrderNote, OrderStatus, OrderStore, StoreError};

/// [`OrderStore`] and [`DeliveryLedger`] backed by a single `RwLock`.
///
/// Cloning is cheap; clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    orders: HashMap<String, Order>,
    notes: HashMap<String, Vec<OrderNote>>,
    deliveries: HashSet<DeliveryKey>,
}

impl MemoryState {
    fn push_note(&mut self, order_id: &str, message: &str) {
        self.notes
            .entry(order_id.to_owned())
            .or_default()
            .push(OrderNote {
                message: message.to_owned(),
                created_at: OffsetDateTime::now_utc(),
            });
    }
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an order.
    pub async fn insert(&self, order: Order) {
        let mut state = self.inner.write().await;
        state.notes.entry(order.id.clone()).or_default();
        state.orders.insert(order.id.clone(), order);
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn find(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.inner.read().await.orders.get(order_id).cloned())
    }

    async fn transition_status(
        &self,
        order_id: &str,
        expected: &OrderStatus,
        next: &OrderStatus,
        note: &str,
    ) -> Result<bool, StoreError> {
        let mut state = self.inner.write().await;
        match state.orders.get_mut(order_id) {
            Some(order) if &order.status == expected => {
                order.status = next.clone();
                state.push_note(order_id, note);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_paid(
        &self,
        order_id: &str,
        expected: &OrderStatus,
        next: &OrderStatus,
        transaction_id: Option<&str>,
        note: &str,
    ) -> Result<bool, StoreError> {
        let mut state = self.inner.write().await;
        match state.orders.get_mut(order_id) {
            Some(order) if &order.status == expected => {
                order.status = next.clone();
                order.paid_at = Some(OffsetDateTime::now_utc());
                if let Some(id) = transaction_id {
                    order.transaction_id = Some(id.to_owned());
                }
                state.push_note(order_id, note);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn append_note(&self, order_id: &str, message: &str) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        if !state.orders.contains_key(order_id) {
            return Err(StoreError::OrderNotFound(order_id.to_owned()));
        }
        state.push_note(order_id, message);
        Ok(())
    }

    async fn notes(&self, order_id: &str) -> Result<Vec<OrderNote>, StoreError> {
        let state = self.inner.read().await;
        state
            .notes
            .get(order_id)
            .cloned()
            .ok_or_else(|| StoreError::OrderNotFound(order_id.to_owned()))
    }

    async fn set_transaction_id(
        &self,
        order_id: &str,
        transaction_id: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| StoreError::OrderNotFound(order_id.to_owned()))?;
        order.transaction_id = Some(transaction_id.to_owned());
        Ok(())
    }
}

#[async_trait]
impl DeliveryLedger for MemoryOrderStore {
    async fn claim(&self, key: &DeliveryKey, _event: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.deliveries.insert(key.clone()))
    }

    async fn release(&self, key: &DeliveryKey) -> Result<(), StoreError> {
        self.inner.write().await.deliveries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn order() -> Order {
        Order::pending("1001", Decimal::new(2500, 2), "USD", "7", "buyer@example.com")
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let store = MemoryOrderStore::new();
        store.insert(order()).await;

        assert!(
            store
                .transition_status("1001", &OrderStatus::Pending, &OrderStatus::Failed, "failed")
                .await
                .unwrap()
        );
        assert!(
            !store
                .transition_status(
                    "1001",
                    &OrderStatus::Pending,
                    &OrderStatus::Cancelled,
                    "cancelled"
                )
                .await
                .unwrap()
        );
        assert!(
            !store
                .transition_status("missing", &OrderStatus::Pending, &OrderStatus::Failed, "x")
                .await
                .unwrap()
        );
        let found = store.find("1001").await.unwrap().unwrap();
        assert_eq!(found.status, OrderStatus::Failed);
        // Only the applied transition left a note.
        let notes = store.notes("1001").await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].message, "failed");
    }

    #[tokio::test]
    async fn test_mark_paid_records_transaction() {
        let store = MemoryOrderStore::new();
        store.insert(order()).await;

        assert!(
            store
                .mark_paid(
                    "1001",
                    &OrderStatus::Pending,
                    &OrderStatus::Processing,
                    Some("pi_1"),
                    "paid"
                )
                .await
                .unwrap()
        );
        let found = store.find("1001").await.unwrap().unwrap();
        assert_eq!(found.status, OrderStatus::Processing);
        assert_eq!(found.transaction_id.as_deref(), Some("pi_1"));
        assert!(found.paid_at.is_some());
    }

    #[tokio::test]
    async fn test_notes_require_existing_order() {
        let store = MemoryOrderStore::new();
        store.insert(order()).await;
        store.append_note("1001", "first").await.unwrap();
        store.append_note("1001", "second").await.unwrap();

        let notes = store.notes("1001").await.unwrap();
        let messages: Vec<_> = notes.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, ["first", "second"]);

        assert!(matches!(
            store.append_note("missing", "x").await,
            Err(StoreError::OrderNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ledger_claims_once() {
        let store = MemoryOrderStore::new();
        let key = DeliveryKey {
            order_id: "1001".into(),
            fingerprint: "event:evt_1".into(),
        };
        assert!(store.claim(&key, "payment_complete").await.unwrap());
        assert!(!store.claim(&key, "payment_complete").await.unwrap());
        store.release(&key).await.unwrap();
        assert!(store.claim(&key, "payment_complete").await.unwrap());
    }
}
