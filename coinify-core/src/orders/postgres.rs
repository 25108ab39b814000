//! PostgreSQL order store built on the query structs in
//! [`crate::entities`].

use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::PgPool;

use super::{DeliveryKey, DeliveryLedger, Order, OrderNote, OrderStatus, OrderStore, StoreError};
use crate::entities::order_records::{
    AppendOrderNote, GetOrderRecordById, ListOrderNotes, MarkOrderPaid, SetOrderTransactionId,
    UpdateOrderStatus,
};
use crate::entities::webhook_deliveries::{ClaimWebhookDelivery, ReleaseWebhookDelivery};
use crate::framework::DatabaseProcessor;

/// [`OrderStore`] and [`DeliveryLedger`] over the `orders`, `order_notes`
/// and `webhook_deliveries` tables.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    processor: DatabaseProcessor,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            processor: DatabaseProcessor { pool },
        }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn find(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
        let record = self
            .processor
            .process(GetOrderRecordById {
                order_id: order_id.to_owned(),
            })
            .await?;
        Ok(record.map(Order::from))
    }

    async fn transition_status(
        &self,
        order_id: &str,
        expected: &OrderStatus,
        next: &OrderStatus,
        note: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .processor
            .process(UpdateOrderStatus {
                order_id: order_id.to_owned(),
                expected: expected.as_str().to_owned(),
                next: next.as_str().to_owned(),
                note: note.to_owned(),
            })
            .await?)
    }

    async fn mark_paid(
        &self,
        order_id: &str,
        expected: &OrderStatus,
        next: &OrderStatus,
        transaction_id: Option<&str>,
        note: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .processor
            .process(MarkOrderPaid {
                order_id: order_id.to_owned(),
                expected: expected.as_str().to_owned(),
                next: next.as_str().to_owned(),
                transaction_id: transaction_id.map(str::to_owned),
                note: note.to_owned(),
            })
            .await?)
    }

    async fn append_note(&self, order_id: &str, message: &str) -> Result<(), StoreError> {
        let inserted = self
            .processor
            .process(AppendOrderNote {
                order_id: order_id.to_owned(),
                message: message.to_owned(),
            })
            .await?;
        if inserted == 0 {
            return Err(StoreError::OrderNotFound(order_id.to_owned()));
        }
        Ok(())
    }

    async fn notes(&self, order_id: &str) -> Result<Vec<OrderNote>, StoreError> {
        let records = self
            .processor
            .process(ListOrderNotes {
                order_id: order_id.to_owned(),
            })
            .await?;
        Ok(records.into_iter().map(OrderNote::from).collect())
    }

    async fn set_transaction_id(
        &self,
        order_id: &str,
        transaction_id: &str,
    ) -> Result<(), StoreError> {
        let updated = self
            .processor
            .process(SetOrderTransactionId {
                order_id: order_id.to_owned(),
                transaction_id: transaction_id.to_owned(),
            })
            .await?;
        if updated == 0 {
            return Err(StoreError::OrderNotFound(order_id.to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl DeliveryLedger for PgOrderStore {
    async fn claim(&self, key: &DeliveryKey, event: &str) -> Result<bool, StoreError> {
        Ok(self
            .processor
            .process(ClaimWebhookDelivery {
                delivery_key: key.to_string(),
                order_id: key.order_id.clone(),
                event: event.to_owned(),
            })
            .await?)
    }

    async fn release(&self, key: &DeliveryKey) -> Result<(), StoreError> {
        self.processor
            .process(ReleaseWebhookDelivery {
                delivery_key: key.to_string(),
            })
            .await?;
        Ok(())
    }
}
