use crate::framework::DatabaseProcessor;
use crate::orders::{Order, OrderNote, OrderStatus};
use kanau::processor::Processor;
use rust_decimal::Decimal;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderRecord {
    pub order_id: String,
    pub status: String,
    pub total: Decimal,
    pub currency: String,
    pub customer_id: String,
    pub customer_email: String,
    pub transaction_id: Option<String>,
    pub paid_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<OrderRecord> for Order {
    fn from(record: OrderRecord) -> Self {
        Order {
            status: OrderStatus::from(record.status.as_str()),
            id: record.order_id,
            total: record.total,
            currency: record.currency,
            customer_id: record.customer_id,
            customer_email: record.customer_email,
            transaction_id: record.transaction_id,
            paid_at: record.paid_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderNoteRecord {
    pub id: i64,
    pub order_id: String,
    pub message: String,
    pub created_at: OffsetDateTime,
}

impl From<OrderNoteRecord> for OrderNote {
    fn from(record: OrderNoteRecord) -> Self {
        OrderNote {
            message: record.message,
            created_at: record.created_at,
        }
    }
}

const ORDER_COLUMNS: &str = "order_id, status, total, currency, customer_id, customer_email, \
     transaction_id, paid_at, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct GetOrderRecordById {
    pub order_id: String,
}

impl Processor<GetOrderRecordById> for DatabaseProcessor {
    type Output = Option<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderRecordById")]
    async fn process(
        &self,
        query: GetOrderRecordById,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1");
        sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(query.order_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Compare-and-set the status of an order and append `note` with it.
///
/// Only updates the row if its status is still `expected`; the note is
/// inserted by the same statement, so either both land or neither does.
/// Returns whether a row was updated.
pub struct UpdateOrderStatus {
    pub order_id: String,
    pub expected: String,
    pub next: String,
    pub note: String,
}

impl Processor<UpdateOrderStatus> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UpdateOrderStatus")]
    async fn process(&self, update: UpdateOrderStatus) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            WITH updated AS (
                UPDATE orders
                SET status = $3, updated_at = now()
                WHERE order_id = $1 AND status = $2
                RETURNING order_id
            )
            INSERT INTO order_notes (order_id, message)
            SELECT order_id, $4 FROM updated
            "#,
        )
        .bind(update.order_id)
        .bind(update.expected)
        .bind(update.next)
        .bind(update.note)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[derive(Debug, Clone)]
/// Like [`UpdateOrderStatus`], additionally recording the payment.
///
/// Keeps the stored transaction id when `transaction_id` is `None`.
pub struct MarkOrderPaid {
    pub order_id: String,
    pub expected: String,
    pub next: String,
    pub transaction_id: Option<String>,
    pub note: String,
}

impl Processor<MarkOrderPaid> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:MarkOrderPaid")]
    async fn process(&self, update: MarkOrderPaid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            WITH updated AS (
                UPDATE orders
                SET status = $3,
                    paid_at = now(),
                    transaction_id = COALESCE($4, transaction_id),
                    updated_at = now()
                WHERE order_id = $1 AND status = $2
                RETURNING order_id
            )
            INSERT INTO order_notes (order_id, message)
            SELECT order_id, $5 FROM updated
            "#,
        )
        .bind(update.order_id)
        .bind(update.expected)
        .bind(update.next)
        .bind(update.transaction_id)
        .bind(update.note)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[derive(Debug, Clone)]
pub struct SetOrderTransactionId {
    pub order_id: String,
    pub transaction_id: String,
}

impl Processor<SetOrderTransactionId> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:SetOrderTransactionId")]
    async fn process(&self, update: SetOrderTransactionId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE orders SET transaction_id = $2, updated_at = now() WHERE order_id = $1",
        )
        .bind(update.order_id)
        .bind(update.transaction_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
/// Append a note to an existing order.
///
/// Returns the number of inserted rows: 0 when the order does not exist.
pub struct AppendOrderNote {
    pub order_id: String,
    pub message: String,
}

impl Processor<AppendOrderNote> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:AppendOrderNote")]
    async fn process(&self, insert: AppendOrderNote) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO order_notes (order_id, message)
            SELECT $1, $2
            WHERE EXISTS (SELECT 1 FROM orders WHERE order_id = $1)
            "#,
        )
        .bind(insert.order_id)
        .bind(insert.message)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
pub struct ListOrderNotes {
    pub order_id: String,
}

impl Processor<ListOrderNotes> for DatabaseProcessor {
    type Output = Vec<OrderNoteRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListOrderNotes")]
    async fn process(&self, query: ListOrderNotes) -> Result<Vec<OrderNoteRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderNoteRecord>(
            r#"
            SELECT id, order_id, message, created_at
            FROM order_notes
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(query.order_id)
        .fetch_all(&self.pool)
        .await
    }
}
