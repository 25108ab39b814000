use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

#[derive(Debug, Clone)]
/// Record a webhook delivery as processed.
///
/// Uses `ON CONFLICT DO NOTHING`; returns `true` only for the first claim
/// of a key.
pub struct ClaimWebhookDelivery {
    pub delivery_key: String,
    pub order_id: String,
    pub event: String,
}

impl Processor<ClaimWebhookDelivery> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ClaimWebhookDelivery")]
    async fn process(&self, claim: ClaimWebhookDelivery) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_deliveries (delivery_key, order_id, event)
            VALUES ($1, $2, $3)
            ON CONFLICT (delivery_key) DO NOTHING
            "#,
        )
        .bind(claim.delivery_key)
        .bind(claim.order_id)
        .bind(claim.event)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[derive(Debug, Clone)]
pub struct ReleaseWebhookDelivery {
    pub delivery_key: String,
}

impl Processor<ReleaseWebhookDelivery> for DatabaseProcessor {
    type Output = ();
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ReleaseWebhookDelivery")]
    async fn process(&self, release: ReleaseWebhookDelivery) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM webhook_deliveries WHERE delivery_key = $1")
            .bind(release.delivery_key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
