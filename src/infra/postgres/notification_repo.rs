use {
    crate::domain::{error::StoreError, stores::NotificationStore},
    async_trait::async_trait,
    serde_json::Value,
    sqlx::PgPool,
    uuid::Uuid,
};

pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn create(&self, merchant_id: Uuid, payload: Value) -> Result<Uuid, StoreError> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO notifications (id, merchant_id, payload, created_at) \
             VALUES ($1, $2, $3, now())",
        )
        .bind(id)
        .bind(merchant_id)
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn recipient_email(&self, merchant_id: Uuid) -> Result<Option<String>, StoreError> {
        let email: Option<String> = sqlx::query_scalar("SELECT email FROM merchants WHERE id = $1")
            .bind(merchant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(email)
    }
}
