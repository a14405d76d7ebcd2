use {
    crate::domain::{
        error::StoreError,
        stores::{SubscriptionGrant, SubscriptionStatus, SubscriptionStore},
    },
    async_trait::async_trait,
    chrono::{DateTime, Duration, Utc},
    sqlx::PgPool,
    uuid::Uuid,
};

pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn activate_or_extend(
        &self,
        merchant_id: Uuid,
        plan_id: Uuid,
    ) -> Result<SubscriptionGrant, StoreError> {
        let mut tx = self.pool.begin().await?;

        let duration_days: i32 =
            sqlx::query_scalar("SELECT duration_days FROM plans WHERE id = $1")
                .bind(plan_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StoreError::NotFound)?;
        let duration = Duration::days(i64::from(duration_days));

        // Row lock covers the read-extend-write below; no outbound call is
        // made inside this transaction.
        let existing: Option<(Uuid, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, status, period_end FROM subscriptions \
             WHERE merchant_id = $1 AND plan_id = $2 \
             FOR UPDATE",
        )
        .bind(merchant_id)
        .bind(plan_id)
        .fetch_optional(&mut *tx)
        .await?;

        let now = Utc::now();
        let grant = match existing {
            // A running subscription stacks: the new period extends the
            // current period end, not now.
            Some((id, status, period_end)) if status == "active" && period_end > now => {
                let new_end = period_end + duration;
                sqlx::query(
                    "UPDATE subscriptions SET period_end = $1, updated_at = now() WHERE id = $2",
                )
                .bind(new_end)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                SubscriptionGrant {
                    subscription_id: id,
                    status: SubscriptionStatus::Active,
                    period_end: new_end,
                }
            }
            // Pending or lapsed: the new period starts now.
            Some((id, _, _)) => {
                let new_end = now + duration;
                sqlx::query(
                    "UPDATE subscriptions \
                     SET status = 'active', period_end = $1, updated_at = now() \
                     WHERE id = $2",
                )
                .bind(new_end)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                SubscriptionGrant {
                    subscription_id: id,
                    status: SubscriptionStatus::Active,
                    period_end: new_end,
                }
            }
            None => {
                let id = Uuid::now_v7();
                let new_end = now + duration;
                sqlx::query(
                    "INSERT INTO subscriptions \
                     (id, merchant_id, plan_id, status, period_end, created_at, updated_at) \
                     VALUES ($1, $2, $3, 'active', $4, now(), now())",
                )
                .bind(id)
                .bind(merchant_id)
                .bind(plan_id)
                .bind(new_end)
                .execute(&mut *tx)
                .await?;
                SubscriptionGrant {
                    subscription_id: id,
                    status: SubscriptionStatus::Active,
                    period_end: new_end,
                }
            }
        };

        tx.commit().await?;
        Ok(grant)
    }
}
