use {
    crate::domain::{
        error::{ReconError, StoreError},
        id::{CustomerHandle, ProviderPaymentId},
        money::Amount,
        record::{DomainDetails, PaymentDomain, PaymentRecord, StatusUpdate},
        stores::PaymentStore,
    },
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    rust_decimal::Decimal,
    serde_json::Value,
    sqlx::{FromRow, PgPool},
    uuid::Uuid,
};

pub struct PgPaymentStore {
    pool: PgPool,
}

impl PgPaymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn table(domain: PaymentDomain) -> &'static str {
    match domain {
        PaymentDomain::CustomerCharge => "customer_charges",
        PaymentDomain::PlanPayment => "plan_payments",
        PaymentDomain::BalanceTopUp => "balance_topups",
    }
}

const COMMON_COLUMNS: &str = "id, public_id, merchant_id, provider, provider_payment_id, \
     status, status_detail, amount, currency, metadata, raw_payload, created_at, updated_at";

#[derive(FromRow)]
struct ChargeRow {
    id: Uuid,
    public_id: String,
    merchant_id: Uuid,
    provider: String,
    provider_payment_id: String,
    status: String,
    status_detail: Option<String>,
    amount: Decimal,
    currency: String,
    metadata: Value,
    raw_payload: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    customer_handle: String,
    customer_name: Option<String>,
}

#[derive(FromRow)]
struct PlanPaymentRow {
    id: Uuid,
    public_id: String,
    merchant_id: Uuid,
    provider: String,
    provider_payment_id: String,
    status: String,
    status_detail: Option<String>,
    amount: Decimal,
    currency: String,
    metadata: Value,
    raw_payload: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    plan_id: Uuid,
    subscription_id: Option<Uuid>,
}

#[derive(FromRow)]
struct TopUpRow {
    id: Uuid,
    public_id: String,
    merchant_id: Uuid,
    provider: String,
    provider_payment_id: String,
    status: String,
    status_detail: Option<String>,
    amount: Decimal,
    currency: String,
    metadata: Value,
    raw_payload: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// Rows come back as free-form SQL values; re-validate on the way into the
// domain so a corrupt row surfaces as a typed error instead of a panic.
fn corrupt(e: ReconError) -> StoreError {
    StoreError::Corrupt(e.to_string())
}

#[allow(clippy::too_many_arguments)]
fn assemble(
    id: Uuid,
    public_id: String,
    merchant_id: Uuid,
    provider: String,
    provider_payment_id: String,
    status: String,
    status_detail: Option<String>,
    amount: Decimal,
    currency: String,
    metadata: Value,
    raw_payload: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    details: DomainDetails,
) -> Result<PaymentRecord, StoreError> {
    Ok(PaymentRecord {
        id,
        public_id,
        merchant_id,
        provider,
        provider_payment_id: ProviderPaymentId::new(provider_payment_id).map_err(corrupt)?,
        status,
        status_detail,
        amount: Amount::new(amount).map_err(corrupt)?,
        currency,
        metadata,
        raw_payload,
        created_at,
        updated_at,
        details,
    })
}

impl ChargeRow {
    fn into_record(self) -> Result<PaymentRecord, StoreError> {
        let customer = CustomerHandle::new(self.customer_handle).map_err(corrupt)?;
        assemble(
            self.id,
            self.public_id,
            self.merchant_id,
            self.provider,
            self.provider_payment_id,
            self.status,
            self.status_detail,
            self.amount,
            self.currency,
            self.metadata,
            self.raw_payload,
            self.created_at,
            self.updated_at,
            DomainDetails::CustomerCharge {
                customer,
                customer_name: self.customer_name,
            },
        )
    }
}

impl PlanPaymentRow {
    fn into_record(self) -> Result<PaymentRecord, StoreError> {
        assemble(
            self.id,
            self.public_id,
            self.merchant_id,
            self.provider,
            self.provider_payment_id,
            self.status,
            self.status_detail,
            self.amount,
            self.currency,
            self.metadata,
            self.raw_payload,
            self.created_at,
            self.updated_at,
            DomainDetails::PlanPayment {
                plan_id: self.plan_id,
                subscription_id: self.subscription_id,
            },
        )
    }
}

impl TopUpRow {
    fn into_record(self) -> Result<PaymentRecord, StoreError> {
        assemble(
            self.id,
            self.public_id,
            self.merchant_id,
            self.provider,
            self.provider_payment_id,
            self.status,
            self.status_detail,
            self.amount,
            self.currency,
            self.metadata,
            self.raw_payload,
            self.created_at,
            self.updated_at,
            DomainDetails::BalanceTopUp,
        )
    }
}

#[async_trait]
impl PaymentStore for PgPaymentStore {
    async fn locate(&self, id: &ProviderPaymentId) -> Result<Option<PaymentRecord>, StoreError> {
        // Fixed, deterministic search order across the three stores.
        let sql = format!(
            "SELECT {COMMON_COLUMNS}, customer_handle, customer_name \
             FROM customer_charges WHERE provider_payment_id = $1"
        );
        if let Some(row) = sqlx::query_as::<_, ChargeRow>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
        {
            return Ok(Some(row.into_record()?));
        }

        let sql = format!(
            "SELECT {COMMON_COLUMNS}, plan_id, subscription_id \
             FROM plan_payments WHERE provider_payment_id = $1"
        );
        if let Some(row) = sqlx::query_as::<_, PlanPaymentRow>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
        {
            return Ok(Some(row.into_record()?));
        }

        let sql =
            format!("SELECT {COMMON_COLUMNS} FROM balance_topups WHERE provider_payment_id = $1");
        if let Some(row) = sqlx::query_as::<_, TopUpRow>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
        {
            return Ok(Some(row.into_record()?));
        }

        Ok(None)
    }

    async fn claim_approval(
        &self,
        domain: PaymentDomain,
        record_id: Uuid,
        update: &StatusUpdate,
    ) -> Result<bool, StoreError> {
        // One conditional update is both the persist and the race guard:
        // exactly one concurrent delivery sees rows_affected = 1.
        let sql = format!(
            "UPDATE {} SET status = $1, status_detail = $2, raw_payload = $3, \
             updated_at = now() \
             WHERE id = $4 AND lower(status) <> 'approved'",
            table(domain)
        );
        let result = sqlx::query(&sql)
            .bind(&update.status)
            .bind(update.status_detail.as_deref())
            .bind(&update.raw)
            .bind(record_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn record_status(
        &self,
        domain: PaymentDomain,
        record_id: Uuid,
        update: &StatusUpdate,
    ) -> Result<(), StoreError> {
        let sql = format!(
            "UPDATE {} SET status = $1, status_detail = $2, raw_payload = $3, \
             updated_at = now() \
             WHERE id = $4",
            table(domain)
        );
        let result = sqlx::query(&sql)
            .bind(&update.status)
            .bind(update.status_detail.as_deref())
            .bind(&update.raw)
            .bind(record_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn attach_subscription(
        &self,
        record_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE plan_payments SET subscription_id = $1, updated_at = now() WHERE id = $2",
        )
        .bind(subscription_id)
        .bind(record_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
