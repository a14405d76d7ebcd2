use {
    crate::domain::{
        error::StoreError,
        id::CustomerHandle,
        money::Amount,
        stores::{BalanceStore, WalletStore},
    },
    async_trait::async_trait,
    rust_decimal::Decimal,
    sqlx::PgPool,
    uuid::Uuid,
};

/// End-customer wallets. The credit is a single upsert so the read-add-write
/// never leaves the database.
pub struct PgWalletStore {
    pool: PgPool,
}

impl PgWalletStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletStore for PgWalletStore {
    async fn credit(
        &self,
        merchant_id: Uuid,
        customer: &CustomerHandle,
        amount: Amount,
    ) -> Result<Decimal, StoreError> {
        let balance: Decimal = sqlx::query_scalar(
            "INSERT INTO wallets (merchant_id, customer_handle, balance, updated_at) \
             VALUES ($1, $2, $3, now()) \
             ON CONFLICT (merchant_id, customer_handle) \
             DO UPDATE SET balance = wallets.balance + EXCLUDED.balance, updated_at = now() \
             RETURNING balance",
        )
        .bind(merchant_id)
        .bind(customer.as_str())
        .bind(amount.get())
        .fetch_one(&self.pool)
        .await?;
        Ok(balance)
    }
}

/// The merchant's own internal credit balance.
pub struct PgBalanceStore {
    pool: PgPool,
}

impl PgBalanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BalanceStore for PgBalanceStore {
    async fn increase(&self, merchant_id: Uuid, amount: Amount) -> Result<Decimal, StoreError> {
        let balance: Decimal = sqlx::query_scalar(
            "INSERT INTO merchant_balances (merchant_id, balance, updated_at) \
             VALUES ($1, $2, now()) \
             ON CONFLICT (merchant_id) \
             DO UPDATE SET balance = merchant_balances.balance + EXCLUDED.balance, \
                           updated_at = now() \
             RETURNING balance",
        )
        .bind(merchant_id)
        .bind(amount.get())
        .fetch_one(&self.pool)
        .await?;
        Ok(balance)
    }
}
