use {
    super::error::StoreError,
    super::gateway::{CredentialScope, GatewayCredentials, SubProvider},
    super::id::{CustomerHandle, ProviderPaymentId},
    super::money::Amount,
    super::record::{PaymentDomain, PaymentRecord, StatusUpdate},
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    rust_decimal::Decimal,
    serde::Serialize,
    serde_json::Value,
    std::fmt,
    uuid::Uuid,
};

/// The three record stores behind one seam.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Search customer charges, then plan payments, then balance top-ups;
    /// first hit wins. Domains are disjoint by construction, not by any
    /// enforced cross-store uniqueness.
    async fn locate(&self, id: &ProviderPaymentId) -> Result<Option<PaymentRecord>, StoreError>;

    /// Atomic check-and-set: persist `update` and flip the row to approved
    /// only if it is not already approved, reporting whether this call won
    /// the flip. This single conditional write is the whole defence against
    /// concurrent redelivery: exactly one caller per record lifetime sees
    /// `true`.
    async fn claim_approval(
        &self,
        domain: PaymentDomain,
        record_id: Uuid,
        update: &StatusUpdate,
    ) -> Result<bool, StoreError>;

    /// Unconditional upsert of the fetched status fields, bumping the row's
    /// updated timestamp. Runs for every delivery that did not win an
    /// approval claim, so non-approval movement stays visible to operators.
    async fn record_status(
        &self,
        domain: PaymentDomain,
        record_id: Uuid,
        update: &StatusUpdate,
    ) -> Result<(), StoreError>;

    /// Point a plan-payment row at the subscription it activated.
    async fn attach_subscription(
        &self,
        record_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<(), StoreError>;
}

/// End-customer wallet balances, keyed by (merchant, customer handle).
/// Debits happen in out-of-scope spend flows.
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Credit the wallet and return the new balance.
    async fn credit(
        &self,
        merchant_id: Uuid,
        customer: &CustomerHandle,
        amount: Amount,
    ) -> Result<Decimal, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of an activate-or-extend.
#[derive(Debug, Clone)]
pub struct SubscriptionGrant {
    pub subscription_id: Uuid,
    pub status: SubscriptionStatus,
    pub period_end: DateTime<Utc>,
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Activate the merchant's subscription to `plan_id`, or stack a renewal
    /// onto the existing period end when one is already active; back-to-back
    /// renewals extend rather than overlap.
    async fn activate_or_extend(
        &self,
        merchant_id: Uuid,
        plan_id: Uuid,
    ) -> Result<SubscriptionGrant, StoreError>;
}

/// The merchant's own internal credit balance, distinct from any end
/// customer's wallet.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    async fn increase(&self, merchant_id: Uuid, amount: Amount) -> Result<Decimal, StoreError>;
}

/// Credentials for a merchant's bot messaging channel.
#[derive(Debug, Clone)]
pub struct ChannelCredentials {
    pub instance_id: String,
    pub api_token: String,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Bearer credentials for the gateway read API. `None` when the account
    /// is absent or inactive; a configuration state, not an error.
    async fn gateway_credentials(
        &self,
        scope: CredentialScope,
        sub_provider: SubProvider,
    ) -> Result<Option<GatewayCredentials>, StoreError>;

    /// The merchant's messaging-channel credentials, if a channel is
    /// connected.
    async fn channel_credentials(
        &self,
        merchant_id: Uuid,
    ) -> Result<Option<ChannelCredentials>, StoreError>;
}

/// Persisted dashboard notifications plus recipient address lookup.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, merchant_id: Uuid, payload: Value) -> Result<Uuid, StoreError>;

    async fn recipient_email(&self, merchant_id: Uuid) -> Result<Option<String>, StoreError>;
}
