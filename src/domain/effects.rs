use {
    super::error::NotifyError,
    super::id::CustomerHandle,
    super::stores::{ChannelCredentials, SubscriptionGrant},
    async_trait::async_trait,
    rust_decimal::Decimal,
    serde_json::Value,
    uuid::Uuid,
};

/// What the side-effect dispatcher durably applied, per domain.
#[derive(Debug, Clone)]
pub enum SideEffectReceipt {
    WalletCredited { new_balance: Decimal },
    SubscriptionGranted(SubscriptionGrant),
    BalanceIncreased { new_balance: Decimal },
}

/// Best-effort actions collected while reconciling and drained only after
/// the durable side effect committed. Each drains independently of the
/// others.
#[derive(Debug, Clone)]
pub enum PostCommitEffect {
    Realtime {
        topic: String,
        payload: Value,
    },
    ChannelMessage {
        merchant_id: Uuid,
        recipient: CustomerHandle,
        template: String,
        variables: Value,
    },
    Notification {
        merchant_id: Uuid,
        payload: Value,
    },
    Email {
        to: String,
        subject: String,
        body: String,
    },
}

/// Realtime publish/subscribe fan-out to a merchant's connected dashboard
/// sessions. At-least-once, unordered, fire-and-forget.
#[async_trait]
pub trait RealtimeBus: Send + Sync {
    async fn publish(&self, topic: &str, payload: Value) -> Result<(), NotifyError>;
}

/// Outbound templated message on the merchant's bot messaging channel.
#[async_trait]
pub trait MessagingChannel: Send + Sync {
    async fn send_template(
        &self,
        credentials: &ChannelCredentials,
        recipient: &CustomerHandle,
        template: &str,
        variables: &Value,
    ) -> Result<(), NotifyError>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}
