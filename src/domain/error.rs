use thiserror::Error;

/// Storage failures, typed by kind so callers branch on variants and never
/// on message text.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("stored row violates a domain invariant: {0}")]
    Corrupt(String),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A failed read against the payment gateway. Always a hard failure: the
/// delivery must be answered with a server error so the gateway redelivers.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("gateway returned {status} for payment {payment_id}")]
    Status { status: u16, payment_id: String },

    #[error("payload: {0}")]
    Payload(String),
}

/// Best-effort notification channel failure. Logged and swallowed, never
/// propagated past the emitter.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct NotifyError(pub String);

#[derive(Debug, Error)]
pub enum ReconError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("gateway: {0}")]
    Gateway(#[from] GatewayError),
}
