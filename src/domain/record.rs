use {
    super::id::{CustomerHandle, ProviderPaymentId},
    super::money::Amount,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::fmt,
    uuid::Uuid,
};

/// Which of the three record stores a payment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentDomain {
    CustomerCharge,
    PlanPayment,
    BalanceTopUp,
}

impl PaymentDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerCharge => "customer_charge",
            Self::PlanPayment => "plan_payment",
            Self::BalanceTopUp => "balance_top_up",
        }
    }
}

impl fmt::Display for PaymentDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Variant data carried by each store's rows.
#[derive(Debug, Clone)]
pub enum DomainDetails {
    CustomerCharge {
        customer: CustomerHandle,
        customer_name: Option<String>,
    },
    PlanPayment {
        plan_id: Uuid,
        subscription_id: Option<Uuid>,
    },
    BalanceTopUp,
}

/// A located payment row. Rows are created by checkout flows elsewhere in
/// the system and are never deleted; this engine only reads them and
/// rewrites their status fields.
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub public_id: String,
    pub merchant_id: Uuid,
    /// Sub-provider string as persisted at checkout time.
    pub provider: String,
    pub provider_payment_id: ProviderPaymentId,
    /// Free text, gateway-defined.
    pub status: String,
    pub status_detail: Option<String>,
    pub amount: Amount,
    pub currency: String,
    pub metadata: Value,
    pub raw_payload: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub details: DomainDetails,
}

impl PaymentRecord {
    pub fn domain(&self) -> PaymentDomain {
        match self.details {
            DomainDetails::CustomerCharge { .. } => PaymentDomain::CustomerCharge,
            DomainDetails::PlanPayment { .. } => PaymentDomain::PlanPayment,
            DomainDetails::BalanceTopUp => PaymentDomain::BalanceTopUp,
        }
    }
}

/// Raw payloads above this serialized size are replaced by a truncation
/// marker, keeping the stored row bounded no matter what the gateway
/// attaches to a payment.
pub const RAW_PAYLOAD_CAP: usize = 16 * 1024;

/// Freshly fetched status fields, upserted into the located row on every
/// delivery, transition or not.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: String,
    pub status_detail: Option<String>,
    pub raw: Value,
}

impl StatusUpdate {
    pub fn capped(status: String, status_detail: Option<String>, raw: Value) -> Self {
        Self {
            status,
            status_detail,
            raw: cap_raw_payload(raw),
        }
    }
}

pub fn cap_raw_payload(raw: Value) -> Value {
    let size = raw.to_string().len();
    if size <= RAW_PAYLOAD_CAP {
        return raw;
    }
    serde_json::json!({
        "truncated": true,
        "original_bytes": size,
        "id": small_field(&raw, "id"),
        "status": small_field(&raw, "status"),
    })
}

// Only scalar-sized fields may ride along on the marker, so the marker
// itself stays far below the cap.
fn small_field(raw: &Value, key: &str) -> Value {
    match raw.get(key) {
        Some(v) if v.to_string().len() <= 256 => v.clone(),
        _ => Value::Null,
    }
}
