use {
    super::error::{GatewayError, ReconError},
    super::id::ProviderPaymentId,
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::fmt,
    uuid::Uuid,
};

/// Payment-method families offered by the gateway. Each carries its own
/// credential set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubProvider {
    Pix,
    CheckoutPro,
}

impl SubProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pix => "pix",
            Self::CheckoutPro => "checkout_pro",
        }
    }
}

impl fmt::Display for SubProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for SubProvider {
    type Error = ReconError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pix" => Ok(Self::Pix),
            "checkout_pro" => Ok(Self::CheckoutPro),
            other => Err(ReconError::Validation(format!(
                "unknown sub-provider: {other}"
            ))),
        }
    }
}

/// Which credential set a record resolves against. Customer charges use the
/// owning merchant's own gateway account; plan payments and balance top-ups
/// use the platform's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialScope {
    Merchant(Uuid),
    Platform,
}

/// Bearer credentials for the gateway's read API.
#[derive(Debug, Clone)]
pub struct GatewayCredentials {
    pub access_token: String,
    pub sub_provider: SubProvider,
}

/// Normalized result of the gateway's payment-detail read.
#[derive(Debug, Clone)]
pub struct FetchedPayment {
    pub provider_payment_id: String,
    pub status: String,
    pub status_detail: Option<String>,
    pub raw: Value,
}

/// The gateway's "get payment" read operation. The inbound notification is
/// only a hint; this read is the source of truth for the current status.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn fetch_payment(
        &self,
        credentials: &GatewayCredentials,
        id: &ProviderPaymentId,
    ) -> Result<FetchedPayment, GatewayError>;
}
