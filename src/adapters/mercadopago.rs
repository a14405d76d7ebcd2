use {
    crate::domain::{
        error::GatewayError,
        gateway::{FetchedPayment, GatewayCredentials, PaymentGateway},
        id::ProviderPaymentId,
    },
    async_trait::async_trait,
    serde_json::Value,
    std::time::Duration,
};

pub const DEFAULT_API_BASE: &str = "https://api.mercadopago.com";

/// Read-side client for the gateway's payment-detail endpoint. One instance
/// serves every credential scope; the bearer token arrives per call.
pub struct MercadoPagoGateway {
    http: reqwest::Client,
    api_base: String,
}

impl MercadoPagoGateway {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let api_base: String = api_base.into();
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoGateway {
    async fn fetch_payment(
        &self,
        credentials: &GatewayCredentials,
        id: &ProviderPaymentId,
    ) -> Result<FetchedPayment, GatewayError> {
        let url = format!("{}/v1/payments/{}", self.api_base, id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&credentials.access_token)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let http_status = response.status();
        if !http_status.is_success() {
            return Err(GatewayError::Status {
                status: http_status.as_u16(),
                payment_id: id.as_str().to_string(),
            });
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Payload(e.to_string()))?;

        let status = raw
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Payload(format!("payment {id} has no status field")))?
            .to_string();
        let status_detail = raw
            .get("status_detail")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(FetchedPayment {
            provider_payment_id: id.as_str().to_string(),
            status,
            status_detail,
            raw,
        })
    }
}
