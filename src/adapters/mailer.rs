use {
    crate::domain::{effects::Mailer, error::NotifyError},
    async_trait::async_trait,
    std::time::Duration,
};

/// Client for the transactional-mail HTTP API.
pub struct HttpMailer {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError(format!("mail client: {e}")))?;
        let api_base: String = api_base.into();
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            from: from.into(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let url = format!("{}/send", self.api_base);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "text": body,
            }))
            .send()
            .await
            .map_err(|e| NotifyError(format!("mail transport: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError(format!("mail API returned {status} for {to}")));
        }
        Ok(())
    }
}
