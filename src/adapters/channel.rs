use {
    crate::domain::{
        effects::MessagingChannel,
        error::NotifyError,
        id::CustomerHandle,
        stores::ChannelCredentials,
    },
    async_trait::async_trait,
    serde_json::Value,
    std::time::Duration,
};

/// Outbound client for the bot messaging API. Per-merchant instance id and
/// token arrive with each send.
pub struct HttpMessagingChannel {
    http: reqwest::Client,
    api_base: String,
}

impl HttpMessagingChannel {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError(format!("channel client: {e}")))?;
        let api_base: String = api_base.into();
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MessagingChannel for HttpMessagingChannel {
    async fn send_template(
        &self,
        credentials: &ChannelCredentials,
        recipient: &CustomerHandle,
        template: &str,
        variables: &Value,
    ) -> Result<(), NotifyError> {
        let url = format!(
            "{}/instances/{}/messages",
            self.api_base, credentials.instance_id
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&credentials.api_token)
            .json(&serde_json::json!({
                "to": recipient.as_str(),
                "template": template,
                "variables": variables,
            }))
            .send()
            .await
            .map_err(|e| NotifyError(format!("channel transport: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError(format!(
                "channel API returned {status} for {recipient}"
            )));
        }
        Ok(())
    }
}
