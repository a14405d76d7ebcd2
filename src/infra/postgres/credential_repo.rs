use {
    crate::domain::{
        error::StoreError,
        gateway::{CredentialScope, GatewayCredentials, SubProvider},
        stores::{ChannelCredentials, CredentialStore},
    },
    async_trait::async_trait,
    sqlx::PgPool,
    uuid::Uuid,
};

/// Gateway and messaging-channel accounts. Platform-level gateway accounts
/// are rows with a NULL merchant_id.
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn gateway_credentials(
        &self,
        scope: CredentialScope,
        sub_provider: SubProvider,
    ) -> Result<Option<GatewayCredentials>, StoreError> {
        let access_token: Option<String> = match scope {
            CredentialScope::Merchant(merchant_id) => {
                sqlx::query_scalar(
                    "SELECT access_token FROM gateway_accounts \
                     WHERE merchant_id = $1 AND sub_provider = $2 AND active",
                )
                .bind(merchant_id)
                .bind(sub_provider.as_str())
                .fetch_optional(&self.pool)
                .await?
            }
            CredentialScope::Platform => {
                sqlx::query_scalar(
                    "SELECT access_token FROM gateway_accounts \
                     WHERE merchant_id IS NULL AND sub_provider = $1 AND active",
                )
                .bind(sub_provider.as_str())
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(access_token.map(|access_token| GatewayCredentials {
            access_token,
            sub_provider,
        }))
    }

    async fn channel_credentials(
        &self,
        merchant_id: Uuid,
    ) -> Result<Option<ChannelCredentials>, StoreError> {
        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT instance_id, api_token FROM channel_accounts \
             WHERE merchant_id = $1 AND active",
        )
        .bind(merchant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(instance_id, api_token)| ChannelCredentials {
            instance_id,
            api_token,
        }))
    }
}
