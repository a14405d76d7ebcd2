use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::error::ReconError;

/// The payment gateway's own identifier for a transaction. This is the
/// correlation key between an inbound notification and the record stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderPaymentId(String);

impl ProviderPaymentId {
    pub fn new(id: impl Into<String>) -> Result<Self, ReconError> {
        let id = id.into().trim().to_string();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(ReconError::Validation(format!(
                "provider payment id must be a non-empty token, got: {id:?}"
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Stable end-customer contact handle (a phone-like id on the messaging
/// channel). Scopes wallet balances together with the owning merchant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerHandle(String);

impl CustomerHandle {
    pub fn new(id: impl Into<String>) -> Result<Self, ReconError> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(ReconError::Validation(
                "customer handle must be non-empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
