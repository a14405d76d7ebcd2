use {
    super::error::ReconError,
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Monetary amount as reported by the gateway. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, ReconError> {
        if value.is_sign_negative() {
            return Err(ReconError::Validation(format!(
                "amount cannot be negative, got: {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
