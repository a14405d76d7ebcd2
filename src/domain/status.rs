use {
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Classification of the gateway's free-text payment status. Total: an
/// unknown string lands in `Other` and is still persisted verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Approved,
    Pending,
    InProcess,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
    Other,
}

impl StatusClass {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "approved" => Self::Approved,
            "pending" => Self::Pending,
            "in_process" | "in_mediation" => Self::InProcess,
            "rejected" => Self::Rejected,
            "cancelled" => Self::Cancelled,
            "refunded" => Self::Refunded,
            "charged_back" => Self::ChargedBack,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Pending => "pending",
            Self::InProcess => "in_process",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::ChargedBack => "charged_back",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The entire idempotency contract of the engine: a side effect fires only
/// when the fetched status is the first `approved` this record has seen.
/// Any other combination, including an approved redelivery, is not a
/// transition.
pub fn approval_transition(previous: &str, fetched: &str) -> bool {
    StatusClass::parse(fetched) == StatusClass::Approved
        && StatusClass::parse(previous) != StatusClass::Approved
}
