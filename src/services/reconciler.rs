use {
    crate::domain::{
        effects::SideEffectReceipt,
        error::ReconError,
        gateway::{CredentialScope, PaymentGateway, SubProvider},
        id::ProviderPaymentId,
        record::{PaymentDomain, StatusUpdate},
        status::approval_transition,
        stores::{
            BalanceStore, CredentialStore, PaymentStore, SubscriptionStore, WalletStore,
        },
    },
    crate::services::notifier::Notifier,
    crate::services::side_effects,
    std::sync::Arc,
};

/// Why a delivery was acknowledged without reconciling anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No record in any store references this gateway payment id. Expected
    /// for event classes outside this engine (disputes, unmodeled refunds).
    UnknownPayment,
    /// The record's persisted sub-provider string is not one this engine
    /// speaks.
    UnsupportedProvider(String),
    /// No active credentials for the resolution scope. Retries cannot fix
    /// configuration, so this acknowledges instead of erroring.
    MissingCredentials,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownPayment => "unknown_payment",
            Self::UnsupportedProvider(_) => "unsupported_provider",
            Self::MissingCredentials => "missing_credentials",
        }
    }
}

/// What one delivery did.
#[derive(Debug)]
pub enum ReconOutcome {
    /// Acknowledged without touching any record.
    Ignored(IgnoreReason),
    /// First approval for this record: the domain side effect ran.
    Applied {
        domain: PaymentDomain,
        receipt: SideEffectReceipt,
    },
    /// Status fields re-persisted; no transition.
    Recorded { domain: PaymentDomain, status: String },
}

pub struct ReconcilerDeps {
    pub payments: Arc<dyn PaymentStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub wallets: Arc<dyn WalletStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub balances: Arc<dyn BalanceStore>,
    pub notifier: Notifier,
}

/// Reconciles one gateway notification at a time: locate the record, resolve
/// credentials, re-fetch the payment from the gateway, persist its status,
/// and apply the domain side effect exactly once on a genuine approval
/// transition. Stateless across deliveries; concurrent redelivery is closed
/// by the store's conditional claim, not by any serialization here.
pub struct Reconciler {
    payments: Arc<dyn PaymentStore>,
    credentials: Arc<dyn CredentialStore>,
    gateway: Arc<dyn PaymentGateway>,
    wallets: Arc<dyn WalletStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    balances: Arc<dyn BalanceStore>,
    notifier: Notifier,
}

impl Reconciler {
    pub fn new(deps: ReconcilerDeps) -> Self {
        Self {
            payments: deps.payments,
            credentials: deps.credentials,
            gateway: deps.gateway,
            wallets: deps.wallets,
            subscriptions: deps.subscriptions,
            balances: deps.balances,
            notifier: deps.notifier,
        }
    }

    pub async fn process(&self, id: &ProviderPaymentId) -> Result<ReconOutcome, ReconError> {
        let Some(record) = self.payments.locate(id).await? else {
            tracing::info!(
                provider_payment_id = %id,
                "no record matches notification, acknowledging"
            );
            return Ok(ReconOutcome::Ignored(IgnoreReason::UnknownPayment));
        };
        let domain = record.domain();

        let sub_provider = match SubProvider::try_from(record.provider.as_str()) {
            Ok(p) => p,
            Err(_) => {
                tracing::warn!(
                    provider_payment_id = %id,
                    provider = %record.provider,
                    "record carries an unsupported sub-provider, acknowledging"
                );
                return Ok(ReconOutcome::Ignored(IgnoreReason::UnsupportedProvider(
                    record.provider.clone(),
                )));
            }
        };

        let scope = match domain {
            PaymentDomain::CustomerCharge => CredentialScope::Merchant(record.merchant_id),
            PaymentDomain::PlanPayment | PaymentDomain::BalanceTopUp => CredentialScope::Platform,
        };
        let Some(credentials) = self
            .credentials
            .gateway_credentials(scope, sub_provider)
            .await?
        else {
            tracing::warn!(
                provider_payment_id = %id,
                domain = %domain,
                sub_provider = %sub_provider,
                "no active gateway credentials for scope, acknowledging"
            );
            return Ok(ReconOutcome::Ignored(IgnoreReason::MissingCredentials));
        };

        // Hard failures from here on must propagate so the gateway retries.
        let fetched = self.gateway.fetch_payment(&credentials, id).await?;
        let update = StatusUpdate::capped(
            fetched.status.clone(),
            fetched.status_detail.clone(),
            fetched.raw,
        );

        if approval_transition(&record.status, &fetched.status)
            && self
                .payments
                .claim_approval(domain, record.id, &update)
                .await?
        {
            let receipt = side_effects::dispatch(
                &record,
                &*self.payments,
                &*self.wallets,
                &*self.subscriptions,
                &*self.balances,
            )
            .await?;
            tracing::info!(
                provider_payment_id = %id,
                domain = %domain,
                public_id = %record.public_id,
                "approval transition applied"
            );
            self.notifier.notify_applied(&record, &receipt).await;
            Ok(ReconOutcome::Applied { domain, receipt })
        } else {
            self.payments
                .record_status(domain, record.id, &update)
                .await?;
            tracing::info!(
                provider_payment_id = %id,
                domain = %domain,
                status = %update.status,
                "status recorded, no transition"
            );
            Ok(ReconOutcome::Recorded {
                domain,
                status: update.status,
            })
        }
    }
}
