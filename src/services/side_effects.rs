use crate::domain::{
    effects::SideEffectReceipt,
    error::ReconError,
    record::{DomainDetails, PaymentRecord},
    stores::{BalanceStore, PaymentStore, SubscriptionStore, WalletStore},
};

/// Runs the domain side effect for a freshly won approval claim. There is no
/// idempotency check here; callers must hold the claim, which is what makes
/// this run at most once per record lifetime.
pub async fn dispatch(
    record: &PaymentRecord,
    payments: &dyn PaymentStore,
    wallets: &dyn WalletStore,
    subscriptions: &dyn SubscriptionStore,
    balances: &dyn BalanceStore,
) -> Result<SideEffectReceipt, ReconError> {
    match &record.details {
        DomainDetails::CustomerCharge { customer, .. } => {
            let new_balance = wallets
                .credit(record.merchant_id, customer, record.amount)
                .await?;
            tracing::info!(
                public_id = %record.public_id,
                customer = %customer,
                amount = %record.amount,
                balance = %new_balance,
                "wallet credited"
            );
            Ok(SideEffectReceipt::WalletCredited { new_balance })
        }
        DomainDetails::PlanPayment { plan_id, .. } => {
            let grant = subscriptions
                .activate_or_extend(record.merchant_id, *plan_id)
                .await?;
            payments
                .attach_subscription(record.id, grant.subscription_id)
                .await?;
            tracing::info!(
                public_id = %record.public_id,
                subscription_id = %grant.subscription_id,
                period_end = %grant.period_end,
                "subscription granted"
            );
            Ok(SideEffectReceipt::SubscriptionGranted(grant))
        }
        DomainDetails::BalanceTopUp => {
            let new_balance = balances.increase(record.merchant_id, record.amount).await?;
            tracing::info!(
                public_id = %record.public_id,
                amount = %record.amount,
                balance = %new_balance,
                "merchant balance increased"
            );
            Ok(SideEffectReceipt::BalanceIncreased { new_balance })
        }
    }
}
