use {
    crate::domain::{
        effects::{Mailer, MessagingChannel, PostCommitEffect, RealtimeBus, SideEffectReceipt},
        record::{DomainDetails, PaymentRecord},
        stores::{CredentialStore, NotificationStore},
    },
    serde_json::{Value, json},
    std::sync::Arc,
    uuid::Uuid,
};

pub const CHARGE_CONFIRMED_TEMPLATE: &str = "payment_confirmed";

/// Best-effort fan-out after a durable side effect. Effects are collected
/// into an explicit list first, then drained one by one; a failing channel
/// is logged and never disturbs its siblings, the applied ledger mutation,
/// or the acknowledgment returned to the gateway.
pub struct Notifier {
    bus: Arc<dyn RealtimeBus>,
    channel: Arc<dyn MessagingChannel>,
    notifications: Arc<dyn NotificationStore>,
    mailer: Arc<dyn Mailer>,
    credentials: Arc<dyn CredentialStore>,
    admin_emails: Vec<String>,
}

impl Notifier {
    pub fn new(
        bus: Arc<dyn RealtimeBus>,
        channel: Arc<dyn MessagingChannel>,
        notifications: Arc<dyn NotificationStore>,
        mailer: Arc<dyn Mailer>,
        credentials: Arc<dyn CredentialStore>,
        admin_emails: Vec<String>,
    ) -> Self {
        Self {
            bus,
            channel,
            notifications,
            mailer,
            credentials,
            admin_emails,
        }
    }

    pub async fn notify_applied(&self, record: &PaymentRecord, receipt: &SideEffectReceipt) {
        for effect in self.collect(record, receipt).await {
            self.drain_one(effect).await;
        }
    }

    async fn collect(
        &self,
        record: &PaymentRecord,
        receipt: &SideEffectReceipt,
    ) -> Vec<PostCommitEffect> {
        let mut effects = Vec::new();

        match (&record.details, receipt) {
            (
                DomainDetails::CustomerCharge {
                    customer,
                    customer_name,
                },
                SideEffectReceipt::WalletCredited { new_balance },
            ) => {
                let payload = json!({
                    "event": "charge.updated",
                    "public_id": record.public_id,
                    "customer": customer.as_str(),
                    "customer_name": customer_name,
                    "amount": record.amount.get(),
                    "currency": record.currency,
                    "new_balance": new_balance,
                    "status": "approved",
                });
                effects.push(PostCommitEffect::Realtime {
                    topic: merchant_topic(record.merchant_id),
                    payload: payload.clone(),
                });
                effects.push(PostCommitEffect::ChannelMessage {
                    merchant_id: record.merchant_id,
                    recipient: customer.clone(),
                    template: CHARGE_CONFIRMED_TEMPLATE.to_string(),
                    variables: json!({
                        "amount": record.amount.get(),
                        "currency": record.currency,
                        "balance": new_balance,
                    }),
                });
                effects.push(PostCommitEffect::Notification {
                    merchant_id: record.merchant_id,
                    payload: payload.clone(),
                });
                if let Some(to) = self.lookup_email(record.merchant_id).await {
                    effects.push(PostCommitEffect::Email {
                        to,
                        subject: format!("Payment approved: {}", record.public_id),
                        body: format!(
                            "Charge {} for {} {} from {} was approved. Wallet balance is now {}.",
                            record.public_id,
                            record.amount,
                            record.currency,
                            customer,
                            new_balance,
                        ),
                    });
                }
            }
            (
                DomainDetails::PlanPayment { plan_id, .. },
                SideEffectReceipt::SubscriptionGranted(grant),
            ) => {
                let payload = json!({
                    "event": "subscription.granted",
                    "public_id": record.public_id,
                    "plan_id": plan_id,
                    "subscription_id": grant.subscription_id,
                    "subscription_status": grant.status,
                    "period_end": grant.period_end,
                    "amount": record.amount.get(),
                    "currency": record.currency,
                });
                let body = format!(
                    "Plan payment {} was approved; subscription {} is {} until {}.",
                    record.public_id, grant.subscription_id, grant.status, grant.period_end,
                );
                self.notify_merchant_and_admins(record, payload, body, &mut effects)
                    .await;
            }
            (DomainDetails::BalanceTopUp, SideEffectReceipt::BalanceIncreased { new_balance }) => {
                let payload = json!({
                    "event": "balance.topped_up",
                    "public_id": record.public_id,
                    "amount": record.amount.get(),
                    "currency": record.currency,
                    "new_balance": new_balance,
                });
                let body = format!(
                    "Top-up {} for {} {} was approved; balance is now {}.",
                    record.public_id, record.amount, record.currency, new_balance,
                );
                self.notify_merchant_and_admins(record, payload, body, &mut effects)
                    .await;
            }
            _ => {
                // Unreachable as long as the dispatcher stays exhaustive per
                // domain; skip rather than guess at a payload.
                tracing::error!(
                    public_id = %record.public_id,
                    "side-effect receipt does not match record domain, skipping notifications"
                );
            }
        }

        effects
    }

    async fn notify_merchant_and_admins(
        &self,
        record: &PaymentRecord,
        payload: Value,
        body: String,
        effects: &mut Vec<PostCommitEffect>,
    ) {
        effects.push(PostCommitEffect::Notification {
            merchant_id: record.merchant_id,
            payload,
        });
        let subject = format!("Payment approved: {}", record.public_id);
        if let Some(to) = self.lookup_email(record.merchant_id).await {
            effects.push(PostCommitEffect::Email {
                to,
                subject: subject.clone(),
                body: body.clone(),
            });
        }
        for admin in &self.admin_emails {
            effects.push(PostCommitEffect::Email {
                to: admin.clone(),
                subject: subject.clone(),
                body: body.clone(),
            });
        }
    }

    async fn drain_one(&self, effect: PostCommitEffect) {
        match effect {
            PostCommitEffect::Realtime { topic, payload } => {
                if let Err(e) = self.bus.publish(&topic, payload).await {
                    tracing::error!(topic = %topic, error = %e, "realtime publish failed");
                }
            }
            PostCommitEffect::ChannelMessage {
                merchant_id,
                recipient,
                template,
                variables,
            } => match self.credentials.channel_credentials(merchant_id).await {
                Ok(Some(creds)) => {
                    if let Err(e) = self
                        .channel
                        .send_template(&creds, &recipient, &template, &variables)
                        .await
                    {
                        tracing::error!(
                            recipient = %recipient,
                            error = %e,
                            "outbound confirmation message failed"
                        );
                    }
                }
                Ok(None) => {
                    tracing::debug!(
                        merchant_id = %merchant_id,
                        "no messaging channel connected, skipping confirmation"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        merchant_id = %merchant_id,
                        error = %e,
                        "channel credential lookup failed"
                    );
                }
            },
            PostCommitEffect::Notification {
                merchant_id,
                payload,
            } => {
                if let Err(e) = self.notifications.create(merchant_id, payload).await {
                    tracing::error!(
                        merchant_id = %merchant_id,
                        error = %e,
                        "notification insert failed"
                    );
                }
            }
            PostCommitEffect::Email { to, subject, body } => {
                if let Err(e) = self.mailer.send(&to, &subject, &body).await {
                    tracing::error!(to = %to, error = %e, "email delivery failed");
                }
            }
        }
    }

    async fn lookup_email(&self, merchant_id: Uuid) -> Option<String> {
        match self.notifications.recipient_email(merchant_id).await {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(
                    merchant_id = %merchant_id,
                    error = %e,
                    "recipient email lookup failed"
                );
                None
            }
        }
    }
}

pub fn merchant_topic(merchant_id: Uuid) -> String {
    format!("merchant:{merchant_id}")
}
