#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use pay_sync::domain::effects::{Mailer, MessagingChannel, RealtimeBus};
use pay_sync::domain::error::{GatewayError, NotifyError, StoreError};
use pay_sync::domain::gateway::{
    CredentialScope, FetchedPayment, GatewayCredentials, PaymentGateway, SubProvider,
};
use pay_sync::domain::id::{CustomerHandle, ProviderPaymentId};
use pay_sync::domain::money::Amount;
use pay_sync::domain::record::{DomainDetails, PaymentDomain, PaymentRecord, StatusUpdate};
use pay_sync::domain::status::StatusClass;
use pay_sync::domain::stores::{
    BalanceStore, ChannelCredentials, CredentialStore, NotificationStore, PaymentStore,
    SubscriptionGrant, SubscriptionStatus, SubscriptionStore, WalletStore,
};
use pay_sync::services::notifier::Notifier;
use pay_sync::services::reconciler::{Reconciler, ReconcilerDeps};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub const MERCHANT_EMAIL: &str = "merchant@example.com";
pub const ADMIN_EMAIL: &str = "ops@example.com";

// ── In-memory backend ──────────────────────────────────────────────────────
// One mutex over the whole state: claim_approval's compare-and-set is atomic
// under the lock, mirroring the SQL conditional update.

struct SubscriptionRow {
    id: Uuid,
    status: SubscriptionStatus,
    period_end: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    records: Vec<PaymentRecord>,
    wallets: HashMap<(Uuid, String), Decimal>,
    balances: HashMap<Uuid, Decimal>,
    subscriptions: HashMap<(Uuid, Uuid), SubscriptionRow>,
    plans: HashMap<Uuid, i64>,
    gateway_accounts: HashMap<(Option<Uuid>, SubProvider), String>,
    channel_accounts: HashMap<Uuid, ChannelCredentials>,
    emails: HashMap<Uuid, String>,
    notifications: Vec<(Uuid, Value)>,
    fail_writes: bool,
}

#[derive(Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Seeding ────────────────────────────────────────────────────────────

    pub fn seed_merchant(&self, merchant_id: Uuid, email: &str) {
        self.inner
            .lock()
            .unwrap()
            .emails
            .insert(merchant_id, email.to_string());
    }

    pub fn seed_plan(&self, plan_id: Uuid, duration_days: i64) {
        self.inner.lock().unwrap().plans.insert(plan_id, duration_days);
    }

    pub fn seed_platform_gateway_account(&self, sub_provider: SubProvider, token: &str) {
        self.inner
            .lock()
            .unwrap()
            .gateway_accounts
            .insert((None, sub_provider), token.to_string());
    }

    pub fn seed_merchant_gateway_account(
        &self,
        merchant_id: Uuid,
        sub_provider: SubProvider,
        token: &str,
    ) {
        self.inner
            .lock()
            .unwrap()
            .gateway_accounts
            .insert((Some(merchant_id), sub_provider), token.to_string());
    }

    pub fn seed_channel_account(&self, merchant_id: Uuid, instance_id: &str, api_token: &str) {
        self.inner.lock().unwrap().channel_accounts.insert(
            merchant_id,
            ChannelCredentials {
                instance_id: instance_id.to_string(),
                api_token: api_token.to_string(),
            },
        );
    }

    pub fn insert_charge(
        &self,
        merchant_id: Uuid,
        provider: &str,
        provider_payment_id: &str,
        amount: &str,
        status: &str,
        customer: &str,
    ) -> Uuid {
        let details = DomainDetails::CustomerCharge {
            customer: CustomerHandle::new(customer).unwrap(),
            customer_name: Some("Test Customer".to_string()),
        };
        self.insert_record(merchant_id, provider, provider_payment_id, amount, status, details)
    }

    pub fn insert_plan_payment(
        &self,
        merchant_id: Uuid,
        provider: &str,
        provider_payment_id: &str,
        amount: &str,
        status: &str,
        plan_id: Uuid,
    ) -> Uuid {
        let details = DomainDetails::PlanPayment {
            plan_id,
            subscription_id: None,
        };
        self.insert_record(merchant_id, provider, provider_payment_id, amount, status, details)
    }

    pub fn insert_topup(
        &self,
        merchant_id: Uuid,
        provider: &str,
        provider_payment_id: &str,
        amount: &str,
        status: &str,
    ) -> Uuid {
        self.insert_record(
            merchant_id,
            provider,
            provider_payment_id,
            amount,
            status,
            DomainDetails::BalanceTopUp,
        )
    }

    fn insert_record(
        &self,
        merchant_id: Uuid,
        provider: &str,
        provider_payment_id: &str,
        amount: &str,
        status: &str,
        details: DomainDetails,
    ) -> Uuid {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let record = PaymentRecord {
            id,
            public_id: format!("pay_{id}"),
            merchant_id,
            provider: provider.to_string(),
            provider_payment_id: ProviderPaymentId::new(provider_payment_id).unwrap(),
            status: status.to_string(),
            status_detail: None,
            amount: Amount::new(amount.parse().unwrap()).unwrap(),
            currency: "BRL".to_string(),
            metadata: json!({}),
            raw_payload: json!({}),
            created_at: now,
            updated_at: now,
            details,
        };
        self.inner.lock().unwrap().records.push(record);
        id
    }

    /// Make every ledger/subscription write fail, simulating an outage.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_writes = fail;
    }

    // ── Assertion helpers ──────────────────────────────────────────────────

    pub fn wallet_balance(&self, merchant_id: Uuid, customer: &str) -> Decimal {
        self.inner
            .lock()
            .unwrap()
            .wallets
            .get(&(merchant_id, customer.to_string()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn merchant_balance(&self, merchant_id: Uuid) -> Decimal {
        self.inner
            .lock()
            .unwrap()
            .balances
            .get(&merchant_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn stored_status(&self, provider_payment_id: &str) -> Option<(String, Option<String>)> {
        self.inner
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|r| r.provider_payment_id.as_str() == provider_payment_id)
            .map(|r| (r.status.clone(), r.status_detail.clone()))
    }

    pub fn subscription_for(
        &self,
        merchant_id: Uuid,
        plan_id: Uuid,
    ) -> Option<(Uuid, SubscriptionStatus, DateTime<Utc>)> {
        self.inner
            .lock()
            .unwrap()
            .subscriptions
            .get(&(merchant_id, plan_id))
            .map(|row| (row.id, row.status, row.period_end))
    }

    pub fn attached_subscription(&self, record_id: Uuid) -> Option<Uuid> {
        self.inner
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|r| r.id == record_id)
            .and_then(|r| match r.details {
                DomainDetails::PlanPayment { subscription_id, .. } => subscription_id,
                _ => None,
            })
    }

    pub fn notifications_for(&self, merchant_id: Uuid) -> Vec<Value> {
        self.inner
            .lock()
            .unwrap()
            .notifications
            .iter()
            .filter(|(m, _)| *m == merchant_id)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

fn apply_update(record: &mut PaymentRecord, update: &StatusUpdate) {
    record.status = update.status.clone();
    record.status_detail = update.status_detail.clone();
    record.raw_payload = update.raw.clone();
    record.updated_at = Utc::now();
}

#[async_trait]
impl PaymentStore for MemoryBackend {
    async fn locate(&self, id: &ProviderPaymentId) -> Result<Option<PaymentRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        for domain in [
            PaymentDomain::CustomerCharge,
            PaymentDomain::PlanPayment,
            PaymentDomain::BalanceTopUp,
        ] {
            if let Some(record) = inner
                .records
                .iter()
                .find(|r| r.domain() == domain && r.provider_payment_id == *id)
            {
                return Ok(Some(record.clone()));
            }
        }
        Ok(None)
    }

    async fn claim_approval(
        &self,
        domain: PaymentDomain,
        record_id: Uuid,
        update: &StatusUpdate,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.domain() == domain && r.id == record_id)
            .ok_or(StoreError::NotFound)?;
        if StatusClass::parse(&record.status) == StatusClass::Approved {
            return Ok(false);
        }
        apply_update(record, update);
        Ok(true)
    }

    async fn record_status(
        &self,
        domain: PaymentDomain,
        record_id: Uuid,
        update: &StatusUpdate,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.domain() == domain && r.id == record_id)
            .ok_or(StoreError::NotFound)?;
        apply_update(record, update);
        Ok(())
    }

    async fn attach_subscription(
        &self,
        record_id: Uuid,
        new_subscription_id: Uuid,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or(StoreError::NotFound)?;
        match &mut record.details {
            DomainDetails::PlanPayment {
                subscription_id, ..
            } => {
                *subscription_id = Some(new_subscription_id);
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }
}

#[async_trait]
impl WalletStore for MemoryBackend {
    async fn credit(
        &self,
        merchant_id: Uuid,
        customer: &CustomerHandle,
        amount: Amount,
    ) -> Result<Decimal, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(StoreError::Unavailable("simulated ledger outage".into()));
        }
        let balance = inner
            .wallets
            .entry((merchant_id, customer.as_str().to_string()))
            .or_insert(Decimal::ZERO);
        *balance += amount.get();
        Ok(*balance)
    }
}

#[async_trait]
impl SubscriptionStore for MemoryBackend {
    async fn activate_or_extend(
        &self,
        merchant_id: Uuid,
        plan_id: Uuid,
    ) -> Result<SubscriptionGrant, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(StoreError::Unavailable("simulated store outage".into()));
        }
        let duration_days = *inner.plans.get(&plan_id).ok_or(StoreError::NotFound)?;
        let duration = Duration::days(duration_days);
        let now = Utc::now();

        let row = inner
            .subscriptions
            .entry((merchant_id, plan_id))
            .and_modify(|row| {
                if row.status == SubscriptionStatus::Active && row.period_end > now {
                    row.period_end = row.period_end + duration;
                } else {
                    row.status = SubscriptionStatus::Active;
                    row.period_end = now + duration;
                }
            })
            .or_insert_with(|| SubscriptionRow {
                id: Uuid::now_v7(),
                status: SubscriptionStatus::Active,
                period_end: now + duration,
            });

        Ok(SubscriptionGrant {
            subscription_id: row.id,
            status: row.status,
            period_end: row.period_end,
        })
    }
}

#[async_trait]
impl BalanceStore for MemoryBackend {
    async fn increase(&self, merchant_id: Uuid, amount: Amount) -> Result<Decimal, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(StoreError::Unavailable("simulated ledger outage".into()));
        }
        let balance = inner.balances.entry(merchant_id).or_insert(Decimal::ZERO);
        *balance += amount.get();
        Ok(*balance)
    }
}

#[async_trait]
impl CredentialStore for MemoryBackend {
    async fn gateway_credentials(
        &self,
        scope: CredentialScope,
        sub_provider: SubProvider,
    ) -> Result<Option<GatewayCredentials>, StoreError> {
        let key = match scope {
            CredentialScope::Merchant(merchant_id) => (Some(merchant_id), sub_provider),
            CredentialScope::Platform => (None, sub_provider),
        };
        Ok(self
            .inner
            .lock()
            .unwrap()
            .gateway_accounts
            .get(&key)
            .map(|token| GatewayCredentials {
                access_token: token.clone(),
                sub_provider,
            }))
    }

    async fn channel_credentials(
        &self,
        merchant_id: Uuid,
    ) -> Result<Option<ChannelCredentials>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .channel_accounts
            .get(&merchant_id)
            .cloned())
    }
}

#[async_trait]
impl NotificationStore for MemoryBackend {
    async fn create(&self, merchant_id: Uuid, payload: Value) -> Result<Uuid, StoreError> {
        let id = Uuid::now_v7();
        self.inner
            .lock()
            .unwrap()
            .notifications
            .push((merchant_id, payload));
        Ok(id)
    }

    async fn recipient_email(&self, merchant_id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(self.inner.lock().unwrap().emails.get(&merchant_id).cloned())
    }
}

// ── Fake gateway ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeGateway {
    responses: Mutex<HashMap<String, FetchedPayment>>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, id: &str, status: &str, detail: Option<&str>) {
        self.responses.lock().unwrap().insert(
            id.to_string(),
            FetchedPayment {
                provider_payment_id: id.to_string(),
                status: status.to_string(),
                status_detail: detail.map(str::to_string),
                raw: json!({"id": id, "status": status, "status_detail": detail}),
            },
        );
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn fetch_payment(
        &self,
        _credentials: &GatewayCredentials,
        id: &ProviderPaymentId,
    ) -> Result<FetchedPayment, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport("simulated timeout".into()));
        }
        self.responses
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| GatewayError::Status {
                status: 404,
                payment_id: id.as_str().to_string(),
            })
    }
}

// ── Recording notification collaborators ───────────────────────────────────

#[derive(Default)]
pub struct RecordingBus {
    pub events: Mutex<Vec<(String, Value)>>,
}

#[async_trait]
impl RealtimeBus for RecordingBus {
    async fn publish(&self, topic: &str, payload: Value) -> Result<(), NotifyError> {
        self.events
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<(String, String, Value)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl MessagingChannel for RecordingChannel {
    async fn send_template(
        &self,
        _credentials: &ChannelCredentials,
        recipient: &CustomerHandle,
        template: &str,
        variables: &Value,
    ) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError("simulated channel failure".into()));
        }
        self.sent.lock().unwrap().push((
            recipient.as_str().to_string(),
            template.to_string(),
            variables.clone(),
        ));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError("simulated mail failure".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

// ── World builder ──────────────────────────────────────────────────────────

pub struct TestWorld {
    pub backend: Arc<MemoryBackend>,
    pub gateway: Arc<FakeGateway>,
    pub bus: Arc<RecordingBus>,
    pub channel: Arc<RecordingChannel>,
    pub mailer: Arc<RecordingMailer>,
    pub reconciler: Arc<Reconciler>,
    pub merchant_id: Uuid,
    pub plan_id: Uuid,
}

/// One merchant with pix credentials (own account + platform account), a
/// 30-day plan, a connected messaging channel, and a known email address.
pub fn build_world() -> TestWorld {
    let backend = Arc::new(MemoryBackend::new());
    let gateway = Arc::new(FakeGateway::new());
    let bus = Arc::new(RecordingBus::default());
    let channel = Arc::new(RecordingChannel::default());
    let mailer = Arc::new(RecordingMailer::default());

    let merchant_id = Uuid::now_v7();
    let plan_id = Uuid::now_v7();
    backend.seed_merchant(merchant_id, MERCHANT_EMAIL);
    backend.seed_plan(plan_id, 30);
    backend.seed_platform_gateway_account(SubProvider::Pix, "platform-token");
    backend.seed_merchant_gateway_account(merchant_id, SubProvider::Pix, "merchant-token");
    backend.seed_channel_account(merchant_id, "inst-1", "channel-token");

    let notifier = Notifier::new(
        bus.clone(),
        channel.clone(),
        backend.clone(),
        mailer.clone(),
        backend.clone(),
        vec![ADMIN_EMAIL.to_string()],
    );

    let reconciler = Arc::new(Reconciler::new(ReconcilerDeps {
        payments: backend.clone(),
        credentials: backend.clone(),
        gateway: gateway.clone(),
        wallets: backend.clone(),
        subscriptions: backend.clone(),
        balances: backend.clone(),
        notifier,
    }));

    TestWorld {
        backend,
        gateway,
        bus,
        channel,
        mailer,
        reconciler,
        merchant_id,
        plan_id,
    }
}

pub fn ppid(s: &str) -> ProviderPaymentId {
    ProviderPaymentId::new(s).unwrap()
}

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}
