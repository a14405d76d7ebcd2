use {
    axum::{
        Router,
        extract::DefaultBodyLimit,
        routing::{get, post},
    },
    pay_sync::{
        AppState,
        adapters::{
            channel::HttpMessagingChannel,
            mailer::HttpMailer,
            mercadopago::{self, MercadoPagoGateway},
            webhook::gateway_webhook_handler,
        },
        domain::{
            effects::{Mailer, MessagingChannel, RealtimeBus},
            stores::{CredentialStore, NotificationStore},
        },
        infra::{
            bus::LocalBus,
            postgres::{
                credential_repo::PgCredentialStore,
                ledger_repo::{PgBalanceStore, PgWalletStore},
                notification_repo::PgNotificationStore,
                record_repo::PgPaymentStore,
                subscription_repo::PgSubscriptionStore,
            },
        },
        services::{
            notifier::Notifier,
            reconciler::{Reconciler, ReconcilerDeps},
        },
    },
    sqlx::postgres::PgPoolOptions,
    std::{env, sync::Arc, time::Duration},
    tokio::signal,
    tower_http::timeout::TimeoutLayer,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let gateway_base = env::var("GATEWAY_API_BASE")
        .unwrap_or_else(|_| mercadopago::DEFAULT_API_BASE.to_string());
    let channel_base = env::var("CHANNEL_API_BASE").expect("CHANNEL_API_BASE must be set");
    let mail_base = env::var("MAIL_API_BASE").expect("MAIL_API_BASE must be set");
    let mail_key = env::var("MAIL_API_KEY").expect("MAIL_API_KEY must be set");
    let mail_from = env::var("MAIL_FROM").expect("MAIL_FROM must be set");
    let admin_emails: Vec<String> = env::var("ADMIN_EMAILS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&database_url)
        .await
        .expect("failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let outbound_timeout = Duration::from_secs(10);
    let bus = LocalBus::new(256);
    let gateway = MercadoPagoGateway::new(gateway_base, outbound_timeout)
        .expect("failed to build gateway client");
    let channel: Arc<dyn MessagingChannel> = Arc::new(
        HttpMessagingChannel::new(channel_base, outbound_timeout)
            .expect("failed to build channel client"),
    );
    let mailer: Arc<dyn Mailer> = Arc::new(
        HttpMailer::new(mail_base, mail_key, mail_from, outbound_timeout)
            .expect("failed to build mail client"),
    );

    let credentials: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(pool.clone()));
    let notifications: Arc<dyn NotificationStore> =
        Arc::new(PgNotificationStore::new(pool.clone()));

    let notifier = Notifier::new(
        Arc::new(bus.clone()) as Arc<dyn RealtimeBus>,
        channel,
        notifications,
        mailer,
        credentials.clone(),
        admin_emails,
    );

    let reconciler = Reconciler::new(ReconcilerDeps {
        payments: Arc::new(PgPaymentStore::new(pool.clone())),
        credentials,
        gateway: Arc::new(gateway),
        wallets: Arc::new(PgWalletStore::new(pool.clone())),
        subscriptions: Arc::new(PgSubscriptionStore::new(pool.clone())),
        balances: Arc::new(PgBalanceStore::new(pool.clone())),
        notifier,
    });

    let state = AppState {
        reconciler: Arc::new(reconciler),
    };

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/webhooks/mercadopago", post(gateway_webhook_handler))
        .layer(DefaultBodyLimit::max(64 * 1024)) // gateway notifications are tiny
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    tracing::info!("listening on 0.0.0.0:3000");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
