use std::sync::Arc;
use std::time::Duration;

use account_service::account::ports::AccountServicePort;
use account_service::config::Config;
use account_service::domain::account::service::AccountService;
use account_service::domain::product::service::ProductService;
use account_service::inbound::http::router::create_router;
use account_service::outbound::email::SmtpNotifier;
use account_service::outbound::repositories::PostgresAccountRepository;
use account_service::outbound::repositories::PostgresProductRepository;
use account_service::outbound::storage::FilesystemDocumentStore;
use auth::Authenticator;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "account-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        database_url = %config.database.url,
        http_port = config.server.http_port,
        smtp_host = %config.smtp.host,
        storage_root = %config.storage.root,
        reaper_interval_minutes = config.reaper.interval_minutes,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let authenticator = Arc::new(Authenticator::new(config.jwt.secret.as_bytes()));
    let account_repository = Arc::new(PostgresAccountRepository::new(pg_pool.clone()));
    let product_repository = Arc::new(PostgresProductRepository::new(pg_pool));
    let notifier = Arc::new(SmtpNotifier::new(&config.smtp)?);
    let document_store = Arc::new(FilesystemDocumentStore::new(&config.storage.root));

    let account_service = Arc::new(AccountService::new(
        Arc::clone(&account_repository),
        Arc::clone(&notifier),
        document_store,
        Arc::clone(&authenticator),
        config.jwt.expiration_hours,
    ));
    let product_service = Arc::new(ProductService::new(
        product_repository,
        account_repository,
        Arc::clone(&notifier),
    ));

    let reaper_service = Arc::clone(&account_service);
    let reaper_interval = Duration::from_secs(config.reaper.interval_minutes * 60);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(reaper_interval);
        // First tick fires immediately; skip it so startup is quiet.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match reaper_service.reap_inactive().await {
                Ok(outcome) => {
                    if !outcome.reaped.is_empty() {
                        tracing::info!(
                            removed = outcome.reaped.len(),
                            notified = outcome.notified,
                            notification_failures = outcome.notification_failures,
                            "Inactive accounts reaped"
                        );
                    }
                }
                Err(e) => tracing::error!(error = %e, "Reaper run failed"),
            }
        }
    });
    tracing::info!(
        interval_minutes = config.reaper.interval_minutes,
        "Inactivity reaper scheduled"
    );

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(account_service, product_service, authenticator);
    axum::serve(http_listener, http_application).await?;

    Ok(())
}
