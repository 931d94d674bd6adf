use std::env;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use transaction_service::api::http_routes::{routes, AppState};
use transaction_service::infrastructure::messaging::kafka_consumer::TransferEventConsumer;
use transaction_service::infrastructure::messaging::kafka_producer::KafkaEventPublisher;
use transaction_service::infrastructure::persistence::outbox_repository::PostgresOutboxRepository;
use transaction_service::infrastructure::persistence::transfer_repository::PostgresTransferRepository;
use transaction_service::jobs::timeout_recoverer::TimeoutRecoverer;
use transaction_service::use_cases::apply_wallet_credit_failed::ApplyWalletCreditFailedUseCase;
use transaction_service::use_cases::apply_wallet_credited::ApplyWalletCreditedUseCase;
use transaction_service::use_cases::apply_wallet_debit_failed::ApplyWalletDebitFailedUseCase;
use transaction_service::use_cases::apply_wallet_debited::ApplyWalletDebitedUseCase;
use transaction_service::use_cases::get_transfer::GetTransferUseCase;
use transaction_service::use_cases::initiate_transfer::InitiateTransferUseCase;

#[derive(OpenApi)]
#[openapi(
    paths(
        transaction_service::api::http_routes::initiate_transfer,
        transaction_service::api::http_routes::get_transfer,
    ),
    components(schemas(transaction_service::api::http_routes::InitiateTransferRequest))
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting Transaction Service...");

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    info!("Connected to database");

    let brokers = env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string());

    let saga_timeout_ms: i64 = env::var("SAGA_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(60_000);
    let outbox_poll_interval_ms: u64 = env::var("OUTBOX_POLL_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(50);
    let outbox_batch_size: i64 = env::var("OUTBOX_BATCH_SIZE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(100);
    let scanner_period_secs: u64 = env::var("TIMEOUT_SCANNER_PERIOD_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);
    let scanner_batch_size: i64 = env::var("TIMEOUT_SCANNER_BATCH_SIZE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(100);

    let transfer_repo = Arc::new(PostgresTransferRepository::new(pool.clone()));

    let initiate_transfer_use_case =
        InitiateTransferUseCase::new(transfer_repo.clone(), Duration::milliseconds(saga_timeout_ms));
    let get_transfer_use_case = GetTransferUseCase::new(transfer_repo.clone());

    // Outbox publisher: polls the Coordinator's own `outbox` table and
    // ships unpublished rows to the broker (spec §4.3).
    let publisher = KafkaEventPublisher::new(&brokers)?;
    let publisher_store = PostgresOutboxRepository::new(pool.clone());
    let outbox_publisher = common::outbox::OutboxPublisher::new(
        publisher_store,
        publisher,
        outbox_batch_size,
        StdDuration::from_millis(outbox_poll_interval_ms),
    );
    tokio::spawn(outbox_publisher.run());

    // Saga consumer: reacts to the Ledger's side of the choreography
    // (spec §4.1, §4.4).
    let apply_debited = Arc::new(ApplyWalletDebitedUseCase::new(transfer_repo.clone()));
    let apply_debit_failed = Arc::new(ApplyWalletDebitFailedUseCase::new(transfer_repo.clone()));
    let apply_credited = Arc::new(ApplyWalletCreditedUseCase::new(transfer_repo.clone()));
    let apply_credit_failed = Arc::new(ApplyWalletCreditFailedUseCase::new(transfer_repo.clone()));

    let consumer_group =
        env::var("KAFKA_CONSUMER_GROUP").unwrap_or_else(|_| "transaction-service".to_string());
    let consumer = TransferEventConsumer::new(
        &brokers,
        &consumer_group,
        apply_debited,
        apply_debit_failed,
        apply_credited,
        apply_credit_failed,
    )?;
    tokio::spawn(consumer.run());

    // Timeout scanner: fails stuck sagas and drives compensation for
    // DEBITED ones stuck past their deadline (spec §4.5).
    let recoverer = TimeoutRecoverer::new(
        transfer_repo.clone(),
        StdDuration::from_secs(scanner_period_secs),
        scanner_batch_size,
    );
    tokio::spawn(recoverer.run());

    let app_state = Arc::new(AppState {
        initiate_transfer_use_case,
        get_transfer_use_case,
    });

    let app = routes(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
