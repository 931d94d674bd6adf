use std::env;
use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use wallet_service::api::http_routes::{routes, AppState};
use wallet_service::infrastructure::messaging::kafka_consumer::WalletEventConsumer;
use wallet_service::infrastructure::messaging::kafka_producer::KafkaEventPublisher;
use wallet_service::infrastructure::persistence::dead_letter_repository::PostgresDeadLetterRepository;
use wallet_service::infrastructure::persistence::ledger_engine::PostgresLedgerEngine;
use wallet_service::infrastructure::persistence::outbox_repository::PostgresOutboxRepository;
use wallet_service::infrastructure::persistence::wallet_repository::PostgresWalletRepository;
use wallet_service::use_cases::create_wallet::CreateWalletUseCase;
use wallet_service::use_cases::credit_wallet::CreditWalletUseCase;
use wallet_service::use_cases::debit_wallet::DebitWalletUseCase;
use wallet_service::use_cases::get_dead_letter::GetDeadLetterUseCase;
use wallet_service::use_cases::get_wallet::GetWalletUseCase;
use wallet_service::use_cases::list_dead_letters::ListDeadLettersUseCase;
use wallet_service::use_cases::refund_wallet::RefundWalletUseCase;
use wallet_service::use_cases::replay_dead_letter::ReplayDeadLetterUseCase;

#[derive(OpenApi)]
#[openapi(
    paths(
        wallet_service::api::http_routes::create_wallet,
        wallet_service::api::http_routes::get_wallet_details,
        wallet_service::api::http_routes::list_dead_letters,
        wallet_service::api::http_routes::get_dead_letter,
        wallet_service::api::http_routes::replay_dead_letter,
    ),
    components(schemas(wallet_service::api::http_routes::CreateWalletRequest))
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting Wallet Service...");

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    info!("Connected to database");

    let brokers = env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string());

    let outbox_poll_interval_ms: u64 = env::var("OUTBOX_POLL_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(50);
    let outbox_batch_size: i64 = env::var("OUTBOX_BATCH_SIZE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(100);

    let wallet_repo = Arc::new(PostgresWalletRepository::new(pool.clone()));
    let dead_letter_repo = Arc::new(PostgresDeadLetterRepository::new(pool.clone()));
    let outbox_repo = Arc::new(PostgresOutboxRepository::new(pool.clone()));
    let ledger = Arc::new(PostgresLedgerEngine::new(pool.clone()));

    let create_wallet_use_case = CreateWalletUseCase::new(wallet_repo.clone());
    let get_wallet_use_case = GetWalletUseCase::new(wallet_repo.clone());
    let list_dead_letters_use_case = ListDeadLettersUseCase::new(dead_letter_repo.clone());
    let get_dead_letter_use_case = GetDeadLetterUseCase::new(dead_letter_repo.clone());
    let replay_dead_letter_use_case =
        ReplayDeadLetterUseCase::new(dead_letter_repo.clone(), ledger.clone());

    // Outbox publisher: polls the same `outbox` table the ledger engine
    // writes into and ships unpublished rows to the broker (spec §4.3).
    // Takes its own owned store handle — `OutboxPublisher` is generic
    // over the store type, not a trait object, so it can't share the
    // `Arc<dyn OutboxRepository>` the use cases depend on.
    let publisher = KafkaEventPublisher::new(&brokers)?;
    let publisher_store = PostgresOutboxRepository::new(pool.clone());
    let outbox_publisher = common::outbox::OutboxPublisher::new(
        publisher_store,
        publisher,
        outbox_batch_size,
        Duration::from_millis(outbox_poll_interval_ms),
    );
    tokio::spawn(outbox_publisher.run());

    // Saga consumer: reacts to `transfer.initiated`, `wallet.debited`,
    // and `wallet.credit-failed` (spec §4.4).
    let debit_use_case = Arc::new(DebitWalletUseCase::new(ledger.clone(), outbox_repo.clone()));
    let credit_use_case = Arc::new(CreditWalletUseCase::new(ledger.clone(), outbox_repo.clone()));
    let refund_use_case = Arc::new(RefundWalletUseCase::new(ledger.clone(), dead_letter_repo.clone()));

    let consumer_group = env::var("KAFKA_CONSUMER_GROUP")
        .unwrap_or_else(|_| "wallet-service".to_string());
    let consumer = WalletEventConsumer::new(
        &brokers,
        &consumer_group,
        debit_use_case,
        credit_use_case,
        refund_use_case,
    )?;
    tokio::spawn(consumer.run());

    let app_state = Arc::new(AppState {
        create_wallet_use_case,
        get_wallet_use_case,
        list_dead_letters_use_case,
        get_dead_letter_use_case,
        replay_dead_letter_use_case,
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
