use account_service::{
    AppState, BcryptHasher,
    config::{AppConfig, Env},
    create_router,
    repository::{InMemoryRepository, PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Startup order: configuration, logging, store, admin bootstrap, then the
/// HTTP server. Any failure before serving aborts the process.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise a development-friendly default.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "account_service=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    if config.token_strategy == account_service::TokenStrategy::Legacy {
        tracing::warn!("TOKEN_STRATEGY=legacy: session tokens are 31-bit and guessable");
    }

    // 3. Store: Postgres when DATABASE_URL is set, otherwise in-memory (local only).
    let repo: RepositoryState = match &config.db_url {
        Some(db_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

            let postgres = PostgresRepository::new(pool);
            postgres
                .ensure_schema()
                .await
                .expect("FATAL: Failed to apply the database schema.");
            Arc::new(postgres) as RepositoryState
        }
        None => {
            tracing::warn!("DATABASE_URL not set; accounts are kept in memory and lost on exit");
            Arc::new(InMemoryRepository::new()) as RepositoryState
        }
    };

    // 4. Unified state
    let app_state = AppState::new(
        repo,
        Arc::new(BcryptHasher::new(config.bcrypt_cost)),
        config.token_strategy.generator(),
        config.clone(),
    );

    // 5. Bootstrap administrator, before any request is accepted.
    app_state
        .service
        .bootstrap_admin()
        .await
        .expect("FATAL: Failed to bootstrap the administrator account.");

    // 6. Router and server
    let app = create_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", config.bind_addr);
    tracing::info!("API Documentation (Swagger UI) available under /swagger-ui");

    axum::serve(listener, app).await.expect("FATAL: HTTP server error");
}
