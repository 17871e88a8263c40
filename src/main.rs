// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use examprep::config::Config;
use examprep::engine::ExamServiceRegistry;
use examprep::oracle::{HttpOracle, RubricOracle, ScoringOracle, TranscriptionOracle};
use examprep::routes;
use examprep::state::AppState;
use examprep::store::{PgStore, PracticeStore, StoreError};
use examprep::utils::hash::hash_password;

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    let store: Arc<dyn PracticeStore> = Arc::new(PgStore::new(pool));

    // Seed Admin User
    if let Err(e) = seed_admin_user(store.as_ref(), &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    // Wire the scoring oracle: remote when configured, deterministic
    // rubric fallback otherwise (offline mode).
    let oracle_timeout = Duration::from_secs(config.oracle_timeout_secs);
    let (oracle, transcriber): (
        Arc<dyn ScoringOracle>,
        Option<Arc<dyn TranscriptionOracle>>,
    ) = match &config.oracle_url {
        Some(url) => {
            let http = Arc::new(
                HttpOracle::new(url.clone(), config.oracle_api_key.clone(), oracle_timeout)
                    .expect("Failed to build oracle client"),
            );
            tracing::info!("Using remote scoring oracle at {}", url);
            (http.clone(), Some(http))
        }
        None => {
            tracing::info!("No ORACLE_URL set; using deterministic rubric scoring");
            (Arc::new(RubricOracle), None)
        }
    };

    // Construct the three exam services once and share them by handle.
    let registry = Arc::new(ExamServiceRegistry::new(
        store.clone(),
        oracle,
        transcriber,
        oracle_timeout,
    ));

    // Create AppState
    let state = AppState {
        store,
        registry,
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}

async fn seed_admin_user(
    store: &dyn PracticeStore,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        let hashed_password = hash_password(password)?;

        match store.insert_user(username, &hashed_password, "admin").await {
            Ok(_) => tracing::info!("Admin user '{}' created successfully.", username),
            Err(StoreError::Conflict(_)) => {
                // Already seeded on a previous start.
            }
            Err(e) => return Err(Box::new(e)),
        }
    }
    Ok(())
}
