use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use idioms_cloud::openai::OpenAiClient;
use idioms_cloud::storage::{HttpImageSource, InMemoryStorage, ObjectStorage, S3Storage};
use idioms_pipeline::generator::IdiomGenerator;
use idioms_pipeline::thumbnail::ThumbnailService;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use idioms_api::background;
use idioms_api::config::ServerConfig;
use idioms_api::router::build_app_router;
use idioms_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "idioms_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        admin_enabled = config.admin_enabled,
        generation_enabled = config.generation.enabled,
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = idioms_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    idioms_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    idioms_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- External services ---
    if config.openai.api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; generation requests will fail");
    }
    let openai = Arc::new(
        OpenAiClient::new(config.openai.clone()).expect("Failed to build OpenAI HTTP client"),
    );

    let storage: Arc<dyn ObjectStorage> = match &config.storage.thumbnail_bucket {
        Some(bucket) => {
            tracing::info!(bucket = %bucket, "Thumbnails stored in S3");
            Arc::new(S3Storage::from_env(bucket.clone()).await)
        }
        None => {
            tracing::warn!("THUMBNAIL_BUCKET is not set; thumbnails are kept in memory");
            Arc::new(InMemoryStorage::new())
        }
    };

    let http = reqwest::Client::builder()
        .timeout(config.openai.timeout)
        .build()
        .expect("Failed to build image download client");

    // --- Pipeline ---
    let generator = Arc::new(IdiomGenerator::new(pool.clone(), openai.clone()));
    let thumbnails = Arc::new(ThumbnailService::new(
        pool.clone(),
        storage,
        openai,
        Arc::new(HttpImageSource::new(http)),
    ));

    // --- Background generation ---
    let cancel = CancellationToken::new();
    let generation_handle = config.generation.enabled.then(|| {
        tokio::spawn(background::idiom_generation::run(
            Arc::clone(&generator),
            config.generation.interval,
            cancel.clone(),
        ))
    });

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        generator,
        thumbnails,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    if let Some(handle) = generation_handle {
        let wait = Duration::from_secs(config.shutdown_timeout_secs);
        if tokio::time::timeout(wait, handle).await.is_err() {
            tracing::warn!("Idiom generation job did not stop in time");
        }
    }

    tracing::info!("Shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
