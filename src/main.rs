use std::sync::Arc;

use axum::{routing::get, Json, Router};
use rustpress_gate::{
    AccountDirectory, AuthConfig, AuthService, InMemoryDirectory, PgDirectory, ServerConfig,
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn hello() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Hello, World" }))
}

fn fatal(context: &str, error: impl std::fmt::Display) -> ! {
    tracing::error!("{context}: {error}");
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rustpress_gate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AuthConfig::from_env()
        .and_then(|config| config.validate().map(|_| config))
        .unwrap_or_else(|e| fatal("Invalid auth configuration", e));
    tracing::debug!(?config, "Auth configuration loaded");

    let server = ServerConfig::from_env();

    let directory: Arc<dyn AccountDirectory> = match &server.database_url {
        Some(url) => {
            let pool = PgPool::connect(url)
                .await
                .unwrap_or_else(|e| fatal("Failed to connect to database", e));
            tracing::info!("Database connection pool created");

            let directory = PgDirectory::new(pool);
            if let Err(e) = directory.migrate().await {
                fatal("Failed to run database migrations", e);
            }
            Arc::new(directory)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, accounts are kept in memory");
            Arc::new(InMemoryDirectory::new())
        }
    };

    let service = AuthService::new(&config, directory)
        .unwrap_or_else(|e| fatal("Failed to build auth service", e));

    let app = Router::new()
        .route("/", get(hello))
        .merge(rustpress_gate::create_routes(Arc::new(service)))
        .layer(TraceLayer::new_for_http());

    let addr = server.bind_address();
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| fatal("Failed to bind listener", e));

    if let Err(e) = axum::serve(listener, app).await {
        fatal("Server error", e);
    }
}
