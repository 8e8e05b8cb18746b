//! Grupa server - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grupa_engine::api::{self, ApiState, ConnectionManager};
use grupa_engine::infrastructure::{
    blob_store::FsBlobStore,
    clock::{SystemClock, SystemRandom},
    config::AppConfig,
    mailer::{LogMailer, ResendMailer},
    ports::MailerPort,
    sqlite::SqliteRepositories,
};
use grupa_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the server may run from `crates/engine`).
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grupa_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Grupa server");

    let config = AppConfig::from_env();

    tracing::info!(path = %config.database_path.display(), "Opening database");
    let repos = SqliteRepositories::connect(&config.database_path).await?;
    let blobs = FsBlobStore::new(config.upload_dir.clone()).await?;

    let mailer: Arc<dyn MailerPort> = match &config.resend_api_key {
        Some(key) => Arc::new(ResendMailer::new(key.clone(), config.email_from.clone())),
        None => {
            tracing::warn!("AUTH_RESEND_KEY not set, sign-in codes will only be logged");
            Arc::new(LogMailer)
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    let cors = build_cors_layer(&config.cors_allow_origin);

    let app = Arc::new(App::new(
        repos,
        mailer,
        Arc::new(blobs),
        Arc::new(SystemClock::new()),
        Arc::new(SystemRandom::new()),
        config,
    ));
    let state = ApiState::new(app, Arc::new(ConnectionManager::new()));

    let mut router = api::router(state).layer(TraceLayer::new_for_http());
    if let Some(cors) = cors {
        router = router.layer(cors);
    }

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer(allowed_origins: &str) -> Option<CorsLayer> {
    let allowed_origins = allowed_origins.trim();
    if allowed_origins.is_empty() {
        return None;
    }

    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        // Bearer tokens and JSON bodies trigger CORS preflights.
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}
