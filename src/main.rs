use axum::{Extension, Router};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

mod catalog;
mod config;
mod context;
mod handlers;
mod middleware;
mod models;
mod relay_client;
mod render;
mod selection;
mod session;
mod storage;

use catalog::ProductCatalog;
use config::AppConfig;
use relay_client::RelayClient;
use session::SessionController;
use storage::PrefsStore;

/// Shared state: the immutable catalog, the single session controller, the
/// relay client, and the HTTP client the relay route forwards with.
pub struct AppState {
    pub config: AppConfig,
    pub catalog: Arc<ProductCatalog>,
    pub controller: RwLock<SessionController>,
    pub relay: RelayClient,
    pub upstream: reqwest::Client,
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    let config = AppConfig::from_env();

    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        tracing::warn!("Failed to create data directory: {}", e);
    } else {
        tracing::info!("Data directory ready: {}", config.data_dir.display());
    }

    // The catalog is required: without products there is nothing to browse,
    // select, or build routines from.
    let catalog = match ProductCatalog::load(&config.products_path).await {
        Ok(catalog) => {
            if catalog.is_empty() {
                tracing::warn!("Product catalog is empty; nothing will be browsable");
            }
            tracing::info!(
                "Loaded {} products in {} categories from {}",
                catalog.len(),
                catalog.categories().len(),
                config.products_path.display()
            );
            Arc::new(catalog)
        }
        Err(e) => {
            tracing::error!(
                "Failed to load product catalog from {}: {}",
                config.products_path.display(),
                e
            );
            std::process::exit(1);
        }
    };

    let relay = RelayClient::new(config.relay_url.clone(), config.model.clone());
    tracing::info!(
        "Relay client ready (model: {}, shape: {})",
        relay.model(),
        if relay.uses_web_search() {
            "web-search"
        } else {
            "legacy chat"
        }
    );

    let prefs = PrefsStore::new(config.data_dir.clone());
    let mut controller =
        SessionController::new(Arc::clone(&catalog), prefs, relay.uses_web_search());
    controller.restore();

    let relay_configured = config.openai_api_key.is_some();
    if relay_configured {
        tracing::info!("OPENAI_API_KEY found. Mounting the /relay route.");
    } else {
        tracing::warn!(
            "OPENAI_API_KEY not found. /relay disabled; set RELAY_URL to an external relay."
        );
    }

    let port = config.port;
    let shared_state = Arc::new(AppState {
        config,
        catalog,
        controller: RwLock::new(controller),
        relay,
        upstream: reqwest::Client::new(),
    });

    let mut app = Router::new()
        .merge(handlers::ui::ui_routes())
        .merge(handlers::catalog::catalog_routes())
        .merge(handlers::selection::selection_routes())
        .merge(handlers::chat::chat_routes());

    if relay_configured {
        app = app.merge(handlers::relay::relay_routes());
    }

    let app = app
        .layer(axum::middleware::from_fn(
            middleware::logging::request_logging_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(Extension(shared_state));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("Failed to bind server port");
    tracing::info!(
        "listening on {}",
        listener.local_addr().expect("listener has a local address")
    );
    axum::serve(listener, app).await.expect("server error");
}

// Production-grade logging configuration
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,glow_advisor=trace,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,glow_advisor=info,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for production (easier for log aggregation)
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        // Human-readable logging for development
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("✨ Glow Advisor starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) {
            "development"
        } else {
            "production"
        }
    );
    tracing::info!("Log level: {}", log_level);

    Ok(())
}
