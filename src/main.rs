//! Collections CRM Backend
//!
//! Assigns overdue accounts to callers, tracks the accept/decline lifecycle
//! of assignment batches, and records contact attempts. SQLite persistence
//! with a Tantivy index for customer lookup.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod search;
mod workflow;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, LogFormat};
use db::Repository;
use search::SearchIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting Collections CRM Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (CRM_API_PSK). Authentication is disabled!");
    }

    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let search = Arc::new(SearchIndex::open(&config.index_path)?);
    tracing::info!("Building search index...");
    let customers = repo.list_customers(None, None).await?;
    search.rebuild(&customers).await?;

    let bind_addr = config.bind_addr;
    let state = AppState {
        repo,
        search,
        config: Arc::new(config),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        .route("/revision", get(api::get_revision))
        // Callers
        .route("/callers", get(api::list_callers).post(api::create_caller))
        .route(
            "/callers/{id}",
            get(api::get_caller)
                .put(api::update_caller)
                .delete(api::delete_caller),
        )
        .route("/callers/{id}/workload", put(api::edit_workload))
        // Customers
        .route("/customers", get(api::list_customers))
        .route("/customers/import", post(api::import_customers))
        .route("/customers/search", get(api::search_customers))
        .route("/customers/{id}", get(api::get_customer))
        .route("/customers/{id}/contacts", post(api::record_contact))
        // Assignment requests
        .route("/requests", get(api::list_requests).post(api::create_request))
        .route(
            "/requests/{id}",
            get(api::get_request).put(api::update_request),
        )
        .route("/requests/{id}/accept", post(api::accept_request))
        .route("/requests/{id}/decline", post(api::decline_request))
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
