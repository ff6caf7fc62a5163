//! Storefront Backend
//!
//! Product catalog and admin product management over SQLite, with a filesystem image store.

mod admin;
mod api;
mod auth;
mod catalog;
mod client;
mod config;
mod db;
mod errors;
mod models;
mod storage;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::AuthService;
use client::{ProductBackend, StoreClient};
use config::Config;
use db::{AccountStore, Repository};
use storage::{ImageStore, BUCKET};

/// Room for the text fields of a multipart form on top of the image itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub images: Arc<ImageStore>,
    pub backend: Arc<dyn ProductBackend>,
    pub auth: Arc<AuthService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the stores together over an initialised database.
    pub async fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let pool = db::init_database(&config.db_path).await?;
        let repo = Arc::new(Repository::new(pool.clone()));
        let images = Arc::new(
            ImageStore::open(
                &config.upload_dir,
                &config.public_base_url,
                config.max_upload_bytes,
            )
            .await?,
        );
        let backend: Arc<dyn ProductBackend> =
            Arc::new(StoreClient::new(repo.clone(), images.clone()));
        let auth = Arc::new(AuthService::new(
            AccountStore::new(pool),
            config.session_ttl_hours,
        ));

        Ok(Self {
            repo,
            images,
            backend,
            auth,
            config: Arc::new(config),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Storefront Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Upload directory: {:?}", config.upload_dir);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if nobody can manage products through the allow-list
    if config.admin_emails.is_empty() {
        tracing::warn!(
            "No admin emails configured (STORE_ADMIN_EMAILS). Only accounts with the admin role can sign in to the admin area"
        );
    } else {
        tracing::info!("{} admin email(s) configured", config.admin_emails.len());
    }

    let bind_addr = config.bind_addr;
    let state = AppState::build(config).await?;

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Admin routes, re-authorized on every request
    let admin_routes = Router::new()
        .route(
            "/products",
            get(api::list_admin_products).post(api::create_product_form),
        )
        .route("/products/json", post(api::create_product_json))
        .route(
            "/products/{id}",
            patch(api::patch_product).delete(api::delete_product),
        )
        .route("/products/{id}/form", put(api::edit_product_form))
        .route("/images", post(api::upload_image))
        .route("/storage/reconcile", post(api::reconcile_storage))
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_bytes + FORM_OVERHEAD_BYTES,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    // Public API routes
    let api_routes = Router::new()
        // Catalog
        .route("/catalog", get(api::get_catalog))
        .route("/catalog/categories", get(api::get_categories))
        .route("/products/{id}", get(api::get_product))
        // Sessions
        .route("/auth/sign-in", post(api::sign_in))
        .route("/auth/sign-up", post(api::sign_up))
        .route("/auth/session", get(api::get_session))
        .route("/auth/sign-out", post(api::sign_out))
        .nest("/admin", admin_routes);

    // Health check and stored images (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .nest_service(
            &format!("/storage/{}", BUCKET),
            ServeDir::new(state.images.root()),
        );

    Router::new()
        .nest("/api", api_routes)
        .merge(public_routes)
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
