pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use config::Config;
use error::AppError;
use services::Database;

/// Shared application state, injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
}

/// Build the HTTP router with all routes and layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        // Customer endpoints
        .route(
            "/api/customers",
            post(handlers::customers::create_customer).get(handlers::customers::list_customers),
        )
        .route(
            "/api/customers/:id",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        // Tax endpoints
        .route(
            "/api/taxes",
            post(handlers::taxes::create_tax).get(handlers::taxes::list_taxes),
        )
        .route(
            "/api/taxes/:id",
            get(handlers::taxes::get_tax)
                .put(handlers::taxes::update_tax)
                .delete(handlers::taxes::delete_tax),
        )
        // Item endpoints
        .route(
            "/api/items",
            post(handlers::items::create_item).get(handlers::items::list_items),
        )
        .route(
            "/api/items/:id",
            get(handlers::items::get_item)
                .put(handlers::items::update_item)
                .delete(handlers::items::delete_item),
        )
        // Invoice endpoints
        .route(
            "/api/invoices",
            post(handlers::invoices::create_invoice).get(handlers::invoices::list_invoices),
        )
        .route("/api/invoices/stats", get(handlers::invoices::invoice_stats))
        .route(
            "/api/invoices/preview",
            post(handlers::invoices::preview_totals),
        )
        .route(
            "/api/invoices/:id",
            get(handlers::invoices::get_invoice)
                .put(handlers::invoices::update_invoice)
                .delete(handlers::invoices::delete_invoice),
        )
        .route("/api/invoices/:id/pdf", get(handlers::invoices::render_pdf))
        // Template endpoints
        .route(
            "/api/templates",
            post(handlers::templates::create_template).get(handlers::templates::list_templates),
        )
        .route(
            "/api/templates/:id",
            get(handlers::templates::get_template)
                .put(handlers::templates::update_template)
                .delete(handlers::templates::delete_template),
        )
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .with_state(state)
}

/// Application container for managing server lifecycle: the database pool is
/// opened once here and closed when the server stops.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    db: Database,
}

impl Application {
    /// Build the application with the given configuration: connect the pool,
    /// run migrations, bind the listener.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let db = Database::new(&config.database.url, config.database.max_connections).await?;
        db.run_migrations().await?;

        services::init_metrics();

        let state = AppState {
            db: db.clone(),
            config: config.clone(),
        };
        let router = build_router(state);

        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
            db,
        })
    }

    /// The port the server is bound to (useful when configured with port 0).
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until the process is asked to stop, then close the pool.
    pub async fn run_until_stopped(self) -> Result<(), AppError> {
        tracing::info!(port = self.port, "Listening");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.db.close().await;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
