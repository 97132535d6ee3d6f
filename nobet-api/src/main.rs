//! nobet-api: HTTP surface for the on-call duty roster scheduler.
//!
//! Exposes the same four operations as `nobet-cli` (capacity, target,
//! solve, distribute) over axum, so a frontend or another service can
//! drive the solver without shelling out.

mod external;
mod handlers;

use axum::routing::{get, post};
use axum::Router;
use external::{CsvWorkbookRenderer, LocalObjectStore, ObjectStore, WorkbookRenderer};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<dyn WorkbookRenderer>,
    pub store: Arc<dyn ObjectStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let storage_dir = std::env::var("NOBET_STORAGE_DIR").unwrap_or_else(|_| "./storage".into());
    let state = AppState {
        renderer: Arc::new(CsvWorkbookRenderer),
        store: Arc::new(LocalObjectStore::new(storage_dir)),
    };

    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/schema", get(schema))
        .route("/capacity", post(handlers::capacity))
        .route("/target", post(handlers::target_endpoint))
        .route("/solve", post(handlers::solve_endpoint))
        .route("/distribute", post(handlers::distribute))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "nobet-api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn schema() -> axum::Json<schemars::schema::RootSchema> {
    axum::Json(nobet_contracts::schema_for::<nobet_contracts::RosterRequest>())
}
