//! Maker web server.
//!
//! Axum front end over the same agent the CLI drives: a WebSocket endpoint
//! that streams generation progress, a zip download for finished projects
//! and a static page.

pub mod download;
pub mod state;
pub mod websocket;

use std::net::SocketAddr;

use axum::{Router, routing::get};
use tower_http::{services::ServeDir, trace::TraceLayer};

pub use state::{AppState, GenerateRequest};
pub use websocket::WebSocketSink;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/api/generate", get(websocket::ws_handler))
        .route("/download/{project_name}", get(download::download))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the web server until the process is stopped.
pub async fn run_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server starting on http://localhost:{port}");

    axum::serve(listener, app).await?;
    Ok(())
}
