use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use transit_tracker::config::AppConfig;
use transit_tracker::network::StationGraph;
use transit_tracker::store::SystemClock;
use transit_tracker::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("transit_tracker=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let graph = StationGraph::from_json_file(&config.network_path)
        .expect("Failed to load network snapshot");
    info!(
        path = %config.network_path.display(),
        stations = graph.len(),
        lines = graph.line_ids().count(),
        "network loaded"
    );

    let state = AppState::new(graph, &config, Arc::new(SystemClock));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .expect("Failed to bind listener");
    info!(addr = %config.addr, "transit tracker listening");

    axum::serve(listener, app).await.expect("Server error");
}
