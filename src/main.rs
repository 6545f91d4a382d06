use anno_store_form::{config, handlers::rest, service::AnnoStore, transport::ReqwestTransport};

use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt::init();

    // Load config
    let cfg = config::load_config().expect("failed to locate or load config file");
    tracing::info!("Successfully loaded anno-store form config");

    match cfg.endpoint.as_deref() {
        Some(endpoint) => tracing::info!("Configured endpoint: {}", endpoint),
        None => tracing::warn!("No endpoint configured, the form will ask for one"),
    }

    // Form setup
    let transport = ReqwestTransport::new().expect("failed to create HTTP client");
    let store = Arc::new(AnnoStore::new(cfg.endpoint, Arc::new(transport)));

    let router = rest::router(store);

    // Start server
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", cfg.port))
        .await
        .expect("Failed to bind to address");
    let addr = listener.local_addr().expect("listener has no local address");

    tracing::info!("Annotation form listening on http://{}", addr);

    axum::serve(listener, router)
        .await
        .expect("Failed to start server");
}
