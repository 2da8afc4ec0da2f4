mod config;
mod error;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use services::firebase::FirebaseIdentity;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::AppConfig::from_env().expect("invalid configuration");
    let port = config.port;

    let identity = FirebaseIdentity::new(config.identity.clone());
    if !identity.is_configured() {
        tracing::warn!("FIREBASE_API_KEY not set; server-side sign-in methods will be unavailable");
    }
    let state = state::AppState::new(config, Arc::new(identity));

    // Spawn background eviction of idle page views.
    let _sweeper = services::views::spawn_sweeper_task(state.clone());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "taskboard listening");
    axum::serve(listener, app).await.expect("server failed");
}
