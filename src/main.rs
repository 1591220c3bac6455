mod reaper;
mod routes;
mod services;
mod state;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let reaper_config = reaper::ReaperConfig::from_env();
    let state = state::AppState::new(Arc::new(reaper::IdleTimeout {
        max_idle: reaper_config.room_idle,
    }));

    // Spawn background room reaper.
    let _reaper = reaper::spawn_reaper_task(state.clone(), reaper_config.sweep_interval);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "inkroom listening");
    axum::serve(listener, app).await.expect("server failed");
}
