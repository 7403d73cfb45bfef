mod articles;
mod config;
mod knowledge;
mod llm;
mod memory;
mod prompts;
mod routes;
mod state;
mod team;
mod uploads;
mod utils;

use anyhow::Result;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "portfolio_backend=debug,tower_http=debug".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    // Ensure directories exist
    std::fs::create_dir_all(&config.upload_dir)?;
    std::fs::create_dir_all("tmp")?;

    info!("Initialized directories");

    let app_state = AppState::new(config.clone()).await?;

    let app = Router::new()
        .merge(routes::create_routes())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
