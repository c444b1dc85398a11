//! SignPad signature server binary.

use signpad_server::{AppState, ServerConfig, router};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signpad_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let app = router(Arc::new(AppState::new()));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("SignPad server listening on {}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}
