use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use threadlens::api::ApiContext;
use threadlens::{api, config, AnalysisConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let ctx = ApiContext::new(AnalysisConfig::default());
    let app = api::analysis_router(ctx);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Cannot bind server port");
    tracing::info!("listening on {addr}");

    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
