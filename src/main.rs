use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use glowwax::config::{AppConfig, BackendMode};
use glowwax::db;
use glowwax::handlers;
use glowwax::services::auth::{CachedTokenProvider, ClientCredentialsProvider, TokenProvider};
use glowwax::services::backend::mock::MockLatency;
use glowwax::services::backend::{BookingBackend, HttpBackend, MockBackend};
use glowwax::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    let schedule = config.slot_schedule()?;

    let conn = db::init_db(&config.database_url)?;

    if config.auth_api_base_url.is_empty() {
        tracing::warn!("AUTH_API_BASE_URL is not set, token exchange will fail");
    }
    let tokens: Arc<dyn TokenProvider> = Arc::new(CachedTokenProvider::new(
        Box::new(ClientCredentialsProvider::new(
            config.auth_api_base_url.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        )),
        Arc::new(Mutex::new(conn)),
    ));

    let backend: Box<dyn BookingBackend> = match config.backend {
        BackendMode::Http => {
            anyhow::ensure!(
                !config.api_base_url.is_empty(),
                "API_BASE_URL must be set when BACKEND=http"
            );
            tracing::info!(
                "using HTTP backend (url: {}, tenant: {}, location: {})",
                config.api_base_url,
                config.tenant_id,
                config.location_id
            );
            Box::new(HttpBackend::new(
                config.api_base_url.clone(),
                config.tenant_id.clone(),
                config.location_id.clone(),
                Arc::clone(&tokens),
            ))
        }
        BackendMode::Mock => {
            tracing::info!(latency = config.mock_latency, "using mock backend");
            let latency = if config.mock_latency {
                MockLatency::default()
            } else {
                MockLatency::none()
            };
            Box::new(
                MockBackend::new(schedule)
                    .with_latency(latency)
                    .with_availability(config.slot_availability),
            )
        }
    };

    let state = Arc::new(AppState::new(config.clone(), tokens, backend));
    if !state.initialize().await {
        tracing::error!("booking flow disabled: failed to initialize the application");
    }

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
