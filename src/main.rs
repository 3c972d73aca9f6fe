/// Close-approach tracker and space-weather service entry point
mod clients;
mod config;
mod domain;
mod errors;
mod export;
mod handlers;
mod repo;
mod routes;
mod services;
mod utils;

use crate::clients::{CadClient, DonkiClient, LogMailer, NotificationSink, SmtpMailer};
use crate::config::AppConfig;
use crate::domain::NotificationState;
use crate::handlers::AppState;
use crate::repo::SessionRepo;
use crate::routes::build_router;
use crate::services::{ApproachService, NotificationService, SpaceWeatherService};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Configuration loaded successfully");

    // Initialize clients
    let cad_client = CadClient::new(config.cad_api_url.clone(), config.http_timeout_seconds)?;
    let donki_client = DonkiClient::new(
        config.nasa_api_url.clone(),
        config.nasa_api_key.clone(),
        config.http_timeout_seconds,
    )?;

    let sink: Arc<dyn NotificationSink> = match &config.smtp {
        Some(smtp) => {
            info!(host = %smtp.host, port = smtp.port, "SMTP delivery enabled");
            Arc::new(SmtpMailer::new(smtp)?)
        }
        None => {
            warn!("SMTP_HOST not set; alerts will only be logged");
            Arc::new(LogMailer)
        }
    };

    // Initialize application state
    let state = AppState {
        approach_service: Arc::new(ApproachService::new(cad_client)),
        notification_service: Arc::new(NotificationService::new(sink)),
        space_weather_service: Arc::new(SpaceWeatherService::new(donki_client)),
        session: SessionRepo::new(NotificationState::with_threshold(
            config.notify_threshold_au,
        )),
    };

    // Build router
    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("neo_tracker service listening on {}", config.bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
