/// Application routes configuration
use crate::handlers::{
    export_approaches, fetch_approaches, get_approaches, get_notification_settings,
    get_projection, get_space_weather, health, list_bodies, space_weather_glossary,
    update_notification_settings, AppState,
};
use axum::{routing::get, Router};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Close approaches
        .route("/bodies", get(list_bodies))
        .route("/approaches", get(get_approaches))
        .route("/approaches/fetch", get(fetch_approaches))
        .route("/approaches/export.csv", get(export_approaches))
        .route("/approaches/projection", get(get_projection))
        // Alert settings
        .route(
            "/notifications/settings",
            get(get_notification_settings).post(update_notification_settings),
        )
        // Space weather
        .route("/space-weather/glossary", get(space_weather_glossary))
        .route("/space-weather/:event", get(get_space_weather))
        .with_state(state)
}
