/// HTTP request handlers
use crate::domain::donki::glossary;
use crate::domain::{
    CelestialBody, DonkiEventType, FetchOutcome, Health, NotificationSettingsUpdate,
};
use crate::errors::{ApiError, ApiResult};
use crate::export::{events_to_csv, CSV_FILE_NAME};
use crate::repo::{SessionRepo, WorkingSet};
use crate::services::trend::project_events;
use crate::services::{ApproachQuery, ApproachService, NotificationService, SpaceWeatherService};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub approach_service: Arc<ApproachService>,
    pub notification_service: Arc<NotificationService>,
    pub space_weather_service: Arc<SpaceWeatherService>,
    pub session: SessionRepo,
}

/// Successful response wrapper
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}

fn success(data: Value) -> Json<Value> {
    Json(json!(SuccessResponse::new(data)))
}

fn no_data() -> Json<Value> {
    success(json!({ "message": "no data" }))
}

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        now: Utc::now(),
    })
}

/// Selectable bodies and their API codes
pub async fn list_bodies() -> Json<Value> {
    let bodies: Vec<Value> = CelestialBody::ALL
        .into_iter()
        .map(|b| json!({ "name": b.display_name(), "code": b.api_code() }))
        .collect();
    success(json!({ "bodies": bodies, "default": CelestialBody::default() }))
}

/// Fetch close approaches, replace the working set and run the alert check
pub async fn fetch_approaches(
    Query(query): Query<ApproachQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let now = Utc::now();
    let (request, kind) = query.resolve(now.date_naive())?;
    let outcome = state.approach_service.fetch(&request, kind).await?;

    let events = match outcome {
        FetchOutcome::Events(events) => events,
        FetchOutcome::Empty => Vec::new(),
    };

    state
        .session
        .replace_working_set(WorkingSet {
            body: request.body,
            unit: request.unit,
            fetched_at: now,
            events: events.clone(),
        })
        .await;

    if events.is_empty() {
        return Ok(success(json!({
            "body": request.body,
            "count": 0,
            "message": "No close approaches found for the given parameters."
        })));
    }

    let notification = {
        let mut settings = state.session.lock_notifications().await;
        state
            .notification_service
            .check(&events, request.body, &mut settings, now.naive_utc())
            .await
    };

    Ok(success(json!({
        "body": request.body,
        "unit": request.unit,
        "count": events.len(),
        "events": events,
        "notification": notification,
    })))
}

/// Current working set
pub async fn get_approaches(State(state): State<AppState>) -> Json<Value> {
    match state.session.working_set().await {
        Some(set) => success(json!({
            "count": set.events.len(),
            "working_set": set,
        })),
        None => no_data(),
    }
}

/// Download the working set as CSV
pub async fn export_approaches(State(state): State<AppState>) -> Response {
    let Some(set) = state.session.working_set().await else {
        return no_data().into_response();
    };
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{CSV_FILE_NAME}\""),
            ),
        ],
        events_to_csv(&set.events),
    )
        .into_response()
}

/// Linear projection over the working set; skipped when data is insufficient
pub async fn get_projection(State(state): State<AppState>) -> Json<Value> {
    let Some(set) = state.session.working_set().await else {
        return no_data();
    };
    match project_events(&set.events) {
        Some(projection) => success(json!({
            "skipped": false,
            "body": set.body,
            "projection": projection,
        })),
        None => success(json!({
            "skipped": true,
            "reason": "at least 5 dated observations with a distance are required",
        })),
    }
}

pub async fn get_notification_settings(State(state): State<AppState>) -> Json<Value> {
    let settings = state.session.notification_state().await;
    success(json!({
        "settings": settings,
        "sink": state.notification_service.sink_name(),
    }))
}

pub async fn update_notification_settings(
    State(state): State<AppState>,
    Json(update): Json<NotificationSettingsUpdate>,
) -> ApiResult<Json<Value>> {
    let settings = {
        let mut guard = state.session.lock_notifications().await;
        guard.apply(update)?;
        guard.clone()
    };
    info!(
        enabled = settings.enabled,
        threshold_au = settings.threshold_au,
        "notification settings updated"
    );
    Ok(success(json!({ "settings": settings })))
}

pub async fn space_weather_glossary() -> Json<Value> {
    success(json!({ "glossary": glossary() }))
}

#[derive(Debug, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Per-day space-weather series for one DONKI event type
pub async fn get_space_weather(
    Path(code): Path<String>,
    Query(range): Query<DateRange>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let event = DonkiEventType::from_code(&code)
        .ok_or_else(|| ApiError::NotFound(format!("unknown space weather event '{code}'")))?;

    let end = range.end.unwrap_or_else(|| Utc::now().date_naive());
    let start = match range.start {
        Some(start) => start,
        None => end
            .checked_sub_days(Days::new(30))
            .ok_or_else(|| ApiError::InvalidInput("date range underflows".into()))?,
    };

    let report = state.space_weather_service.report(event, start, end).await?;
    Ok(match report.summary {
        Some(summary) => success(json!({ "summary": summary, "raw": report.raw })),
        None => success(json!({
            "event": event,
            "message": "No data available for the selected parameters.",
            "raw": report.raw,
        })),
    })
}
