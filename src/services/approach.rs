//! Close-approach feed processing: normalization, alert selection and formatting.

use crate::clients::{CadClient, CadRequest, Population};
use crate::domain::{
    ApproachTime, CadPayload, CelestialBody, CloseApproachEvent, DistanceUnit, FetchOutcome,
    NotificationState, ObjectKind,
};
use crate::errors::{ApiError, ApiResult};
use crate::utils::{num, parse_cad_time};
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, warn};

const DEFAULT_DAYS: u32 = 60;
const MAX_DAYS: u32 = 36_525;
const DEFAULT_LIMIT: u32 = 100;
const MAX_LIMIT: u32 = 1000;

/// Convert field-aligned rows into events, preserving row order.
///
/// Rows whose `cd` cannot be parsed are kept with an invalid time. Numeric
/// cells that fail to parse become absent (NaN for the distance).
pub fn normalize(raw_records: &[Vec<Value>], field_names: &[String]) -> Vec<CloseApproachEvent> {
    let idx = |name: &str| field_names.iter().position(|f| f == name);
    let des_idx = idx("des");
    let cd_idx = idx("cd");
    let dist_idx = idx("dist");
    let v_rel_idx = idx("v_rel");
    let v_inf_idx = idx("v_inf");

    let mut invalid_dates = 0usize;
    let events: Vec<CloseApproachEvent> = raw_records
        .iter()
        .map(|row| {
            let cell = |i: Option<usize>| i.and_then(|i| row.get(i));

            let designation = match cell(des_idx) {
                Some(Value::String(s)) => s.trim().to_string(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };

            let raw_time = cell(cd_idx).and_then(Value::as_str).unwrap_or_default();
            let close_approach_time = match parse_cad_time(raw_time) {
                Some(t) => ApproachTime::Valid(t),
                None => {
                    invalid_dates += 1;
                    ApproachTime::Invalid(raw_time.to_string())
                }
            };

            CloseApproachEvent {
                designation,
                close_approach_time,
                distance_au: cell(dist_idx).and_then(num).unwrap_or(f64::NAN),
                relative_velocity: cell(v_rel_idx).and_then(num),
                infinity_velocity: cell(v_inf_idx).and_then(num),
            }
        })
        .collect();

    if invalid_dates > 0 {
        warn!(invalid_dates, "close-approach rows with unparseable dates");
    }
    events
}

/// Normalize a whole response. A missing payload or a zero count is an empty result.
pub fn normalize_payload(payload: Option<CadPayload>) -> FetchOutcome {
    let Some(payload) = payload else {
        return FetchOutcome::Empty;
    };
    let count = payload.count.as_ref().and_then(num).unwrap_or(0.0);
    if count <= 0.0 || payload.data.is_empty() {
        return FetchOutcome::Empty;
    }
    FetchOutcome::Events(normalize(&payload.data, &payload.fields))
}

fn row_key(e: &CloseApproachEvent) -> (String, String, u64, Option<u64>, Option<u64>) {
    let time = match &e.close_approach_time {
        ApproachTime::Valid(t) => t.to_string(),
        ApproachTime::Invalid(raw) => format!("invalid:{raw}"),
    };
    (
        e.designation.clone(),
        time,
        e.distance_au.to_bits(),
        e.relative_velocity.map(f64::to_bits),
        e.infinity_velocity.map(f64::to_bits),
    )
}

/// Concatenate two result sets and drop exact duplicate rows, keeping the first
pub fn merge_unique(
    first: Vec<CloseApproachEvent>,
    second: Vec<CloseApproachEvent>,
) -> Vec<CloseApproachEvent> {
    let mut seen = HashSet::new();
    first
        .into_iter()
        .chain(second)
        .filter(|e| seen.insert(row_key(e)))
        .collect()
}

/// Events that should trigger an alert, in input order.
///
/// Returns nothing when notifications are disabled or have no recipient.
/// Otherwise keeps events strictly after `now`, then within the threshold,
/// then strictly after the last-notified watermark.
pub fn select_notifiable(
    events: &[CloseApproachEvent],
    state: &NotificationState,
    now: NaiveDateTime,
) -> Vec<CloseApproachEvent> {
    if !state.is_active() {
        return Vec::new();
    }

    let watermark = state.last_notified_at();
    events
        .iter()
        .filter(|e| matches!(e.close_approach_time.valid(), Some(t) if t > now))
        .filter(|e| e.distance_au <= state.threshold_au)
        .filter(|e| match (watermark, e.close_approach_time.valid()) {
            (Some(w), Some(t)) => t > w,
            _ => true,
        })
        .cloned()
        .collect()
}

/// What an alert is about
#[derive(Debug, Clone, Copy)]
pub struct AlertContext<'a> {
    pub body_name: &'a str,
    pub threshold_au: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub subject: String,
    pub body: String,
}

fn fmt_value(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => x.to_string(),
        _ => "n/a".to_string(),
    }
}

/// Build the subject and plain-text body for a batch of qualifying events
pub fn format_alert(events: &[CloseApproachEvent], ctx: AlertContext<'_>) -> Alert {
    let subject = format!(
        "Close Approach Alert: {} events near {}",
        events.len(),
        ctx.body_name
    );

    let mut body = format!(
        "Close Approach Alert for {}:\n\nThe following celestial objects will make close approaches within {} AU:\n",
        ctx.body_name, ctx.threshold_au
    );
    for e in events {
        let when = match &e.close_approach_time {
            ApproachTime::Valid(t) => t.format("%Y-%m-%d %H:%M").to_string(),
            ApproachTime::Invalid(raw) => raw.clone(),
        };
        body.push_str(&format!(
            "\n- {} on {}\n  Distance: {} AU\n  Velocity: {} km/s\n",
            e.designation,
            when,
            fmt_value(Some(e.distance_au)),
            fmt_value(e.relative_velocity)
        ));
    }
    body.push_str("\n\nThis is an automated notification from the NEO/Comet Tracker.");

    Alert { subject, body }
}

/// Query parameters of a close-approach fetch
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApproachQuery {
    pub body: Option<CelestialBody>,
    pub date_min: Option<NaiveDate>,
    /// Days after `date_min`; ignored when `date_max` is given
    pub days: Option<u32>,
    pub date_max: Option<NaiveDate>,
    pub dist_max: Option<String>,
    pub unit: Option<DistanceUnit>,
    pub kind: Option<ObjectKind>,
    pub limit: Option<u32>,
}

impl ApproachQuery {
    /// Validate and fill defaults
    pub fn resolve(&self, today: NaiveDate) -> ApiResult<(CadRequest, ObjectKind)> {
        let date_min = self.date_min.unwrap_or(today);
        let earliest = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN);
        let latest = NaiveDate::from_ymd_opt(2100, 12, 31).unwrap_or(NaiveDate::MAX);
        if date_min < earliest || date_min > latest {
            return Err(ApiError::InvalidInput(
                "date_min must be between 1900-01-01 and 2100-12-31".into(),
            ));
        }

        let date_max = match self.date_max {
            Some(d) if d < date_min => {
                return Err(ApiError::InvalidInput(
                    "date_max must not be before date_min".into(),
                ))
            }
            Some(d) => d,
            None => {
                let days = self.days.unwrap_or(DEFAULT_DAYS);
                if !(1..=MAX_DAYS).contains(&days) {
                    return Err(ApiError::InvalidInput(format!(
                        "days must be between 1 and {MAX_DAYS}"
                    )));
                }
                date_min
                    .checked_add_days(Days::new(u64::from(days)))
                    .ok_or_else(|| ApiError::InvalidInput("date range overflows".into()))?
            }
        };
        if date_max > latest {
            return Err(ApiError::InvalidInput(
                "date_max must not be after 2100-12-31".into(),
            ));
        }

        let unit = self.unit.unwrap_or_default();
        let dist_max = self
            .dist_max
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(unit.default_max())
            .to_string();
        match dist_max.parse::<f64>() {
            Ok(d) if d > 0.0 && d.is_finite() => {}
            _ => {
                return Err(ApiError::InvalidInput(format!(
                    "dist_max must be a positive number, got {dist_max:?}"
                )))
            }
        }

        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(ApiError::InvalidInput(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }

        Ok((
            CadRequest {
                body: self.body.unwrap_or_default(),
                date_min,
                date_max,
                dist_max,
                unit,
                limit,
            },
            self.kind.unwrap_or_default(),
        ))
    }
}

/// Close-approach fetch service
pub struct ApproachService {
    client: CadClient,
}

impl ApproachService {
    pub fn new(client: CadClient) -> Self {
        Self { client }
    }

    async fn fetch_population(
        &self,
        request: &CadRequest,
        population: Population,
    ) -> ApiResult<Vec<CloseApproachEvent>> {
        let payload = self.client.fetch_close_approaches(request, population).await?;
        Ok(normalize_payload(Some(payload)).into_events())
    }

    /// Fetch and normalize close approaches for the requested object kind
    pub async fn fetch(&self, request: &CadRequest, kind: ObjectKind) -> ApiResult<FetchOutcome> {
        let events = match kind {
            ObjectKind::Neo => self.fetch_population(request, Population::Neo).await?,
            ObjectKind::Comet => self.fetch_population(request, Population::Comet).await?,
            ObjectKind::Both => {
                let neos = self.fetch_population(request, Population::Neo).await?;
                let comets = self.fetch_population(request, Population::Comet).await?;
                merge_unique(neos, comets)
            }
        };

        info!(
            body = request.body.display_name(),
            ?kind,
            count = events.len(),
            "close approaches fetched"
        );

        if events.is_empty() {
            Ok(FetchOutcome::Empty)
        } else {
            Ok(FetchOutcome::Events(events))
        }
    }
}
