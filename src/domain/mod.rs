/// Domain models for the application
use crate::errors::{ApiError, ApiResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod donki;

pub use donki::DonkiEventType;

/// Bodies the close-approach API can be queried against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CelestialBody {
    Mercury,
    Venus,
    #[default]
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Moon,
}

impl CelestialBody {
    pub const ALL: [CelestialBody; 9] = [
        CelestialBody::Mercury,
        CelestialBody::Venus,
        CelestialBody::Earth,
        CelestialBody::Mars,
        CelestialBody::Jupiter,
        CelestialBody::Saturn,
        CelestialBody::Uranus,
        CelestialBody::Neptune,
        CelestialBody::Moon,
    ];

    /// Code understood by the `body` parameter of the CAD API
    pub fn api_code(self) -> &'static str {
        match self {
            CelestialBody::Mercury => "Merc",
            CelestialBody::Venus => "Venus",
            CelestialBody::Earth => "Earth",
            CelestialBody::Mars => "Mars",
            CelestialBody::Jupiter => "Juptr",
            CelestialBody::Saturn => "Satrn",
            CelestialBody::Uranus => "Urnus",
            CelestialBody::Neptune => "Neptn",
            CelestialBody::Moon => "Moon",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CelestialBody::Mercury => "Mercury",
            CelestialBody::Venus => "Venus",
            CelestialBody::Earth => "Earth",
            CelestialBody::Mars => "Mars",
            CelestialBody::Jupiter => "Jupiter",
            CelestialBody::Saturn => "Saturn",
            CelestialBody::Uranus => "Uranus",
            CelestialBody::Neptune => "Neptune",
            CelestialBody::Moon => "Moon",
        }
    }
}

/// Which small-body population to request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectKind {
    #[default]
    #[serde(rename = "NEO")]
    Neo,
    Comet,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[default]
    #[serde(rename = "AU")]
    Au,
    #[serde(rename = "LD")]
    Ld,
}

impl DistanceUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            DistanceUnit::Au => "AU",
            DistanceUnit::Ld => "LD",
        }
    }

    /// Default `dist-max` value for this unit
    pub fn default_max(self) -> &'static str {
        match self {
            DistanceUnit::Au => "0.05",
            DistanceUnit::Ld => "10",
        }
    }
}

/// Raw close-approach payload: `{count, fields, data}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CadPayload {
    /// The API sends this as a string; parsed permissively
    #[serde(default)]
    pub count: Option<Value>,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

/// Approach timestamp; rows whose date cannot be parsed keep the raw text
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ApproachTime {
    Valid(NaiveDateTime),
    Invalid(String),
}

impl ApproachTime {
    pub fn valid(&self) -> Option<NaiveDateTime> {
        match self {
            ApproachTime::Valid(t) => Some(*t),
            ApproachTime::Invalid(_) => None,
        }
    }
}

/// One normalized close-approach row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloseApproachEvent {
    pub designation: String,
    pub close_approach_time: ApproachTime,
    /// NaN when absent or unparseable
    pub distance_au: f64,
    pub relative_velocity: Option<f64>,
    pub infinity_velocity: Option<f64>,
}

/// Result of a close-approach fetch once normalized
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Events(Vec<CloseApproachEvent>),
    Empty,
}

impl FetchOutcome {
    pub fn into_events(self) -> Vec<CloseApproachEvent> {
        match self {
            FetchOutcome::Events(events) => events,
            FetchOutcome::Empty => Vec::new(),
        }
    }
}

pub const MIN_THRESHOLD_AU: f64 = 0.0001;
pub const MAX_THRESHOLD_AU: f64 = 1.0;
pub const DEFAULT_THRESHOLD_AU: f64 = 0.02;

/// Alert settings plus the dedup watermark, owned by the session
#[derive(Debug, Clone, Serialize)]
pub struct NotificationState {
    pub enabled: bool,
    pub recipient: String,
    pub threshold_au: f64,
    last_notified_at: Option<NaiveDateTime>,
}

impl Default for NotificationState {
    fn default() -> Self {
        Self::with_threshold(DEFAULT_THRESHOLD_AU)
    }
}

/// Partial settings update; absent fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationSettingsUpdate {
    pub recipient: Option<String>,
    pub threshold_au: Option<f64>,
    pub enabled: Option<bool>,
}

impl NotificationState {
    pub fn with_threshold(threshold_au: f64) -> Self {
        Self {
            enabled: false,
            recipient: String::new(),
            threshold_au,
            last_notified_at: None,
        }
    }

    /// Enabled and pointed at a destination
    pub fn is_active(&self) -> bool {
        self.enabled && !self.recipient.trim().is_empty()
    }

    pub fn last_notified_at(&self) -> Option<NaiveDateTime> {
        self.last_notified_at
    }

    /// Advance the watermark after a confirmed delivery. Never moves backwards.
    pub fn record_delivery(&mut self, at: NaiveDateTime) {
        self.last_notified_at = Some(match self.last_notified_at {
            Some(prev) if prev > at => prev,
            _ => at,
        });
    }

    pub fn apply(&mut self, update: NotificationSettingsUpdate) -> ApiResult<()> {
        if let Some(threshold) = update.threshold_au {
            if !(MIN_THRESHOLD_AU..=MAX_THRESHOLD_AU).contains(&threshold) {
                return Err(ApiError::InvalidInput(format!(
                    "threshold_au must be between {MIN_THRESHOLD_AU} and {MAX_THRESHOLD_AU}"
                )));
            }
            self.threshold_au = threshold;
        }
        if let Some(recipient) = update.recipient {
            self.recipient = recipient.trim().to_string();
        }
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        Ok(())
    }
}

/// Least-squares line over (ordinal day, distance)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendModel {
    pub slope: f64,
    pub intercept: f64,
    /// Half of the sample standard deviation of observed distances. A fixed
    /// heuristic width, not a statistical confidence interval.
    pub error_band: f64,
    pub point_count: usize,
}

impl TrendModel {
    pub fn predict(&self, ordinal_day: i64) -> f64 {
        self.slope * ordinal_day as f64 + self.intercept
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedSample {
    pub date: NaiveDateTime,
    pub predicted_distance: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Trend projection over the current working set
#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    pub model: TrendModel,
    pub last_observed: NaiveDateTime,
    pub samples: Vec<ProjectedSample>,
    pub note: &'static str,
}

/// Health check response
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub now: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_body_codes() {
        assert_eq!(CelestialBody::Jupiter.api_code(), "Juptr");
        assert_eq!(CelestialBody::Mercury.api_code(), "Merc");
        assert_eq!(CelestialBody::default(), CelestialBody::Earth);
        assert_eq!(CelestialBody::ALL.len(), 9);
    }

    #[test]
    fn test_object_kind_deserializes_display_names() {
        let kind: ObjectKind = serde_json::from_value(serde_json::json!("NEO")).unwrap();
        assert_eq!(kind, ObjectKind::Neo);
        let unit: DistanceUnit = serde_json::from_value(serde_json::json!("LD")).unwrap();
        assert_eq!(unit, DistanceUnit::Ld);
        assert_eq!(unit.default_max(), "10");
    }

    #[test]
    fn test_notification_state_defaults() {
        let state = NotificationState::default();
        assert!(!state.enabled);
        assert!(state.recipient.is_empty());
        assert_eq!(state.threshold_au, 0.02);
        assert_eq!(state.last_notified_at(), None);
        assert!(!state.is_active());
    }

    #[test]
    fn test_watermark_never_moves_backwards() {
        let mut state = NotificationState::default();
        state.record_delivery(at(10));
        state.record_delivery(at(5));
        assert_eq!(state.last_notified_at(), Some(at(10)));
        state.record_delivery(at(12));
        assert_eq!(state.last_notified_at(), Some(at(12)));
    }

    #[test]
    fn test_apply_rejects_out_of_range_threshold() {
        let mut state = NotificationState::default();
        let result = state.apply(NotificationSettingsUpdate {
            threshold_au: Some(0.0),
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(state.threshold_au, 0.02);
    }

    #[test]
    fn test_apply_partial_update() {
        let mut state = NotificationState::default();
        state
            .apply(NotificationSettingsUpdate {
                recipient: Some("  watcher@example.com ".into()),
                enabled: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(state.recipient, "watcher@example.com");
        assert!(state.is_active());
        assert_eq!(state.threshold_au, 0.02);
    }

    #[test]
    fn test_absent_distance_serializes_as_null() {
        let event = CloseApproachEvent {
            designation: "2024 XY".into(),
            close_approach_time: ApproachTime::Invalid("garbage".into()),
            distance_au: f64::NAN,
            relative_velocity: None,
            infinity_velocity: Some(3.2),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json["distance_au"].is_null());
        assert_eq!(json["close_approach_time"]["status"], "invalid");
        assert_eq!(json["close_approach_time"]["value"], "garbage");
    }
}
