//! DONKI space-weather summaries.

use crate::clients::DonkiClient;
use crate::domain::donki::{DailyPoint, SpaceWeatherSummary};
use crate::domain::DonkiEventType;
use crate::errors::{ApiError, ApiResult};
use crate::utils::{num, parse_flexible_time};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Pick the field dates are read from: the event's own field when any record
/// has it, else the first key mentioning "date" or "time" in document order
fn resolve_date_field(
    event: DonkiEventType,
    records: &[&Map<String, Value>],
) -> (Option<String>, Option<String>) {
    let mapped = event.date_field();
    if records.iter().any(|r| r.contains_key(mapped)) {
        return (Some(mapped.to_string()), None);
    }

    let mut keys: Vec<&String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }

    match keys.into_iter().find(|k| {
        let lower = k.to_lowercase();
        lower.contains("date") || lower.contains("time")
    }) {
        Some(key) => (
            Some(key.clone()),
            Some(format!("Using '{key}' as the date field.")),
        ),
        None => (None, Some("No suitable date field found in the data.".to_string())),
    }
}

fn day_of(v: Option<&Value>) -> Option<NaiveDate> {
    v.and_then(Value::as_str)
        .and_then(parse_flexible_time)
        .map(|t| t.date())
}

fn count_per_day(records: &[&Map<String, Value>], field: &str) -> Vec<DailyPoint> {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for day in records.iter().filter_map(|r| day_of(r.get(field))) {
        *buckets.entry(day).or_insert(0.0) += 1.0;
    }
    buckets
        .into_iter()
        .map(|(date, value)| DailyPoint { date, value })
        .collect()
}

/// Mean Kp per observation day across every storm's `allKpIndex` entries
fn mean_kp_per_day(records: &[&Map<String, Value>]) -> Vec<DailyPoint> {
    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    let readings = records
        .iter()
        .filter_map(|r| r.get("allKpIndex").and_then(Value::as_array))
        .flatten();
    for reading in readings {
        let (Some(day), Some(kp)) = (
            day_of(reading.get("observedTime")),
            reading.get("kpIndex").and_then(num),
        ) else {
            continue;
        };
        let bucket = buckets.entry(day).or_insert((0.0, 0));
        bucket.0 += kp;
        bucket.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(date, (sum, n))| DailyPoint {
            date,
            value: sum / n as f64,
        })
        .collect()
}

/// Summarize a DONKI response into a per-day series.
///
/// Returns `None` when the payload is not a list or the list is empty.
pub fn summarize(
    event: DonkiEventType,
    start: NaiveDate,
    end: NaiveDate,
    payload: &Value,
) -> Option<SpaceWeatherSummary> {
    let items = payload.as_array().filter(|a| !a.is_empty())?;
    let records: Vec<&Map<String, Value>> = items.iter().filter_map(Value::as_object).collect();

    let mut warnings = Vec::new();
    let (date_field, warning) = resolve_date_field(event, &records);
    warnings.extend(warning);

    let series = match event {
        DonkiEventType::Gst => {
            if records.iter().any(|r| r.contains_key("allKpIndex")) {
                mean_kp_per_day(&records)
            } else {
                warnings.push("No 'allKpIndex' data available to plot.".to_string());
                Vec::new()
            }
        }
        _ => date_field
            .as_deref()
            .map(|f| count_per_day(&records, f))
            .unwrap_or_default(),
    };

    Some(SpaceWeatherSummary {
        event,
        name: event.display_name(),
        description: event.description(),
        y_label: event.y_label(),
        start,
        end,
        date_field,
        record_count: items.len(),
        series,
        warnings,
    })
}

/// Raw DONKI payload plus its summary, if there was anything to summarize
#[derive(Debug)]
pub struct SpaceWeatherReport {
    pub summary: Option<SpaceWeatherSummary>,
    pub raw: Value,
}

pub struct SpaceWeatherService {
    client: DonkiClient,
}

impl SpaceWeatherService {
    pub fn new(client: DonkiClient) -> Self {
        Self { client }
    }

    pub async fn report(
        &self,
        event: DonkiEventType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApiResult<SpaceWeatherReport> {
        if start > end {
            return Err(ApiError::InvalidInput(
                "end date must fall after start date".into(),
            ));
        }

        let raw = self.client.fetch_events(event, start, end).await?;
        let summary = summarize(event, start, end, &raw);
        match &summary {
            Some(s) => {
                for w in &s.warnings {
                    warn!(event = event.api_code(), "{}", w);
                }
                info!(
                    event = event.api_code(),
                    records = s.record_count,
                    days = s.series.len(),
                    "space weather summarized"
                );
            }
            None => info!(event = event.api_code(), "no space weather data"),
        }

        Ok(SpaceWeatherReport { summary, raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn range() -> (NaiveDate, NaiveDate) {
        (d(2024, 5, 1), d(2024, 5, 31))
    }

    #[test]
    fn test_summarize_non_list_and_empty() {
        let (s, e) = range();
        assert!(summarize(DonkiEventType::Flr, s, e, &json!({"error": "x"})).is_none());
        assert!(summarize(DonkiEventType::Flr, s, e, &json!([])).is_none());
    }

    #[test]
    fn test_summarize_counts_per_day() {
        let (s, e) = range();
        let payload = json!([
            {"flrID": "a", "beginTime": "2024-05-10T17:27Z"},
            {"flrID": "b", "beginTime": "2024-05-10T20:01Z"},
            {"flrID": "c", "beginTime": "2024-05-08T01:00Z"},
            {"flrID": "d", "beginTime": "garbage"}
        ]);
        let summary = summarize(DonkiEventType::Flr, s, e, &payload).unwrap();
        assert_eq!(summary.date_field.as_deref(), Some("beginTime"));
        assert_eq!(summary.record_count, 4);
        assert_eq!(
            summary.series,
            vec![
                DailyPoint { date: d(2024, 5, 8), value: 1.0 },
                DailyPoint { date: d(2024, 5, 10), value: 2.0 },
            ]
        );
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn test_summarize_falls_back_to_time_like_field() {
        let (s, e) = range();
        let payload = json!([
            {"id": 1, "observedTime": "2024-05-03T00:00Z"},
            {"id": 2, "observedTime": "2024-05-03T06:00Z"}
        ]);
        let summary = summarize(DonkiEventType::Hss, s, e, &payload).unwrap();
        assert_eq!(summary.date_field.as_deref(), Some("observedTime"));
        assert_eq!(summary.warnings, vec!["Using 'observedTime' as the date field."]);
        assert_eq!(summary.series.len(), 1);
        assert_eq!(summary.series[0].value, 2.0);
    }

    #[test]
    fn test_summarize_fallback_follows_document_order() {
        let (s, e) = range();
        let payload = json!([
            {"id": 1, "observedTime": "2024-05-03T00:00Z", "activityDate": "2024-05-20"}
        ]);
        let summary = summarize(DonkiEventType::Hss, s, e, &payload).unwrap();
        assert_eq!(summary.date_field.as_deref(), Some("observedTime"));
        assert_eq!(summary.series, vec![DailyPoint { date: d(2024, 5, 3), value: 1.0 }]);
    }

    #[test]
    fn test_summarize_without_any_date_field() {
        let (s, e) = range();
        let payload = json!([{"id": 1}]);
        let summary = summarize(DonkiEventType::Sep, s, e, &payload).unwrap();
        assert_eq!(summary.date_field, None);
        assert!(summary.series.is_empty());
        assert_eq!(summary.warnings.len(), 1);
    }

    #[test]
    fn test_summarize_gst_mean_kp() {
        let (s, e) = range();
        let payload = json!([
            {
                "gstID": "g1",
                "startTime": "2024-05-10T15:00Z",
                "allKpIndex": [
                    {"observedTime": "2024-05-10T18:00Z", "kpIndex": 7.0},
                    {"observedTime": "2024-05-10T21:00Z", "kpIndex": 9.0},
                    {"observedTime": "2024-05-11T00:00Z", "kpIndex": 8.0}
                ]
            },
            {
                "gstID": "g2",
                "startTime": "2024-05-11T03:00Z",
                "allKpIndex": [
                    {"observedTime": "2024-05-11T03:00Z", "kpIndex": 6.0}
                ]
            }
        ]);
        let summary = summarize(DonkiEventType::Gst, s, e, &payload).unwrap();
        assert_eq!(
            summary.series,
            vec![
                DailyPoint { date: d(2024, 5, 10), value: 8.0 },
                DailyPoint { date: d(2024, 5, 11), value: 7.0 },
            ]
        );
        assert_eq!(summary.y_label, "Average Kp Index");
    }

    #[test]
    fn test_summarize_gst_without_kp() {
        let (s, e) = range();
        let payload = json!([{"gstID": "g1", "startTime": "2024-05-10T15:00Z"}]);
        let summary = summarize(DonkiEventType::Gst, s, e, &payload).unwrap();
        assert!(summary.series.is_empty());
        assert_eq!(summary.warnings, vec!["No 'allKpIndex' data available to plot."]);
    }

    #[test]
    fn test_summarize_notifications() {
        let (s, e) = range();
        let payload = json!([
            {"messageType": "Report", "messageIssueTime": "2024-05-06T14:40Z"},
            {"messageType": "FLR", "messageIssueTime": "2024-05-06T15:10Z"}
        ]);
        let summary = summarize(DonkiEventType::Notifications, s, e, &payload).unwrap();
        assert_eq!(summary.date_field.as_deref(), Some("messageIssueTime"));
        assert_eq!(summary.series, vec![DailyPoint { date: d(2024, 5, 6), value: 2.0 }]);
    }
}
