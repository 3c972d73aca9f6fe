/// External API clients module
use crate::domain::{CadPayload, CelestialBody, DistanceUnit, DonkiEventType};
use crate::errors::{ApiError, ApiResult};
use chrono::NaiveDate;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub mod mailer;

pub use mailer::{LogMailer, NotificationSink, SmtpMailer};

/// HTTP client wrapper with common configuration
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout_seconds: u64) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent("neo-tracker/1.0")
            .build()?;
        Ok(Self { client })
    }

    pub fn get_client(&self) -> &Client {
        &self.client
    }
}

/// Turn a non-success status into an upstream error carrying the response text
async fn ensure_success(resp: Response) -> ApiResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::Upstream {
        status: status.as_u16(),
        body,
    })
}

/// Population flag sent to the close-approach API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Population {
    Neo,
    Comet,
}

/// Parameters of one close-approach request
#[derive(Debug, Clone)]
pub struct CadRequest {
    pub body: CelestialBody,
    pub date_min: NaiveDate,
    pub date_max: NaiveDate,
    pub dist_max: String,
    pub unit: DistanceUnit,
    pub limit: u32,
}

impl CadRequest {
    pub fn query_params(&self, population: Population) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("body", self.body.api_code().to_string()),
            ("date-min", self.date_min.format("%Y-%m-%d").to_string()),
            ("date-max", self.date_max.format("%Y-%m-%d").to_string()),
            ("dist-max", format!("{}{}", self.dist_max, self.unit.suffix())),
            ("limit", self.limit.to_string()),
        ];
        match population {
            Population::Neo => params.push(("neo", "true".to_string())),
            Population::Comet => params.push(("comet", "true".to_string())),
        }
        params
    }
}

/// JPL SBDB close-approach data client
pub struct CadClient {
    http_client: HttpClient,
    base_url: String,
}

impl CadClient {
    pub fn new(base_url: String, timeout_seconds: u64) -> ApiResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(timeout_seconds)?,
            base_url,
        })
    }

    /// Fetch close approaches for one population
    pub async fn fetch_close_approaches(
        &self,
        request: &CadRequest,
        population: Population,
    ) -> ApiResult<CadPayload> {
        let params = request.query_params(population);
        debug!(?params, "requesting close approaches");

        let resp = self
            .http_client
            .get_client()
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?;

        let payload = ensure_success(resp).await?.json().await?;
        Ok(payload)
    }
}

/// NASA DONKI space-weather client
pub struct DonkiClient {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
}

impl DonkiClient {
    pub fn new(base_url: String, api_key: String, timeout_seconds: u64) -> ApiResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(timeout_seconds)?,
            base_url,
            api_key,
        })
    }

    fn url(&self, event: DonkiEventType) -> String {
        format!(
            "{}/DONKI/{}",
            self.base_url.trim_end_matches('/'),
            event.api_code()
        )
    }

    /// Fetch raw DONKI records for an event type and date range
    pub async fn fetch_events(
        &self,
        event: DonkiEventType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApiResult<Value> {
        let mut params: Vec<(&str, String)> = vec![
            ("startDate", start.format("%Y-%m-%d").to_string()),
            ("endDate", end.format("%Y-%m-%d").to_string()),
            ("api_key", self.api_key.clone()),
        ];
        params.extend(
            event
                .extra_params()
                .iter()
                .map(|(k, v)| (*k, v.to_string())),
        );

        let resp = self
            .http_client
            .get_client()
            .get(self.url(event))
            .query(&params)
            .send()
            .await?;

        let json = ensure_success(resp).await?.json().await?;
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CadRequest {
        CadRequest {
            body: CelestialBody::Jupiter,
            date_min: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            date_max: NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
            dist_max: "10".into(),
            unit: DistanceUnit::Ld,
            limit: 50,
        }
    }

    #[test]
    fn test_cad_query_params_neo() {
        let params = request().query_params(Population::Neo);
        assert!(params.contains(&("body", "Juptr".to_string())));
        assert!(params.contains(&("date-min", "2025-01-01".to_string())));
        assert!(params.contains(&("date-max", "2025-03-02".to_string())));
        assert!(params.contains(&("dist-max", "10LD".to_string())));
        assert!(params.contains(&("limit", "50".to_string())));
        assert!(params.contains(&("neo", "true".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "comet"));
    }

    #[test]
    fn test_cad_query_params_comet() {
        let params = request().query_params(Population::Comet);
        assert!(params.contains(&("comet", "true".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "neo"));
    }

    #[test]
    fn test_donki_url_trims_slash() {
        let client =
            DonkiClient::new("https://api.nasa.gov/".into(), "DEMO_KEY".into(), 5).unwrap();
        assert_eq!(
            client.url(DonkiEventType::Notifications),
            "https://api.nasa.gov/DONKI/notifications"
        );
    }
}
