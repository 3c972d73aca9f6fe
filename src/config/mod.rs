/// Application configuration module
use crate::domain::{DEFAULT_THRESHOLD_AU, MAX_THRESHOLD_AU, MIN_THRESHOLD_AU};
use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub cad_api_url: String,
    pub nasa_api_url: String,
    pub nasa_api_key: String,
    pub http_timeout_seconds: u64,
    pub notify_threshold_au: f64,
    pub smtp: Option<SmtpConfig>,
}

/// Outbound mail settings; absent when `SMTP_HOST` is unset
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let cad_api_url = env::var("CAD_API_URL")
            .unwrap_or_else(|_| "https://ssd-api.jpl.nasa.gov/cad.api".to_string());

        let nasa_api_url =
            env::var("NASA_API_URL").unwrap_or_else(|_| "https://api.nasa.gov".to_string());

        let nasa_api_key = env::var("NASA_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "DEMO_KEY".to_string());

        let notify_threshold_au = threshold_from(env::var("NOTIFY_THRESHOLD_AU").ok())?;

        let smtp = env::var("SMTP_HOST")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|host| SmtpConfig {
                host,
                port: env::var("SMTP_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(587),
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from: env::var("SMTP_FROM")
                    .unwrap_or_else(|_| "notifications@neo-tracker.local".to_string()),
            });

        Ok(Self {
            bind_addr,
            cad_api_url,
            nasa_api_url,
            nasa_api_key,
            http_timeout_seconds: env_u64("HTTP_TIMEOUT_SECONDS", 30),
            notify_threshold_au,
            smtp,
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Default alert threshold; a set value must parse and lie in the allowed range
fn threshold_from(raw: Option<String>) -> anyhow::Result<f64> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(DEFAULT_THRESHOLD_AU);
    };
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("NOTIFY_THRESHOLD_AU is not a number: {raw:?}"))?;
    if !(MIN_THRESHOLD_AU..=MAX_THRESHOLD_AU).contains(&value) {
        anyhow::bail!(
            "NOTIFY_THRESHOLD_AU must be between {MIN_THRESHOLD_AU} and {MAX_THRESHOLD_AU}, got {value}"
        );
    }
    Ok(value)
}
