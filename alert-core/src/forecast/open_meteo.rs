use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::model::{ForecastSnapshot, HourlyEntry};

use super::ForecastProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Open-Meteo forecast client. No API key required.
///
/// Requests hourly temperature/weather-code series plus the daily maximum
/// temperature in the target location's civil time zone, so timestamps in
/// the response line up with local wall-clock time.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    latitude: f64,
    longitude: f64,
    timezone: String,
    forecast_days: u8,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(latitude: f64, longitude: f64, timezone: String, forecast_days: u8) -> Result<Self> {
        Self::with_base_url(
            DEFAULT_BASE_URL.to_string(),
            latitude,
            longitude,
            timezone,
            forecast_days,
        )
    }

    /// Like [`new`](Self::new) with an explicit base URL, so tests can point
    /// at a mock server.
    pub fn with_base_url(
        base_url: String,
        latitude: f64,
        longitude: f64,
        timezone: String,
        forecast_days: u8,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build forecast HTTP client")?;

        Ok(Self {
            base_url,
            latitude,
            longitude,
            timezone,
            forecast_days,
            http,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    weather_code: Vec<u16>,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    #[serde(default)]
    temperature_2m_max: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    hourly: Option<OmHourly>,
    daily: Option<OmDaily>,
}

#[async_trait]
impl ForecastProvider for OpenMeteoProvider {
    async fn fetch(&self) -> Result<ForecastSnapshot> {
        let url = format!("{}/v1/forecast", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", self.latitude.to_string()),
                ("longitude", self.longitude.to_string()),
                ("hourly", "temperature_2m,weather_code".to_string()),
                ("daily", "temperature_2m_max".to_string()),
                ("timezone", self.timezone.clone()),
                ("forecast_days", self.forecast_days.to_string()),
            ])
            .send()
            .await
            .context("Failed to send request to Open-Meteo")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read Open-Meteo response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Open-Meteo request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: OmResponse =
            serde_json::from_str(&body).context("Failed to parse Open-Meteo JSON")?;

        let daily_max_temperature = parsed
            .daily
            .and_then(|d| d.temperature_2m_max.first().copied());

        // time and weather_code are parallel arrays; zip guards against a
        // length mismatch by stopping at the shorter one.
        let mut hourly = Vec::new();
        if let Some(h) = parsed.hourly {
            for (time, code) in h.time.iter().zip(h.weather_code.iter()) {
                let time = parse_local_time(time)
                    .with_context(|| format!("Unparseable hourly timestamp: {time}"))?;
                hourly.push(HourlyEntry {
                    time,
                    weather_code: *code,
                });
            }
        }

        Ok(ForecastSnapshot {
            daily_max_temperature,
            hourly,
        })
    }
}

/// Open-Meteo emits local civil timestamps without a UTC offset, usually
/// minute precision ("2026-08-30T18:00").
fn parse_local_time(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(Into::into)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    // Walk back to a char boundary so multibyte bodies cannot panic the slice.
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
