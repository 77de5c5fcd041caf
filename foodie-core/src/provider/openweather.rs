use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{http::truncate_body, model::WeatherSummary};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Weather lookups are cut off after this long.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self { api_key, base_url: base_url.trim_end_matches('/').to_string(), http })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather(&self, city: &str) -> Result<WeatherSummary> {
        let url = format!("{}/weather", self.base_url);
        debug!(city, "requesting current weather");

        let res = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .context("Failed to send request to OpenWeather (current weather)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather current response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather current request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: OwCurrentResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather current JSON")?;

        let condition = parsed
            .weather
            .first()
            .map(|w| w.main.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(WeatherSummary {
            location_name: parsed.name,
            condition,
            temperature_c: parsed.main.temp,
            observed_at: DateTime::from_timestamp(parsed.dt, 0).unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const PARIS: &str = r#"{
        "name": "Paris",
        "dt": 1760000000,
        "main": {"temp": 17.3, "feels_like": 16.9, "humidity": 71},
        "weather": [{"main": "Clouds", "description": "broken clouds"}],
        "wind": {"speed": 3.1}
    }"#;

    #[tokio::test]
    async fn parses_current_weather() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/weather")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "Paris".into()),
                Matcher::UrlEncoded("appid".into(), "KEY".into()),
                Matcher::UrlEncoded("units".into(), "metric".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PARIS)
            .create_async()
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), &server.url()).unwrap();
        let weather = provider.get_weather("Paris").await.unwrap();

        mock.assert_async().await;
        assert_eq!(weather.location_name, "Paris");
        assert_eq!(weather.condition, "Clouds");
        assert!((weather.temperature_c - 17.3).abs() < f64::EPSILON);
        assert_eq!(weather.observed_at.timestamp(), 1_760_000_000);
    }

    #[tokio::test]
    async fn http_error_is_reported_with_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/weather")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"cod":"404","message":"city not found"}"#)
            .create_async()
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), &server.url()).unwrap();
        let err = provider.get_weather("Atlantis").await.unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("city not found"));
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/weather")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), &server.url()).unwrap();
        let err = provider.get_weather("Paris").await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse OpenWeather current JSON"));
    }
}
