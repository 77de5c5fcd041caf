use crate::{Config, Credentials, model::WeatherSummary, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Current-conditions lookup by city name.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, city: &str) -> anyhow::Result<WeatherSummary>;
}

/// Construct the weather provider from config and the resolved key.
pub fn weather_provider_from_config(
    config: &Config,
    credentials: &Credentials,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let provider = OpenWeatherProvider::with_base_url(
        credentials.weather_api_key.clone(),
        &config.weather.base_url,
    )?;
    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_uses_resolved_credentials() {
        let mut cfg = Config::default();
        cfg.weather.api_key = Some("W".to_string());
        cfg.ai.api_key = Some("A".to_string());
        let creds = cfg.credentials().unwrap();

        assert!(weather_provider_from_config(&cfg, &creds).is_ok());
    }

    #[test]
    fn provider_from_config_accepts_custom_base_url() {
        let mut cfg = Config::default();
        cfg.weather.base_url = "http://localhost:1234/".to_string();
        let creds = Credentials { weather_api_key: "W".into(), ai_api_key: "A".into() };

        assert!(weather_provider_from_config(&cfg, &creds).is_ok());
    }
}
