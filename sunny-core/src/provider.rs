use crate::{
    Config,
    error::Outcome,
    model::{DailyResponse, PlaceResponse, RealtimeResponse},
    provider::caiyun::{ApiClient, SunnyWeatherNetwork},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod caiyun;

/// The three remote operations, each resolving once the service answered.
///
/// A returned response may still carry a non-ok status; interpreting it is
/// left to the caller.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn search_places(&self, query: &str) -> Outcome<PlaceResponse>;

    /// Current conditions at the given coordinates.
    async fn get_realtime_weather(&self, lng: &str, lat: &str) -> Outcome<RealtimeResponse>;

    /// Multi-day forecast at the given coordinates.
    async fn get_daily_weather(&self, lng: &str, lat: &str) -> Outcome<DailyResponse>;
}

/// Construct the network provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<SunnyWeatherNetwork> {
    let token = config.token()?;
    let api = ApiClient::new(config.api_base(), token.to_owned(), config.lang().to_owned())?;
    Ok(SunnyWeatherNetwork::new(api))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_errors_when_missing_token() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No API token configured"));
    }

    #[test]
    fn provider_from_config_errors_on_bad_base_url() {
        let mut cfg = Config::default();
        cfg.set_token("KEY".into());
        cfg.api_base = Some("not a url".into());

        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("Invalid API base URL 'not a url'"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.set_token("KEY".into());

        assert!(provider_from_config(&cfg).is_ok());
    }
}
