use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::{
    error::Outcome,
    model::{DailyResponse, PlaceResponse, RealtimeResponse},
    transport::{HttpCall, await_body},
};

use super::WeatherProvider;

/// Builds calls against the weather service's HTTP endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    token: String,
    lang: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base: &str, token: String, lang: String) -> Result<Self> {
        let base = Url::parse(base).map_err(|e| anyhow!("Invalid API base URL '{base}': {e}"))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("Invalid API base URL '{base}': cannot hold endpoint paths"));
        }

        Ok(Self { base, token, lang, http: Client::new() })
    }

    pub fn search_places(&self, query: &str) -> HttpCall<PlaceResponse> {
        let request = self.http.get(self.endpoint(&["v2", "place"])).query(&[
            ("query", query),
            ("token", self.token.as_str()),
            ("lang", self.lang.as_str()),
        ]);
        HttpCall::new(request)
    }

    pub fn realtime_weather(&self, lng: &str, lat: &str) -> HttpCall<RealtimeResponse> {
        HttpCall::new(self.http.get(self.weather_url(lng, lat, "realtime.json")))
    }

    pub fn daily_weather(&self, lng: &str, lat: &str) -> HttpCall<DailyResponse> {
        HttpCall::new(self.http.get(self.weather_url(lng, lat, "daily.json")))
    }

    fn weather_url(&self, lng: &str, lat: &str, resource: &str) -> Url {
        let coordinates = format!("{lng},{lat}");
        self.endpoint(&["v2.5", self.token.as_str(), coordinates.as_str(), resource])
    }

    /// Append `segments` below the base path, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `new` rejects bases that cannot hold a path, so this always applies.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Network adapter: every remote operation is a single `.await`.
#[derive(Debug, Clone)]
pub struct SunnyWeatherNetwork {
    api: ApiClient,
}

impl SunnyWeatherNetwork {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl WeatherProvider for SunnyWeatherNetwork {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn search_places(&self, query: &str) -> Outcome<PlaceResponse> {
        await_body(self.api.search_places(query)).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_realtime_weather(&self, lng: &str, lat: &str) -> Outcome<RealtimeResponse> {
        await_body(self.api.realtime_weather(lng, lat)).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_daily_weather(&self, lng: &str, lat: &str) -> Outcome<DailyResponse> {
        await_body(self.api.daily_weather(lng, lat)).await
    }
}
