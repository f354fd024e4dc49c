use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// Status value the remote service reports for a successful request.
pub const STATUS_OK: &str = "ok";

/// Coordinates as the service returns them: decimal strings, longitude first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub lng: String,
    pub lat: String,
}

impl Location {
    pub fn new(lng: impl Into<String>, lat: impl Into<String>) -> Self {
        Self { lng: lng.into(), lat: lat.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub location: Location,
    #[serde(rename = "formatted_address")]
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceResponse {
    pub status: String,
    #[serde(default)]
    pub places: Vec<Place>,
}

impl PlaceResponse {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeResponse {
    pub status: String,
    pub result: Option<RealtimeResult>,
}

impl RealtimeResponse {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeResult {
    pub realtime: Realtime,
}

/// Current conditions at the requested coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Realtime {
    pub skycon: String,
    pub temperature: f32,
    pub air_quality: AirQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub aqi: Aqi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aqi {
    pub chn: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyResponse {
    pub status: String,
    pub result: Option<DailyResult>,
}

impl DailyResponse {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyResult {
    pub daily: Daily,
}

/// Per-day forecast. The three sequences are index-aligned by day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Daily {
    pub temperature: Vec<Temperature>,
    pub skycon: Vec<Skycon>,
    pub life_index: LifeIndex,
}

impl Daily {
    /// Number of days covered by every sequence.
    pub fn days(&self) -> usize {
        self.temperature.len().min(self.skycon.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub max: f32,
    pub min: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skycon {
    pub value: String,
    #[serde(deserialize_with = "deserialize_forecast_date")]
    pub date: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeIndex {
    #[serde(rename = "coldRisk")]
    pub cold_risk: Vec<LifeDescription>,
    #[serde(rename = "carWashing")]
    pub car_washing: Vec<LifeDescription>,
    pub ultraviolet: Vec<LifeDescription>,
    pub dressing: Vec<LifeDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeDescription {
    pub desc: String,
}

/// Current conditions plus forecast. Only built when both fetches succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub realtime: Realtime,
    pub daily: Daily,
}

// The service sends minute-precision timestamps ("2019-10-20T00:00+08:00"),
// which RFC 3339 parsing rejects.
fn deserialize_forecast_date<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_forecast_date(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_forecast_date(raw: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z"))
}
