//! Shared fixtures for unit tests.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

use crate::{
    error::{Outcome, WeatherError},
    model::{DailyResponse, Location, Place, PlaceResponse, RealtimeResponse},
    provider::WeatherProvider,
};

/// Serve exactly one HTTP response on a local port and return its base URL.
pub async fn serve_once(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://{addr}/")
}

pub fn beijing() -> Place {
    Place {
        name: "北京市".into(),
        location: Location::new("116.4073963", "39.9041999"),
        address: "中国北京市".into(),
    }
}

pub fn realtime_json(status: &str) -> String {
    format!(
        r#"{{"status":"{status}","result":{{"realtime":{{
            "temperature":21.0,"skycon":"CLEAR_DAY","air_quality":{{"aqi":{{"chn":35.0}}}}
        }}}}}}"#
    )
}

pub fn daily_json(status: &str) -> String {
    format!(
        r#"{{"status":"{status}","result":{{"daily":{{
            "temperature":[{{"max":25.0,"min":12.0}}],
            "skycon":[{{"value":"CLOUDY","date":"2019-10-20T00:00+08:00"}}],
            "life_index":{{
                "coldRisk":[{{"desc":"少发"}}],
                "carWashing":[{{"desc":"适宜"}}],
                "ultraviolet":[{{"desc":"弱"}}],
                "dressing":[{{"desc":"舒适"}}]
            }}
        }}}}}}"#
    )
}

/// How a fake remote operation should answer.
#[derive(Debug, Clone)]
pub enum Scripted {
    Status(&'static str),
    Fault,
    Empty,
    Panic,
}

impl Scripted {
    fn answer<T: serde::de::DeserializeOwned>(&self, json: impl FnOnce(&str) -> String) -> Outcome<T> {
        match self {
            Scripted::Status(status) => Ok(serde_json::from_str(&json(status)).unwrap()),
            Scripted::Fault => Err(WeatherError::Abandoned),
            Scripted::Empty => Err(WeatherError::EmptyResponse { status: 200 }),
            Scripted::Panic => panic!("scripted provider panic"),
        }
    }
}

/// In-process provider with scripted answers and per-operation delays.
#[derive(Debug)]
pub struct FakeProvider {
    pub search: Scripted,
    pub realtime: Scripted,
    pub daily: Scripted,
    pub realtime_delay: Duration,
    pub daily_delay: Duration,
    pub search_delay: Duration,
    pub calls: Arc<AtomicUsize>,
}

impl FakeProvider {
    pub fn ok() -> Self {
        Self {
            search: Scripted::Status("ok"),
            realtime: Scripted::Status("ok"),
            daily: Scripted::Status("ok"),
            realtime_delay: Duration::ZERO,
            daily_delay: Duration::ZERO,
            search_delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn search_places(&self, query: &str) -> Outcome<PlaceResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.search_delay).await;
        let place = Place { name: query.to_string(), ..beijing() };
        let place = serde_json::to_string(&place).unwrap();
        self.search.answer(|status| format!(r#"{{"status":"{status}","places":[{place}]}}"#))
    }

    async fn get_realtime_weather(&self, _lng: &str, _lat: &str) -> Outcome<RealtimeResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.realtime_delay).await;
        self.realtime.answer(realtime_json)
    }

    async fn get_daily_weather(&self, _lng: &str, _lat: &str) -> Outcome<DailyResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.daily_delay).await;
        self.daily.answer(daily_json)
    }
}
