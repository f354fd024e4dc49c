//! Single entry point for everything the presentation side asks for.
//!
//! Remote-backed operations run on the tokio runtime through [`fire`] and hand
//! back a [`Fired`] handle. Whatever goes wrong inside, including a panic, comes
//! out of that handle as a [`WeatherError`].

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use tokio::task::{JoinHandle, JoinSet};
use tracing::Instrument;

use crate::{
    error::{Outcome, WeatherError},
    model::{DailyResponse, Place, RealtimeResponse, Weather},
    provider::WeatherProvider,
    storage::{KeyValueStore, PlaceDao},
};

/// Single-shot handle to a running operation. Await it for the outcome.
#[must_use = "a fired operation does nothing useful unless awaited"]
#[derive(Debug)]
pub struct Fired<T> {
    handle: JoinHandle<Outcome<T>>,
}

impl<T> Fired<T> {
    /// Cancel the operation. Awaiting afterwards yields [`WeatherError::Aborted`].
    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl<T> Future for Fired<T> {
    type Output = Outcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| joined.unwrap_or_else(|e| Err(e.into())))
    }
}

/// Run `block` on the runtime, funnelling every failure into the outcome.
pub fn fire<T, F>(block: F) -> Fired<T>
where
    T: Send + 'static,
    F: Future<Output = Outcome<T>> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let outcome = block.await;
        if let Err(err) = &outcome {
            tracing::warn!(error = %err, "operation failed");
        }
        outcome
    });
    Fired { handle }
}

#[derive(Debug)]
pub struct Repository<P, S> {
    provider: Arc<P>,
    places: PlaceDao<S>,
}

impl<P, S> Repository<P, S>
where
    P: WeatherProvider + 'static,
    S: KeyValueStore,
{
    pub fn new(provider: P, store: S) -> Self {
        Self { provider: Arc::new(provider), places: PlaceDao::new(store) }
    }

    pub fn search_places(&self, query: &str) -> Fired<Vec<Place>> {
        let provider = Arc::clone(&self.provider);
        let query = query.to_string();
        let span = tracing::info_span!("search_places", query = %query);

        fire(
            async move {
                let response = provider.search_places(&query).await?;
                if response.is_ok() {
                    tracing::debug!(found = response.places.len(), "place search succeeded");
                    Ok(response.places)
                } else {
                    Err(WeatherError::status(response.status))
                }
            }
            .instrument(span),
        )
    }

    /// Fetch current conditions and forecast in parallel and combine them.
    ///
    /// Both fetches are always joined before the outcome is decided.
    pub fn refresh_weather(&self, lng: &str, lat: &str, place_name: &str) -> Fired<Weather> {
        let provider = Arc::clone(&self.provider);
        let (lng, lat) = (lng.to_string(), lat.to_string());
        let span = tracing::info_span!("refresh_weather", %lng, %lat, place = %place_name);

        fire(
            async move {
                let mut children = JoinSet::new();
                {
                    let (provider, lng, lat) = (Arc::clone(&provider), lng.clone(), lat.clone());
                    children.spawn(async move {
                        Fetched::Realtime(provider.get_realtime_weather(&lng, &lat).await)
                    });
                }
                children.spawn(async move {
                    Fetched::Daily(provider.get_daily_weather(&lng, &lat).await)
                });

                let mut realtime = None;
                let mut daily = None;
                let mut aborted = None;
                while let Some(joined) = children.join_next().await {
                    match joined {
                        Ok(Fetched::Realtime(outcome)) => realtime = Some(outcome),
                        Ok(Fetched::Daily(outcome)) => daily = Some(outcome),
                        Err(err) => {
                            aborted.get_or_insert(err);
                        }
                    }
                }

                if let Some(err) = aborted {
                    return Err(err.into());
                }
                let (Some(realtime), Some(daily)) = (realtime, daily) else {
                    return Err(WeatherError::Abandoned);
                };

                combine(realtime?, daily?)
            }
            .instrument(span),
        )
    }

    pub fn save_place(&self, place: &Place) -> Outcome<()> {
        self.places.save_place(place)
    }

    pub fn get_saved_place(&self) -> Outcome<Place> {
        self.places.get_saved_place()
    }

    pub fn is_place_saved(&self) -> Outcome<bool> {
        self.places.is_place_saved()
    }

    pub fn clear_place(&self) -> Outcome<()> {
        self.places.clear_place()
    }
}

enum Fetched {
    Realtime(Outcome<RealtimeResponse>),
    Daily(Outcome<DailyResponse>),
}

/// Build a [`Weather`] only when both responses are ok and carry a result.
pub fn combine(realtime: RealtimeResponse, daily: DailyResponse) -> Outcome<Weather> {
    if !(realtime.is_ok() && daily.is_ok()) {
        return Err(WeatherError::WeatherStatus { realtime: realtime.status, daily: daily.status });
    }

    match (realtime.result, daily.result) {
        (Some(r), Some(d)) => Ok(Weather { realtime: r.realtime, daily: d.daily }),
        _ => Err(WeatherError::MissingResult),
    }
}
