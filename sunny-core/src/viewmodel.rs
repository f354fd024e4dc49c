//! Observable state holders for a UI.
//!
//! Each view model takes inputs through a method, re-runs the matching
//! repository operation, and publishes the latest outcome on a
//! [`tokio::sync::watch`] channel. A new input cancels the request still in
//! flight for the previous one.

use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};

use crate::{
    error::{Outcome, WeatherError},
    model::{Location, Place, Weather},
    provider::WeatherProvider,
    repository::{Fired, Repository},
    storage::KeyValueStore,
};

/// Latest published outcome; `None` until the first one arrives.
pub type Snapshot<T> = Option<Result<T, Arc<WeatherError>>>;

fn switch_map<I, T, F>(
    mut input: watch::Receiver<Option<I>>,
    output: watch::Sender<Snapshot<T>>,
    transform: F,
) -> JoinHandle<()>
where
    I: Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
    F: Fn(I) -> Fired<T> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let current = input.borrow_and_update().clone();
            if let Some(value) = current {
                let mut fired = transform(value);
                tokio::select! {
                    outcome = &mut fired => {
                        output.send_replace(Some(outcome.map_err(Arc::new)));
                    }
                    changed = input.changed() => {
                        fired.abort();
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                }
            }

            if input.changed().await.is_err() {
                break;
            }
        }
    })
}

pub struct PlaceViewModel<P, S> {
    repository: Arc<Repository<P, S>>,
    query: watch::Sender<Option<String>>,
    places: watch::Receiver<Snapshot<Vec<Place>>>,
    place_list: Vec<Place>,
    worker: JoinHandle<()>,
}

impl<P, S> PlaceViewModel<P, S>
where
    P: WeatherProvider + 'static,
    S: KeyValueStore + 'static,
{
    /// Must be called from within a tokio runtime.
    pub fn new(repository: Arc<Repository<P, S>>) -> Self {
        let (query, query_rx) = watch::channel(None);
        let (places_tx, places) = watch::channel(None);

        let repo = Arc::clone(&repository);
        let worker = switch_map(query_rx, places_tx, move |q: String| repo.search_places(&q));

        Self { repository, query, places, place_list: Vec::new(), worker }
    }

    pub fn search_places(&self, query: &str) {
        self.query.send_replace(Some(query.to_string()));
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Vec<Place>>> {
        self.places.clone()
    }

    /// Places currently shown to the user.
    pub fn place_list(&self) -> &[Place] {
        &self.place_list
    }

    pub fn set_place_list(&mut self, places: Vec<Place>) {
        self.place_list = places;
    }

    pub fn save_place(&self, place: &Place) -> Outcome<()> {
        self.repository.save_place(place)
    }

    pub fn get_saved_place(&self) -> Outcome<Place> {
        self.repository.get_saved_place()
    }

    pub fn is_place_saved(&self) -> Outcome<bool> {
        self.repository.is_place_saved()
    }
}

impl<P, S> Drop for PlaceViewModel<P, S> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

pub struct WeatherViewModel<P, S> {
    repository: Arc<Repository<P, S>>,
    location: watch::Sender<Option<(Location, String)>>,
    weather: watch::Receiver<Snapshot<Weather>>,
    worker: JoinHandle<()>,
    pub location_lng: String,
    pub location_lat: String,
    pub place_name: String,
}

impl<P, S> WeatherViewModel<P, S>
where
    P: WeatherProvider + 'static,
    S: KeyValueStore + 'static,
{
    /// Must be called from within a tokio runtime.
    pub fn new(repository: Arc<Repository<P, S>>) -> Self {
        let (location, location_rx) = watch::channel(None);
        let (weather_tx, weather) = watch::channel(None);

        let repo = Arc::clone(&repository);
        let worker = switch_map(location_rx, weather_tx, move |(loc, name): (Location, String)| {
            repo.refresh_weather(&loc.lng, &loc.lat, &name)
        });

        Self {
            repository,
            location,
            weather,
            worker,
            location_lng: String::new(),
            location_lat: String::new(),
            place_name: String::new(),
        }
    }

    pub fn refresh_weather(&self, lng: &str, lat: &str) {
        self.location.send_replace(Some((Location::new(lng, lat), self.place_name.clone())));
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Weather>> {
        self.weather.clone()
    }

    /// Place to show when no coordinates were given.
    pub fn get_saved_place(&self) -> Outcome<Place> {
        self.repository.get_saved_place()
    }
}

impl<P, S> Drop for WeatherViewModel<P, S> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
