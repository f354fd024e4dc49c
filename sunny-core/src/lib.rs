//! Core library for the `sunny` weather CLI.
//!
//! This crate defines:
//! - Configuration & token handling
//! - A callback-style HTTP transport with an `.await` bridge
//! - The network adapter for place search, current conditions and forecast
//! - Local persistence of the saved place
//! - The repository that combines fetches into one success/failure envelope
//! - Observable view models for a UI
//!
//! It is used by `sunny-cli`, but can also be reused by other front ends.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod repository;
pub mod storage;
pub mod transport;
pub mod viewmodel;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{Outcome, WeatherError};
pub use model::{Daily, Location, Place, Realtime, Weather};
pub use provider::{WeatherProvider, caiyun::SunnyWeatherNetwork, provider_from_config};
pub use repository::{Fired, Repository};
pub use storage::{FilePreferences, KeyValueStore, MemoryPreferences, PlaceDao};
pub use viewmodel::{PlaceViewModel, Snapshot, WeatherViewModel};
