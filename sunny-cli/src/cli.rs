use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Select, Text};
use tokio::sync::watch;

use sunny_core::{
    Config, FilePreferences, PlaceDao, PlaceViewModel, Repository, Snapshot, SunnyWeatherNetwork,
    WeatherError, WeatherViewModel, provider_from_config, storage::PREFERENCES_NAME,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "sunny", version, about = "Weather and place search CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API token used for every request.
    Configure {
        /// Token to store; prompted for when absent.
        #[arg(long)]
        token: Option<String>,
    },

    /// Search places by name.
    Search {
        query: String,

        /// Pick one of the results and remember it.
        #[arg(long)]
        save: bool,
    },

    /// Show current conditions and the forecast.
    ///
    /// Uses the saved place unless coordinates are given.
    Weather {
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<String>,

        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<String>,
    },

    /// Show the saved place.
    Place,

    /// Forget the saved place.
    Forget,
}

type AppRepository = Repository<SunnyWeatherNetwork, FilePreferences>;

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure { token } => configure(token),
            Command::Search { query, save } => search(&query, save).await,
            Command::Weather { lng, lat } => weather(lng.zip(lat)).await,
            Command::Place => show_place(),
            Command::Forget => forget(),
        }
    }
}

fn configure(token: Option<String>) -> Result<()> {
    let mut config = Config::load()?;

    let token = match token {
        Some(token) => token,
        None => Text::new("API token:")
            .with_help_message("Issued by the weather service's developer console")
            .prompt()
            .context("Failed to read token")?,
    };

    config.set_token(token);
    config.token()?;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn search(query: &str, save: bool) -> Result<()> {
    let repository = Arc::new(open_repository()?);
    let mut view_model = PlaceViewModel::new(repository);
    let mut results = view_model.subscribe();

    view_model.search_places(query);
    let places = next_outcome(&mut results).await?;

    if places.is_empty() {
        println!("No places found for '{query}'.");
        return Ok(());
    }

    view_model.set_place_list(places);
    for (idx, place) in view_model.place_list().iter().enumerate() {
        println!("{}", render::place_line(idx + 1, place));
    }

    if save {
        let labels = view_model.place_list().iter().map(render::place_label).collect();
        let choice = Select::new("Save which place?", labels)
            .raw_prompt()
            .context("Failed to read selection")?;

        let place = view_model.place_list()[choice.index].clone();
        view_model.save_place(&place)?;
        println!("Saved {}.", place.name);
    }

    Ok(())
}

async fn weather(coordinates: Option<(String, String)>) -> Result<()> {
    let mut view_model = WeatherViewModel::new(Arc::new(open_repository()?));

    let (lng, lat, name) = match coordinates {
        Some((lng, lat)) => {
            let name = format!("{lng},{lat}");
            (lng, lat, name)
        }
        None => {
            let place = view_model.get_saved_place().map_err(no_saved_place_hint)?;
            (place.location.lng, place.location.lat, place.name)
        }
    };

    view_model.location_lng = lng;
    view_model.location_lat = lat;
    view_model.place_name = name;

    let mut results = view_model.subscribe();
    view_model.refresh_weather(&view_model.location_lng, &view_model.location_lat);
    let weather = next_outcome(&mut results).await?;

    print!("{}", render::weather(&view_model.place_name, &weather)?);
    println!("\nUpdated {}", chrono::Local::now().format("%Y-%m-%d %H:%M"));
    Ok(())
}

fn show_place() -> Result<()> {
    let dao = PlaceDao::new(open_preferences()?);
    let place = dao.get_saved_place().map_err(no_saved_place_hint)?;
    println!("{}", render::place_label(&place));
    println!("  lng {}, lat {}", place.location.lng, place.location.lat);
    Ok(())
}

fn forget() -> Result<()> {
    let dao = PlaceDao::new(open_preferences()?);
    if dao.is_place_saved()? {
        dao.clear_place()?;
        println!("Forgot the saved place.");
    } else {
        println!("No place was saved.");
    }
    Ok(())
}

fn open_preferences() -> Result<FilePreferences> {
    let dir = Config::data_dir()?;
    FilePreferences::open(&dir, PREFERENCES_NAME)
        .with_context(|| format!("Failed to open preferences in {}", dir.display()))
}

fn open_repository() -> Result<AppRepository> {
    let config = Config::load()?;
    let network = provider_from_config(&config)?;
    tracing::debug!(api_base = %config.api_base(), lang = config.lang(), "using configuration");
    Ok(Repository::new(network, open_preferences()?))
}

async fn next_outcome<T: Clone>(results: &mut watch::Receiver<Snapshot<T>>) -> Result<T> {
    loop {
        results.changed().await.context("View model stopped before publishing a result")?;
        if let Some(outcome) = results.borrow_and_update().clone() {
            return outcome.map_err(anyhow::Error::from);
        }
    }
}

fn no_saved_place_hint(err: WeatherError) -> anyhow::Error {
    match err {
        WeatherError::NotSaved => anyhow!(
            "No place saved yet.\n\
             Hint: run `sunny search <name> --save` first."
        ),
        other => other.into(),
    }
}
