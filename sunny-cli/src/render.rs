//! Plain-text rendering of places and weather.

use std::fmt::{self, Write};

use sunny_core::{Place, Weather, model::LifeDescription};

/// Human-readable label for a sky-condition code.
pub fn sky_label(code: &str) -> &'static str {
    match code {
        "CLEAR_DAY" | "CLEAR_NIGHT" => "Clear",
        "PARTLY_CLOUDY_DAY" | "PARTLY_CLOUDY_NIGHT" => "Partly cloudy",
        "CLOUDY" => "Cloudy",
        "WIND" => "Windy",
        "LIGHT_RAIN" => "Light rain",
        "MODERATE_RAIN" => "Moderate rain",
        "HEAVY_RAIN" => "Heavy rain",
        "STORM_RAIN" => "Rainstorm",
        "THUNDER_SHOWER" => "Thunder shower",
        "SLEET" => "Sleet",
        "LIGHT_SNOW" => "Light snow",
        "MODERATE_SNOW" => "Moderate snow",
        "HEAVY_SNOW" => "Heavy snow",
        "STORM_SNOW" => "Snowstorm",
        "HAIL" => "Hail",
        "LIGHT_HAZE" => "Light haze",
        "MODERATE_HAZE" => "Moderate haze",
        "HEAVY_HAZE" => "Heavy haze",
        "FOG" => "Fog",
        "DUST" => "Dust",
        "SAND" => "Sandstorm",
        "RAIN" => "Rain",
        "SNOW" => "Snow",
        "HAZE" => "Haze",
        _ => "Unknown",
    }
}

pub fn place_label(place: &Place) -> String {
    format!("{} ({})", place.name, place.address)
}

pub fn place_line(position: usize, place: &Place) -> String {
    format!("{position:>2}. {}", place_label(place))
}

fn first_desc(entries: &[LifeDescription]) -> &str {
    entries.first().map(|d| d.desc.as_str()).unwrap_or("-")
}

pub fn weather(place_name: &str, weather: &Weather) -> Result<String, fmt::Error> {
    let now = &weather.realtime;
    let daily = &weather.daily;
    let mut out = String::new();

    writeln!(out, "{place_name}")?;
    writeln!(
        out,
        "  Now: {:.0}°C, {}, AQI {:.0}",
        now.temperature,
        sky_label(&now.skycon),
        now.air_quality.aqi.chn
    )?;

    writeln!(out, "\nForecast:")?;
    for day in 0..daily.days() {
        let (temp, sky) = (&daily.temperature[day], &daily.skycon[day]);
        writeln!(
            out,
            "  {}  {:>4.0} ~ {:<4.0}°C  {}",
            sky.date.format("%Y-%m-%d"),
            temp.min,
            temp.max,
            sky_label(&sky.value)
        )?;
    }

    let index = &daily.life_index;
    writeln!(out, "\nToday:")?;
    writeln!(out, "  Cold risk:   {}", first_desc(&index.cold_risk))?;
    writeln!(out, "  Dressing:    {}", first_desc(&index.dressing))?;
    writeln!(out, "  UV:          {}", first_desc(&index.ultraviolet))?;
    writeln!(out, "  Car washing: {}", first_desc(&index.car_washing))?;

    Ok(out)
}
