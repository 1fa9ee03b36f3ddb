use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of forecast days kept in a snapshot.
pub const FORECAST_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Stable identity string, `"{lat}:{lon}"`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.latitude, self.longitude)
    }
}

/// Normalized weather for one place. Replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub current: CurrentConditions,
    /// Ascending by date, at most [`FORECAST_DAYS`] entries.
    pub daily: Vec<DailyForecast>,
}

impl WeatherSnapshot {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn label(&self) -> String {
        place_label(&self.city, &self.country)
    }
}

/// "Name, Country", or just the name when the country is unknown.
fn place_label(name: &str, country: &str) -> String {
    if country.is_empty() {
        name.to_string()
    } else {
        format!("{name}, {country}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Degrees Celsius, rounded.
    pub temperature: i32,
    pub weather_code: i32,
    /// km/h, rounded.
    pub wind_speed: i32,
    /// Degrees, source precision.
    pub wind_direction: f64,
    pub is_day: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub weather_code: i32,
    pub max_temp: i32,
    pub min_temp: i32,
    /// Percent.
    pub precipitation_probability: u8,
}

impl DailyForecast {
    /// Short upper-case weekday, e.g. "MON".
    pub fn day_label(&self) -> String {
        self.date.weekday().to_string().to_uppercase()
    }
}

/// Identity of a city record.
///
/// Geocoder results carry the geocoder's own id; cities derived from a
/// fetched snapshot are keyed by their coordinate pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CityId {
    Geocoder(i64),
    Coordinates(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub id: CityId,
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl CitySuggestion {
    /// City record for a snapshot, as saved after a successful search.
    pub fn from_snapshot(snapshot: &WeatherSnapshot) -> Self {
        Self {
            id: CityId::Coordinates(snapshot.coordinates().key()),
            name: snapshot.city.clone(),
            country: snapshot.country.clone(),
            latitude: snapshot.latitude,
            longitude: snapshot.longitude,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn label(&self) -> String {
        place_label(&self.name, &self.country)
    }
}

/// Display unit for temperatures. Transient; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl Unit {
    /// Convert a rounded Celsius value into this unit.
    pub fn convert(&self, celsius: i32) -> i32 {
        match self {
            Unit::Celsius => celsius,
            Unit::Fahrenheit => round_half_up(f64::from(celsius) * 9.0 / 5.0 + 32.0),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Celsius => "C",
            Unit::Fahrenheit => "F",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Unit::Celsius => Unit::Fahrenheit,
            Unit::Fahrenheit => Unit::Celsius,
        }
    }
}

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// 16-point compass label for a wind direction in degrees.
pub fn compass_point(degrees: f64) -> &'static str {
    let sector = round_half_up(degrees / 22.5).rem_euclid(16);
    COMPASS_POINTS[sector as usize]
}

/// Round to nearest, halves toward positive infinity.
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}
