//! Open-Meteo forecast and geocoding, with Nominatim for reverse geocoding.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    config::Endpoints,
    error::WeatherError,
    model::{
        CityId, CitySuggestion, Coordinates, CurrentConditions, DailyForecast, FORECAST_DAYS,
        WeatherSnapshot, round_half_up,
    },
};

use super::WeatherProvider;

const CURRENT_FIELDS: &str = "temperature_2m,is_day,weather_code,wind_speed_10m,wind_direction_10m";
const DAILY_FIELDS: &str =
    "weather_code,temperature_2m_max,temperature_2m_min,precipitation_probability_max";
const UNRESOLVED_PLACE: &str = "Current Location";

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    endpoints: Endpoints,
    http: Client,
}

impl OpenMeteoProvider {
    /// Nominatim rejects requests without an identifying user agent.
    pub fn new(endpoints: Endpoints, user_agent: &str) -> reqwest::Result<Self> {
        let http = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { endpoints, http })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        what: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        tracing::debug!(endpoint = what, %url, ?query, "Upstream request");

        let res = self.http.get(url).query(query).send().await?;

        let status = res.status();
        if !status.is_success() {
            tracing::debug!(endpoint = what, %status, "Upstream returned an error status");
            return Err(WeatherError::Upstream { status: status.as_u16() });
        }

        let body = res.text().await?;
        serde_json::from_str(&body).map_err(|source| WeatherError::Parse { what, source })
    }

    async fn forecast(&self, at: Coordinates) -> Result<OmForecastResponse, WeatherError> {
        self.get_json(
            "forecast",
            &self.endpoints.forecast,
            &[
                ("latitude", at.latitude.to_string()),
                ("longitude", at.longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ],
        )
        .await
    }

    async fn reverse_geocode(&self, at: Coordinates) -> Result<NominatimAddress, WeatherError> {
        let res: NominatimResponse = self
            .get_json(
                "reverse geocoding",
                &self.endpoints.reverse_geocode,
                &[
                    ("format", "json".to_string()),
                    ("lat", at.latitude.to_string()),
                    ("lon", at.longitude.to_string()),
                ],
            )
            .await?;

        Ok(res.address)
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn fetch_by_coordinates(&self, at: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
        let forecast = self.forecast(at).await?;
        let address = self.reverse_geocode(at).await?;

        Ok(normalize(forecast, address))
    }

    async fn search(&self, name: &str, count: usize) -> Result<Vec<CitySuggestion>, WeatherError> {
        let res: GeoSearchResponse = self
            .get_json(
                "geocoding search",
                &self.endpoints.search,
                &[
                    ("name", name.to_string()),
                    ("count", count.to_string()),
                    ("language", "en".to_string()),
                    ("format", "json".to_string()),
                ],
            )
            .await?;

        Ok(res
            .results
            .into_iter()
            .take(count)
            .map(|r| CitySuggestion {
                id: CityId::Geocoder(r.id),
                name: r.name,
                country: r.country,
                latitude: r.latitude,
                longitude: r.longitude,
            })
            .collect())
    }
}

/// Merge a forecast with its reverse-geocoded address.
fn normalize(forecast: OmForecastResponse, address: NominatimAddress) -> WeatherSnapshot {
    let (city, country) = address.place();
    let OmForecastResponse { latitude, longitude, current, daily } = forecast;

    let daily = daily
        .time
        .into_iter()
        .zip(daily.weather_code)
        .zip(daily.temperature_2m_max.into_iter().zip(daily.temperature_2m_min))
        .zip(daily.precipitation_probability_max)
        .take(FORECAST_DAYS)
        .map(|(((date, weather_code), (max, min)), precipitation)| DailyForecast {
            date,
            weather_code,
            max_temp: round_half_up(max),
            min_temp: round_half_up(min),
            precipitation_probability: precipitation.unwrap_or(0),
        })
        .collect();

    WeatherSnapshot {
        city,
        country,
        latitude,
        longitude,
        current: CurrentConditions {
            temperature: round_half_up(current.temperature_2m),
            weather_code: current.weather_code,
            wind_speed: round_half_up(current.wind_speed_10m),
            wind_direction: current.wind_direction_10m,
            is_day: current.is_day == 1,
        },
        daily,
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: f64,
    is_day: u8,
    weather_code: i32,
    wind_speed_10m: f64,
    wind_direction_10m: f64,
}

/// Parallel arrays, one entry per day.
#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<NaiveDate>,
    weather_code: Vec<i32>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    precipitation_probability_max: Vec<Option<u8>>,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    latitude: f64,
    longitude: f64,
    current: OmCurrent,
    daily: OmDaily,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    /// Best place name (city > town > village) and country.
    fn place(self) -> (String, String) {
        let non_empty = |s: &String| !s.is_empty();

        let name = self
            .city
            .filter(non_empty)
            .or(self.town.filter(non_empty))
            .or(self.village.filter(non_empty))
            .unwrap_or_else(|| UNRESOLVED_PLACE.to_string());

        (name, self.country.unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    #[serde(default)]
    address: NominatimAddress,
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    id: i64,
    name: String,
    #[serde(default)]
    country: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct GeoSearchResponse {
    #[serde(default)]
    results: Vec<GeoResult>,
}
