use crate::{
    Config,
    error::WeatherError,
    model::{CitySuggestion, Coordinates, WeatherSnapshot},
    provider::openmeteo::OpenMeteoProvider,
};
use anyhow::Context;
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openmeteo;

/// Suggestions are only looked up for prefixes at least this long.
pub const MIN_SUGGESTION_CHARS: usize = 2;
pub const MAX_SUGGESTIONS: usize = 5;

/// Upstream weather and geocoding source.
///
/// Implementors provide the two raw lookups; name search and suggestion
/// lookup are built on top of them.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions and daily forecast, with a reverse-geocoded place name.
    async fn fetch_by_coordinates(&self, at: Coordinates) -> Result<WeatherSnapshot, WeatherError>;

    /// Forward geocoding, at most `count` matches in geocoder order.
    async fn search(&self, name: &str, count: usize) -> Result<Vec<CitySuggestion>, WeatherError>;

    /// Resolve `name` to its best match and fetch weather there.
    ///
    /// The geocoder's name and country win over the reverse-geocoded guess.
    async fn fetch_by_city_name(&self, name: &str) -> Result<WeatherSnapshot, WeatherError> {
        let place = self
            .search(name, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NotFound(name.to_string()))?;

        let mut snapshot = self.fetch_by_coordinates(place.coordinates()).await?;
        snapshot.city = place.name;
        snapshot.country = place.country;

        Ok(snapshot)
    }

    /// Best-effort autocomplete. Failures are logged and read as "no matches".
    async fn fetch_suggestions(&self, prefix: &str) -> Vec<CitySuggestion> {
        if prefix.chars().count() < MIN_SUGGESTION_CHARS {
            return Vec::new();
        }

        match self.search(prefix, MAX_SUGGESTIONS).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(%prefix, error = %err, "Failed to fetch city suggestions");
                Vec::new()
            }
        }
    }
}

/// Construct the upstream client described by `config`.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let provider = OpenMeteoProvider::new(config.endpoints.clone(), &config.user_agent)
        .context("Failed to build HTTP client")?;

    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CityId, CurrentConditions};
    use std::sync::Mutex;

    /// Canned provider that records every search it receives.
    #[derive(Debug, Default)]
    struct Canned {
        places: Vec<CitySuggestion>,
        fail_search: bool,
        searches: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl WeatherProvider for Canned {
        async fn fetch_by_coordinates(
            &self,
            at: Coordinates,
        ) -> Result<WeatherSnapshot, WeatherError> {
            Ok(WeatherSnapshot {
                city: "Reverse Guess".into(),
                country: "Somewhere".into(),
                latitude: at.latitude,
                longitude: at.longitude,
                current: CurrentConditions {
                    temperature: 10,
                    weather_code: 0,
                    wind_speed: 5,
                    wind_direction: 0.0,
                    is_day: true,
                },
                daily: Vec::new(),
            })
        }

        async fn search(
            &self,
            name: &str,
            count: usize,
        ) -> Result<Vec<CitySuggestion>, WeatherError> {
            self.searches.lock().unwrap().push((name.to_string(), count));
            if self.fail_search {
                return Err(WeatherError::Upstream { status: 500 });
            }
            Ok(self.places.iter().take(count).cloned().collect())
        }
    }

    fn place(id: i64, name: &str) -> CitySuggestion {
        CitySuggestion {
            id: CityId::Geocoder(id),
            name: name.into(),
            country: "United Kingdom".into(),
            latitude: 51.5,
            longitude: -0.12,
        }
    }

    #[tokio::test]
    async fn city_name_uses_geocoder_name() {
        let provider = Canned { places: vec![place(1, "London")], ..Default::default() };

        let snapshot = provider.fetch_by_city_name("london").await.unwrap();
        assert_eq!(snapshot.city, "London");
        assert_eq!(snapshot.country, "United Kingdom");
        assert_eq!(snapshot.latitude, 51.5);
        assert_eq!(provider.searches.lock().unwrap()[0], ("london".to_string(), 1));
    }

    #[tokio::test]
    async fn city_name_not_found() {
        let provider = Canned::default();
        let err = provider.fetch_by_city_name("Nowhere12345").await.unwrap_err();
        assert!(err.to_string().contains("Could not find location: Nowhere12345"));
    }

    #[tokio::test]
    async fn short_prefix_skips_search() {
        let provider = Canned { places: vec![place(1, "London")], ..Default::default() };
        assert!(provider.fetch_suggestions("x").await.is_empty());
        assert!(provider.fetch_suggestions("").await.is_empty());
        assert!(provider.searches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn prefix_length_counts_characters() {
        let provider = Canned { places: vec![place(1, "Ürümqi")], ..Default::default() };
        // One character, two bytes.
        assert!(provider.fetch_suggestions("Ü").await.is_empty());
        assert_eq!(provider.fetch_suggestions("Ür").await.len(), 1);
    }

    #[tokio::test]
    async fn suggestions_request_five() {
        let places = (0..8).map(|i| place(i, "Lon")).collect();
        let provider = Canned { places, ..Default::default() };

        let found = provider.fetch_suggestions("xy").await;
        assert_eq!(found.len(), MAX_SUGGESTIONS);
        assert_eq!(*provider.searches.lock().unwrap(), vec![("xy".to_string(), 5)]);
    }

    #[tokio::test]
    async fn suggestion_failure_is_swallowed() {
        let provider = Canned { fail_search: true, ..Default::default() };
        assert!(provider.fetch_suggestions("London").await.is_empty());
    }

    #[test]
    fn provider_from_default_config() {
        assert!(provider_from_config(&Config::default()).is_ok());
    }
}
