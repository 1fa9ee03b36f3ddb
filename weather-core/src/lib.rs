//! Core library for the `weather` client.
//!
//! This crate defines:
//! - Normalization of the forecast and geocoding APIs into one data model
//! - WMO weather code interpretation
//! - The persisted "last searched city" preference
//! - Interaction state for startup, search and debounced autocomplete
//!
//! It is used by `weather-cli`, but holds no terminal or rendering code.

pub mod autocomplete;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod interpret;
pub mod location;
pub mod model;
pub mod preference;
pub mod provider;

pub use autocomplete::{Autocomplete, Dropdown, Key, SearchBox};
pub use config::{Config, Endpoints};
pub use controller::{Origin, Phase, SearchTarget, View, WeatherController};
pub use error::{ErrorKind, Notice, WeatherError};
pub use interpret::{IconKind, Interpretation, interpret};
pub use location::{Geolocator, LocationError, StaticGeolocator};
pub use model::{
    CityId, CitySuggestion, Coordinates, CurrentConditions, DailyForecast, Unit, WeatherSnapshot,
    compass_point,
};
pub use preference::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use provider::{WeatherProvider, provider_from_config};
