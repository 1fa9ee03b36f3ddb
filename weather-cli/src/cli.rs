use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Confirm, CustomType, Select, Text};
use std::sync::Arc;
use weather_core::{
    Autocomplete, Config, Coordinates, Dropdown, FilePreferenceStore, Phase, SearchTarget,
    StaticGeolocator, Unit, View, WeatherController, WeatherProvider, provider_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather and 7-day forecast")]
pub struct Cli {
    /// Temperature unit for output.
    #[arg(long, value_enum, global = true, default_value_t = UnitArg::C)]
    pub unit: UnitArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnitArg {
    C,
    F,
}

impl From<UnitArg> for Unit {
    fn from(value: UnitArg) -> Self {
        match value {
            UnitArg::C => Unit::Celsius,
            UnitArg::F => Unit::Fahrenheit,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show weather for the saved city, your location, or the default city.
    Show {
        /// Latitude to use as your location.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude to use as your location.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Ignore the configured home location, as if location access were denied.
        #[arg(long, conflicts_with = "lat")]
        no_location: bool,
    },

    /// Search for a city by name and remember it.
    Search {
        /// City name, e.g. "Buenos Aires".
        city: String,
    },

    /// Type a city name and pick from suggestions.
    Find,

    /// List city suggestions for a prefix.
    Suggest {
        prefix: String,
    },

    /// Forget the saved city and fall back to your location.
    Forget,

    /// Set the default city and home location.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;
        let unit = Unit::from(self.unit);

        match self.command {
            Command::Configure => configure(config),
            Command::Suggest { prefix } => {
                let provider = provider_from_config(&config)?;
                let found = provider.fetch_suggestions(&prefix).await;
                println!("{}", render::suggestions(&prefix, &found));
                Ok(())
            }
            Command::Show { lat, lon, no_location } => {
                let geolocator = if no_location {
                    StaticGeolocator::denied()
                } else {
                    let position = lat.zip(lon).map(|(la, lo)| Coordinates::new(la, lo));
                    StaticGeolocator::new(position.or(config.home))
                };
                let mut app = App::new(&config, geolocator, unit)?;
                app.controller.start().await;
                app.present().await
            }
            Command::Search { city } => {
                let mut app = App::new(&config, StaticGeolocator::new(config.home), unit)?;
                app.controller.search(SearchTarget::Text(city)).await;
                app.present().await
            }
            Command::Find => {
                let mut app = App::new(&config, StaticGeolocator::new(config.home), unit)?;
                let Some(target) = pick_city(app.provider.clone(), &config).await? else {
                    return Ok(());
                };
                app.controller.search(target).await;
                app.present().await
            }
            Command::Forget => {
                let mut app = App::new(&config, StaticGeolocator::new(config.home), unit)?;
                app.controller.forget_preference().await;
                app.present().await
            }
        }
    }
}

struct App {
    provider: Arc<dyn WeatherProvider>,
    controller: WeatherController,
}

impl App {
    fn new(config: &Config, geolocator: StaticGeolocator, unit: Unit) -> anyhow::Result<Self> {
        let provider = provider_from_config(config)?;
        let store = FilePreferenceStore::open_default()?;

        let mut controller =
            WeatherController::new(provider.clone(), Box::new(store), Box::new(geolocator))
                .with_default_city(config.default_city.clone());
        controller.set_unit(unit);

        Ok(Self { provider, controller })
    }

    /// Print the settled view. Full-page failures offer the default city.
    async fn present(&mut self) -> anyhow::Result<()> {
        loop {
            match self.controller.view() {
                View::Loading => return Ok(()),
                View::Failed(notice) => {
                    eprintln!("{}", render::notice(&notice));
                    let retry = Confirm::new("Try a default location?")
                        .with_default(true)
                        .prompt()
                        .context("Failed to read answer")?;
                    if !retry {
                        break;
                    }
                    self.controller.retry_default().await;
                }
                View::Weather { snapshot, inline_error, .. } => {
                    if let Some(message) = inline_error {
                        eprintln!("{message}");
                    }
                    if let Some(weather) = snapshot {
                        let today = chrono::Local::now().date_naive();
                        print!("{}", render::snapshot(weather, self.controller.unit(), today));
                    }
                    if let Some(saved) = self.controller.saved_city() {
                        println!();
                        println!(
                            "Saved city: {}. Run `weather forget` to use your current location.",
                            saved.name
                        );
                    }
                    break;
                }
            }
        }

        if let (Phase::Failed, Some(failure)) =
            (self.controller.phase(), self.controller.failure())
        {
            bail!("{}", failure.error);
        }

        Ok(())
    }
}

/// Prompt for a city, fetch suggestions once typing settles, and let the user pick.
async fn pick_city(
    provider: Arc<dyn WeatherProvider>,
    config: &Config,
) -> anyhow::Result<Option<SearchTarget>> {
    let mut search = Autocomplete::new(provider, config.debounce());

    let text = Text::new("City:").prompt().context("Failed to read city name")?;
    search.input(text);
    search.settle().await;

    let labels = match search.state().dropdown() {
        Dropdown::Suggestions { items, .. } => {
            items.iter().map(|c| c.label()).collect::<Vec<_>>()
        }
        _ => return Ok(search.submit()),
    };

    let picked = Select::new("Pick a city:", labels)
        .raw_prompt()
        .context("Failed to read selection")?;

    Ok(search.select(picked.index))
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    config.default_city = Text::new("Default city:")
        .with_default(&config.default_city)
        .prompt()
        .context("Failed to read default city")?;

    let set_home = Confirm::new("Use a fixed home location instead of the default city?")
        .with_default(config.home.is_some())
        .prompt()
        .context("Failed to read answer")?;

    config.home = if set_home {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read longitude")?;
        Some(Coordinates::new(latitude, longitude))
    } else {
        None
    };

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_show_with_negative_coordinates() {
        let cli = Cli::try_parse_from(["weather", "show", "--lat", "-33.87", "--lon", "151.21"])
            .expect("should parse");
        match cli.command {
            Command::Show { lat, lon, no_location } => {
                assert_eq!(lat, Some(-33.87));
                assert_eq!(lon, Some(151.21));
                assert!(!no_location);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.unit, UnitArg::C);
    }

    #[test]
    fn lat_requires_lon() {
        assert!(Cli::try_parse_from(["weather", "show", "--lat", "1.0"]).is_err());
    }

    #[test]
    fn no_location_conflicts_with_coordinates() {
        let cli = Cli::try_parse_from(["weather", "show", "--no-location"]).unwrap();
        assert!(matches!(cli.command, Command::Show { no_location: true, .. }));
        assert!(
            Cli::try_parse_from(["weather", "show", "--no-location", "--lat", "1", "--lon", "2"])
                .is_err()
        );
    }

    #[test]
    fn unit_flag_is_global() {
        let cli = Cli::try_parse_from(["weather", "search", "Paris", "--unit", "f"]).unwrap();
        assert_eq!(Unit::from(cli.unit), Unit::Fahrenheit);
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
