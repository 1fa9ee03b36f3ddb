//! The single persisted "last searched city".

use anyhow::{Context, Result};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{Config, model::CitySuggestion};

/// File name of the stored record inside the data directory.
pub const LAST_CITY_KEY: &str = "last_city.json";

/// Storage for the last searched city. At most one record exists.
pub trait PreferenceStore: Send {
    /// Unreadable or malformed records read as absent.
    fn load(&self) -> Option<CitySuggestion>;

    /// Overwrite the stored record.
    fn save(&mut self, city: &CitySuggestion) -> Result<()>;

    fn clear(&mut self) -> Result<()>;
}

fn decode(raw: &str) -> Option<CitySuggestion> {
    match serde_json::from_str(raw) {
        Ok(city) => Some(city),
        Err(err) => {
            tracing::warn!(error = %err, "Ignoring unreadable saved city");
            None
        }
    }
}

/// JSON file in the platform data directory.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location for this platform.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Config::data_dir()?.join(LAST_CITY_KEY)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Option<CitySuggestion> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "Failed to read saved city");
                None
            }
        }
    }

    fn save(&mut self, city: &CitySuggestion) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string(city).context("Failed to serialize saved city")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write saved city: {}", self.path.display()))
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("Failed to remove saved city: {}", self.path.display())),
        }
    }
}

/// In-memory store holding the serialized record.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    raw: Option<String>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an arbitrary raw value, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self { raw: Some(raw.into()) }
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Option<CitySuggestion> {
        self.raw.as_deref().and_then(decode)
    }

    fn save(&mut self, city: &CitySuggestion) -> Result<()> {
        self.raw = Some(serde_json::to_string(city).context("Failed to serialize saved city")?);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.raw = None;
        Ok(())
    }
}
