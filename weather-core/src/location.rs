use async_trait::async_trait;
use thiserror::Error;

use crate::model::Coordinates;

/// Location service errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    Unavailable,
}

/// Source of the device position used at startup.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// Geolocator answering with a fixed position, or a fixed error when unset.
#[derive(Debug, Clone)]
pub struct StaticGeolocator {
    answer: Result<Coordinates, LocationError>,
}

impl StaticGeolocator {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { answer: position.ok_or(LocationError::Unavailable) }
    }

    pub fn unavailable() -> Self {
        Self::new(None)
    }

    /// The user refused to share a position.
    pub fn denied() -> Self {
        Self { answer: Err(LocationError::PermissionDenied) }
    }
}

#[async_trait]
impl Geolocator for StaticGeolocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        self.answer.clone()
    }
}
