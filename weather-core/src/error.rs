//! Upstream error types and their user-facing classification.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    /// An upstream endpoint answered with a non-success status.
    #[error("API call failed with status {status}")]
    Upstream { status: u16 },

    /// Forward geocoding returned no results.
    #[error("Could not find location: {0}")]
    NotFound(String),

    #[error("Failed to fetch: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to parse {what} response: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Coarse class of a failure, used to pick what the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LocationNotFound,
    ServiceUnavailable,
    Network,
    Unknown,
}

/// Full-page error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub message: &'static str,
}

impl WeatherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::LocationNotFound,
            Self::Upstream { .. } => ErrorKind::ServiceUnavailable,
            Self::Network(_) => ErrorKind::Network,
            Self::Parse { .. } => ErrorKind::Unknown,
        }
    }
}

impl ErrorKind {
    pub fn notice(&self) -> Notice {
        match self {
            Self::LocationNotFound => Notice {
                title: "Location Not Found",
                message: "Sorry, we couldn't find that city. Please check the spelling and try again.",
            },
            Self::ServiceUnavailable => Notice {
                title: "Service Unavailable",
                message: "The weather service is temporarily unavailable. Please try again in a few moments.",
            },
            Self::Network => Notice {
                title: "Network Error",
                message: "Please check your internet connection and try again.",
            },
            Self::Unknown => Notice {
                title: "Error",
                message: "Oops! Something went wrong while fetching the weather. Please try again later.",
            },
        }
    }

    /// Short message shown next to the search box after a failed search.
    pub fn inline_message(&self) -> &'static str {
        match self {
            Self::LocationNotFound => "Could not find that city. Please check the spelling.",
            Self::Network => "Network error. Please check your connection.",
            Self::ServiceUnavailable | Self::Unknown => "An error occurred.",
        }
    }
}
