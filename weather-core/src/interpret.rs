//! WMO weather code interpretation.
//!
//! See: https://open-meteo.com/en/docs#weathervariables

use serde::{Deserialize, Serialize};

/// Which icon the presentation layer should draw for a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconKind {
    Sun,
    Moon,
    Cloud,
    CloudSun,
    CloudMoon,
    CloudDrizzle,
    CloudRain,
    CloudSnow,
    CloudFog,
    CloudLightning,
}

impl IconKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IconKind::Sun => "sun",
            IconKind::Moon => "moon",
            IconKind::Cloud => "cloud",
            IconKind::CloudSun => "cloud_sun",
            IconKind::CloudMoon => "cloud_moon",
            IconKind::CloudDrizzle => "cloud_drizzle",
            IconKind::CloudRain => "cloud_rain",
            IconKind::CloudSnow => "cloud_snow",
            IconKind::CloudFog => "cloud_fog",
            IconKind::CloudLightning => "cloud_lightning",
        }
    }
}

impl std::fmt::Display for IconKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human description plus icon for one weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interpretation {
    pub description: &'static str,
    pub icon: IconKind,
}

struct Entry {
    description: &'static str,
    day: IconKind,
    night: IconKind,
}

const fn entry(description: &'static str, day: IconKind, night: IconKind) -> Entry {
    Entry { description, day, night }
}

fn lookup(code: i32) -> Option<Entry> {
    use IconKind::*;

    let e = match code {
        0 => entry("Clear sky", Sun, Moon),
        1 => entry("Mainly clear", CloudSun, CloudMoon),
        2 => entry("Partly cloudy", CloudSun, CloudMoon),
        3 => entry("Overcast", Cloud, Cloud),
        45 => entry("Fog", CloudFog, CloudFog),
        48 => entry("Depositing rime fog", CloudFog, CloudFog),
        51 => entry("Light drizzle", CloudDrizzle, CloudDrizzle),
        53 => entry("Moderate drizzle", CloudDrizzle, CloudDrizzle),
        55 => entry("Dense drizzle", CloudDrizzle, CloudDrizzle),
        56 => entry("Light freezing drizzle", CloudDrizzle, CloudDrizzle),
        57 => entry("Dense freezing drizzle", CloudDrizzle, CloudDrizzle),
        61 => entry("Slight rain", CloudRain, CloudRain),
        63 => entry("Moderate rain", CloudRain, CloudRain),
        65 => entry("Heavy rain", CloudRain, CloudRain),
        66 => entry("Light freezing rain", CloudRain, CloudRain),
        67 => entry("Heavy freezing rain", CloudRain, CloudRain),
        71 => entry("Slight snow fall", CloudSnow, CloudSnow),
        73 => entry("Moderate snow fall", CloudSnow, CloudSnow),
        75 => entry("Heavy snow fall", CloudSnow, CloudSnow),
        77 => entry("Snow grains", CloudSnow, CloudSnow),
        80 => entry("Slight rain showers", CloudRain, CloudRain),
        81 => entry("Moderate rain showers", CloudRain, CloudRain),
        82 => entry("Violent rain showers", CloudRain, CloudRain),
        85 => entry("Slight snow showers", CloudSnow, CloudSnow),
        86 => entry("Heavy snow showers", CloudSnow, CloudSnow),
        95 => entry("Thunderstorm", CloudLightning, CloudLightning),
        96 => entry("Slight hail", CloudLightning, CloudLightning),
        99 => entry("Heavy hail", CloudLightning, CloudLightning),
        _ => return None,
    };

    Some(e)
}

/// Map a WMO code and day/night flag to a description and icon.
///
/// Unknown codes never fail: they read as "Unknown" with a sun or moon icon.
pub fn interpret(code: i32, is_day: bool) -> Interpretation {
    let e = lookup(code).unwrap_or(entry("Unknown", IconKind::Sun, IconKind::Moon));

    Interpretation {
        description: e.description,
        icon: if is_day { e.day } else { e.night },
    }
}
