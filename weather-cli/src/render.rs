use std::fmt::Write;

use chrono::NaiveDate;
use weather_core::{
    CitySuggestion, Notice, Unit, WeatherSnapshot, compass_point, interpret,
};

/// Current conditions card followed by the daily forecast.
pub fn snapshot(weather: &WeatherSnapshot, unit: Unit, today: NaiveDate) -> String {
    let current = &weather.current;
    let now = interpret(current.weather_code, current.is_day);
    let place = weather.label();

    let mut out = String::new();
    let _ = writeln!(out, "{place}");
    let _ = writeln!(out, "{}", today.format("%A, %B %-d, %Y"));
    let _ = writeln!(out, "{} [{}]", now.description, now.icon);
    let _ = writeln!(
        out,
        "{}°{}  wind {} km/h {}",
        unit.convert(current.temperature),
        unit.symbol(),
        current.wind_speed,
        compass_point(current.wind_direction),
    );

    if !weather.daily.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}-Day Forecast", weather.daily.len());
    }

    for day in &weather.daily {
        let icon = interpret(day.weather_code, true).icon;
        let _ = writeln!(
            out,
            "{:<4} {:<16} {:>4}° / {:>4}°  {:>3}%",
            day.day_label(),
            icon.as_str(),
            unit.convert(day.max_temp),
            unit.convert(day.min_temp),
            day.precipitation_probability,
        );
    }

    out
}

pub fn notice(notice: &Notice) -> String {
    format!("{}\n{}", notice.title, notice.message)
}

pub fn suggestions(prefix: &str, found: &[CitySuggestion]) -> String {
    if found.is_empty() {
        return format!("No results found for \"{prefix}\".");
    }

    found
        .iter()
        .map(|c| format!("{} ({:.4}, {:.4})", c.label(), c.latitude, c.longitude))
        .collect::<Vec<_>>()
        .join("\n")
}
