//! Human-readable rendering of core results.

use serde::Serialize;
use skycast_core::{
    CityRow, RawPayload, SearchOutcome, WeatherRecord, aqi::aqi_category, mapper,
};

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_current(record: &WeatherRecord) {
    for line in current_lines(record) {
        println!("{line}");
    }
}

pub fn print_forecast(payload: &RawPayload) {
    let record = mapper::to_record(payload);
    println!("{} ({})", heading(&record.city), record.source);

    if record.daily.is_empty() {
        println!("  no daily forecast in this payload");
        return;
    }

    for day in &record.daily {
        println!(
            "  {:<10}  {:>6} / {:<6}  {}",
            day.date.as_deref().unwrap_or("?"),
            degrees(day.max),
            degrees(day.min),
            day.condition.as_deref().unwrap_or(""),
        );
    }
}

pub fn print_search(outcome: &SearchOutcome) {
    if outcome.results.is_empty() {
        println!("No matching cities.");
        return;
    }

    for c in &outcome.results {
        let place: Vec<&str> = [c.region.as_deref(), c.country.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();

        if place.is_empty() {
            println!("  {}", c.name);
        } else {
            println!("  {} ({})", c.name, place.join(", "));
        }
    }

    if let Some(best) = &outcome.best_match {
        println!("Best match: {}", best.name);
    }
}

pub fn print_row(row: &CityRow) {
    println!("{}", heading(row.city_name().unwrap_or_default()));
    if let Some(date) = &row.date {
        println!("  Date:        {date}");
    }
    println!("  Temperature: {}", degrees(row.temperature));
    println!("  High / Low:  {} / {}", degrees(row.high), degrees(row.low));
    if let Some(h) = row.humidity {
        println!("  Humidity:    {h}%");
    }
    if let Some(w) = row.wind {
        println!("  Wind:        {w} km/h");
    }
    if let Some(c) = &row.condition {
        println!("  Condition:   {c}");
    }
}

fn current_lines(record: &WeatherRecord) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", heading(&record.city), record.source)];

    lines.push(format!("  {}  {}", degrees(record.temperature), record.condition));
    if record.high.is_some() || record.low.is_some() {
        lines.push(format!("  High / Low:  {} / {}", degrees(record.high), degrees(record.low)));
    }
    if let Some(h) = record.humidity {
        lines.push(format!("  Humidity:    {h}%"));
    }
    if let Some(w) = record.wind {
        lines.push(format!("  Wind:        {w} km/h"));
    }
    if let Some(uv) = record.uv {
        lines.push(format!("  UV index:    {uv}"));
    }
    if let Some(aqi) = record.aqi {
        lines.push(format!("  Air quality: {aqi} ({})", aqi_category(aqi)));
    }
    if let (Some(rise), Some(set)) = (&record.sunrise, &record.sunset) {
        lines.push(format!("  Sun:         {rise} - {set}"));
    }

    lines
}

fn heading(city: &str) -> &str {
    if city.is_empty() { "Unknown location" } else { city }
}

fn degrees(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.1}°C")).unwrap_or_else(|| "-".to_string())
}
