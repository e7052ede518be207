use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    dataset::{CityRow, Dataset},
    error::AdapterError,
    model::RawPayload,
    provider::{FetchOptions, validate_city},
};

use super::{AdapterSource, WeatherAdapter};

pub const SOURCE_LABEL: &str = "Offline CSV";

/// Offline fallback over rows loaded from the CSV dataset.
#[derive(Debug, Clone)]
pub struct DatasetAdapter {
    dataset: Arc<Dataset>,
}

impl DatasetAdapter {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset }
    }

    /// First row whose city equals `city`, ignoring case.
    fn find(&self, city: &str) -> Option<&CityRow> {
        let wanted = city.to_lowercase();
        self.dataset
            .rows()
            .iter()
            .find(|row| row.city_name().is_some_and(|c| c.to_lowercase() == wanted))
    }
}

/// Dataset rows in payload form. Absent numbers are left out entirely.
pub fn row_payload(row: &CityRow) -> RawPayload {
    let mut out = RawPayload::new();
    out.insert("city".into(), json!(row.city_name().unwrap_or_default()));

    let numbers = [
        ("temperature", row.temperature),
        ("high", row.high),
        ("low", row.low),
        ("humidity", row.humidity),
        ("wind", row.wind),
    ];
    for (key, value) in numbers {
        if let Some(v) = value {
            out.insert(key.into(), json!(v));
        }
    }

    if let Some(date) = &row.date {
        out.insert("date".into(), Value::String(date.clone()));
    }
    out.insert(
        "condition".into(),
        Value::String(row.condition.clone().unwrap_or_else(|| "Unknown".to_string())),
    );
    out.insert("source".into(), Value::String(SOURCE_LABEL.to_string()));
    out
}

#[async_trait]
impl WeatherAdapter for DatasetAdapter {
    fn source(&self) -> AdapterSource {
        AdapterSource::Dataset
    }

    async fn fetch(&self, city: &str, options: &FetchOptions) -> Result<RawPayload, AdapterError> {
        let city = validate_city(city)?;

        if options.days.is_some() {
            return Err(AdapterError::unsupported("dataset holds no forecasts"));
        }

        self.find(city)
            .map(row_payload)
            .ok_or_else(|| AdapterError::not_found(format!("no dataset row for '{city}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterErrorKind;

    fn dataset() -> Arc<Dataset> {
        Arc::new(Dataset::new(vec![
            CityRow {
                city: Some("Berlin".into()),
                temperature: Some(11.0),
                condition: Some("Cloudy".into()),
                ..Default::default()
            },
            CityRow {
                city: Some("BERLIN".into()),
                temperature: Some(99.0),
                ..Default::default()
            },
            CityRow { city: Some("Madrid".into()), ..Default::default() },
        ]))
    }

    #[tokio::test]
    async fn matches_case_insensitively_and_takes_first_row() {
        let adapter = DatasetAdapter::new(dataset());
        let payload = adapter.fetch("berlin", &FetchOptions::current()).await.expect("row");

        assert_eq!(payload["city"], "Berlin");
        assert_eq!(payload["temperature"], 11.0);
        assert_eq!(payload["source"], SOURCE_LABEL);
    }

    #[tokio::test]
    async fn absent_values_are_omitted_and_condition_defaults() {
        let adapter = DatasetAdapter::new(dataset());
        let payload = adapter.fetch("Madrid", &FetchOptions::current()).await.expect("row");

        assert!(!payload.contains_key("temperature"));
        assert_eq!(payload["condition"], "Unknown");
    }

    #[tokio::test]
    async fn unknown_city_is_not_found() {
        let adapter = DatasetAdapter::new(dataset());
        let err = adapter.fetch("Atlantis", &FetchOptions::current()).await.unwrap_err();
        assert_eq!(err.kind, AdapterErrorKind::NotFound);
    }

    #[tokio::test]
    async fn substring_is_not_a_match() {
        let adapter = DatasetAdapter::new(dataset());
        let err = adapter.fetch("Berl", &FetchOptions::current()).await.unwrap_err();
        assert_eq!(err.kind, AdapterErrorKind::NotFound);
    }

    #[tokio::test]
    async fn forecast_is_unsupported() {
        let adapter = DatasetAdapter::new(dataset());
        let err = adapter.fetch("Berlin", &FetchOptions::forecast(3)).await.unwrap_err();
        assert_eq!(err.kind, AdapterErrorKind::Unsupported);
    }
}
