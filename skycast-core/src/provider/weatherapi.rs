use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::{
    error::AdapterError,
    fields::Lookup,
    model::RawPayload,
    provider::{FetchOptions, into_object, send_json, validate_city},
    search::CityCandidate,
};

use super::{AdapterSource, WeatherAdapter};

const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// Primary live provider: weatherapi.com.
///
/// Payloads are returned in the provider's own shape (`location`, `current`,
/// optional `forecast`); the mapper takes care of unification.
#[derive(Debug, Clone)]
pub struct WeatherApiAdapter {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiAdapter {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, timeout, DEFAULT_BASE_URL)
    }

    /// Point the adapter at another host, e.g. a mock server in tests.
    pub fn with_base_url(api_key: &str, timeout: Duration, base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("skycast/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client for WeatherAPI.com")?;

        Ok(Self {
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            http,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }

    async fn fetch_current(
        &self,
        city: &str,
        options: &FetchOptions,
    ) -> Result<RawPayload, AdapterError> {
        let request = self.http.get(self.url("current.json")).query(&[
            ("key", self.api_key.as_str()),
            ("q", city),
            ("aqi", "yes"),
        ]);

        let label = "WeatherAPI current";
        let payload = into_object(send_json(request, options, label).await?, label)?;
        reject_error_payload(payload, label)
    }

    async fn fetch_forecast(
        &self,
        city: &str,
        days: u8,
        options: &FetchOptions,
    ) -> Result<RawPayload, AdapterError> {
        let days = days.to_string();
        let request = self.http.get(self.url("forecast.json")).query(&[
            ("key", self.api_key.as_str()),
            ("q", city),
            ("days", days.as_str()),
            ("aqi", "yes"),
            ("alerts", "yes"),
        ]);

        let label = "WeatherAPI forecast";
        let payload = into_object(send_json(request, options, label).await?, label)?;
        reject_error_payload(payload, label)
    }

    /// Autocomplete lookup against `search.json`.
    pub async fn search(
        &self,
        query: &str,
        options: &FetchOptions,
    ) -> Result<Vec<CityCandidate>, AdapterError> {
        let query = validate_city(query)?;
        let request = self
            .http
            .get(self.url("search.json"))
            .query(&[("key", self.api_key.as_str()), ("q", query)]);

        let label = "WeatherAPI search";
        let value = send_json(request, options, label).await?;
        if let Some(obj) = value.as_object() {
            reject_error_payload(obj.clone(), label)?;
        }

        serde_json::from_value(value)
            .map_err(|e| AdapterError::malformed(format!("{label}: unexpected result list: {e}")))
    }
}

/// WeatherAPI reports failures as `{"error": {"code": .., "message": ..}}`.
fn reject_error_payload(payload: RawPayload, label: &str) -> Result<RawPayload, AdapterError> {
    if !payload.contains_key("error") {
        return Ok(payload);
    }

    let error = Lookup::root(&payload).get("error");
    let message = error
        .get("message")
        .text()
        .or_else(|| error.text())
        .unwrap_or_else(|| "unspecified error".to_string());

    Err(AdapterError::upstream(format!("{label}: {message}")))
}

#[async_trait]
impl WeatherAdapter for WeatherApiAdapter {
    fn source(&self) -> AdapterSource {
        AdapterSource::WeatherApi
    }

    async fn fetch(&self, city: &str, options: &FetchOptions) -> Result<RawPayload, AdapterError> {
        let city = validate_city(city)?;

        match options.days {
            None => self.fetch_current(city, options).await,
            Some(days) => self.fetch_forecast(city, days, options).await,
        }
    }
}
