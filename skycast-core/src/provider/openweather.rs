use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::{Value, json};

use crate::{
    error::AdapterError,
    fields::Lookup,
    model::RawPayload,
    provider::{FetchOptions, into_object, send_json, validate_city},
    text::mps_to_kph,
};

use super::{AdapterSource, WeatherAdapter};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

pub const SOURCE_LABEL: &str = "OpenWeatherMap";

/// Secondary live provider: OpenWeatherMap current conditions.
///
/// Requests metric units, so wind arrives in m/s and is rewritten to km/h
/// before the payload leaves the adapter. The result is already in unified
/// shape.
#[derive(Debug, Clone)]
pub struct OpenWeatherAdapter {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherAdapter {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, timeout, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, timeout: Duration, base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("skycast/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client for OpenWeatherMap")?;

        Ok(Self {
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            http,
        })
    }

    async fn fetch_current(
        &self,
        city: &str,
        options: &FetchOptions,
    ) -> Result<RawPayload, AdapterError> {
        let request = self.http.get(format!("{}/weather", self.base_url)).query(&[
            ("q", city),
            ("appid", self.api_key.as_str()),
            ("units", "metric"),
        ]);

        let label = "OpenWeather current";
        let payload = into_object(send_json(request, options, label).await?, label)?;
        reject_error_payload(&payload, label)?;

        Ok(to_unified(&payload, city))
    }
}

/// OpenWeather embeds its own status as `cod` (number or string).
fn reject_error_payload(payload: &RawPayload, label: &str) -> Result<(), AdapterError> {
    let root = Lookup::root(payload);
    match root.get("cod").integer() {
        Some(200) | None => Ok(()),
        Some(code) => {
            let message = root
                .get("message")
                .text()
                .unwrap_or_else(|| "unspecified error".to_string());
            Err(AdapterError::upstream(format!("{label}: {code} {message}")))
        }
    }
}

/// Rewrite an OpenWeather payload into the unified field set.
fn to_unified(payload: &RawPayload, query: &str) -> RawPayload {
    let root = Lookup::root(payload);
    let main = root.get("main");
    let first = root.get("weather").objects().into_iter().next();

    let city = root.get("name").text().unwrap_or_else(|| query.to_string());
    let condition = first.and_then(|w| w.get("description").text()).unwrap_or_default();
    let icon = first.and_then(|w| w.get("icon").text());

    let out = json!({
        "city": city,
        "date": Utc::now().to_rfc3339(),
        "temperature": main.get("temp").number(),
        "high": main.get("temp_max").number(),
        "low": main.get("temp_min").number(),
        "humidity": main.get("humidity").number(),
        "wind": root.get("wind").get("speed").number().map(mps_to_kph),
        "condition": condition,
        "icon": icon,
        "source": SOURCE_LABEL,
    });

    match out {
        Value::Object(map) => map,
        _ => RawPayload::new(),
    }
}

#[async_trait]
impl WeatherAdapter for OpenWeatherAdapter {
    fn source(&self) -> AdapterSource {
        AdapterSource::OpenWeather
    }

    async fn fetch(&self, city: &str, options: &FetchOptions) -> Result<RawPayload, AdapterError> {
        let city = validate_city(city)?;

        if options.days.is_some() {
            return Err(AdapterError::unsupported(
                "OpenWeather adapter serves current conditions only",
            ));
        }

        self.fetch_current(city, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterErrorKind;

    fn object(v: Value) -> RawPayload {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn unified_rewrite_converts_wind_to_kph() {
        let payload = object(json!({
            "name": "Paris",
            "main": {"temp": 18.2, "temp_max": 20.0, "temp_min": 15.5, "humidity": 60},
            "wind": {"speed": 10.0},
            "weather": [{"description": "scattered clouds", "icon": "03d"}],
            "cod": 200
        }));

        let out = to_unified(&payload, "paris");
        assert_eq!(out["city"], "Paris");
        assert_eq!(out["wind"], 36.0);
        assert_eq!(out["temperature"], 18.2);
        assert_eq!(out["condition"], "scattered clouds");
        assert_eq!(out["source"], SOURCE_LABEL);
    }

    #[test]
    fn missing_blocks_become_nulls() {
        let out = to_unified(&object(json!({"weather": []})), "Lima");
        assert_eq!(out["city"], "Lima");
        assert!(out["wind"].is_null());
        assert_eq!(out["condition"], "");
    }

    #[test]
    fn string_cod_error_is_rejected() {
        let payload = object(json!({"cod": "404", "message": "city not found"}));
        let err = reject_error_payload(&payload, "OpenWeather current").unwrap_err();
        assert_eq!(err.kind, AdapterErrorKind::Upstream);
        assert!(err.message.contains("city not found"));
    }
}
