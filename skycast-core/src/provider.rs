use crate::{
    Config,
    dataset::Dataset,
    error::{AdapterError, AdapterErrorKind},
    model::RawPayload,
    provider::{
        dataset::DatasetAdapter, openweather::OpenWeatherAdapter, snapshot::SnapshotAdapter,
        weatherapi::WeatherApiAdapter,
    },
};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde_json::Value;
use std::{convert::TryFrom, fmt::Debug, sync::Arc, time::Duration};
use tokio::time::Instant;

pub mod dataset;
pub mod openweather;
pub mod snapshot;
pub mod weatherapi;

pub const MIN_FORECAST_DAYS: u8 = 1;
pub const MAX_FORECAST_DAYS: u8 = 15;
pub const DEFAULT_FORECAST_DAYS: u8 = 7;

/// Live providers that need credentials, in failover priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    WeatherApi,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::WeatherApi => "weatherapi",
            ProviderId::OpenWeather => "openweather",
        }
    }

    /// Environment variable that overrides the configured key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderId::WeatherApi => "WEATHERAPI_KEY",
            ProviderId::OpenWeather => "OPENWEATHER_KEY",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::WeatherApi, ProviderId::OpenWeather]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "weatherapi" => Ok(ProviderId::WeatherApi),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: weatherapi, openweather."
            )),
        }
    }
}

/// Which data source produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterSource {
    WeatherApi,
    OpenWeather,
    Dataset,
    Snapshot,
}

impl AdapterSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterSource::WeatherApi => "weatherapi",
            AdapterSource::OpenWeather => "openweather",
            AdapterSource::Dataset => "dataset",
            AdapterSource::Snapshot => "snapshot",
        }
    }
}

impl std::fmt::Display for AdapterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call knobs threaded through the failover chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// `Some(n)` requests an `n`-day forecast instead of current conditions.
    pub days: Option<u8>,
    /// Point in time after which the call must give up.
    pub deadline: Option<Instant>,
}

impl FetchOptions {
    pub fn current() -> Self {
        Self::default()
    }

    pub fn forecast(days: i64) -> Self {
        Self { days: Some(clamp_days(days)), deadline: None }
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }
}

/// Clamp a requested forecast horizon into `1..=15` days.
pub fn clamp_days(days: i64) -> u8 {
    days.clamp(MIN_FORECAST_DAYS.into(), MAX_FORECAST_DAYS.into()) as u8
}

/// Uniform contract over one weather data source.
///
/// Implementations never panic and never leak anything but [`AdapterError`].
#[async_trait]
pub trait WeatherAdapter: Send + Sync + Debug {
    fn source(&self) -> AdapterSource;

    async fn fetch(&self, city: &str, options: &FetchOptions) -> Result<RawPayload, AdapterError>;
}

/// Reject empty queries before touching any backend.
pub(crate) fn validate_city(city: &str) -> Result<&str, AdapterError> {
    let trimmed = city.trim();
    if trimmed.is_empty() {
        return Err(AdapterError::new(
            AdapterErrorKind::InvalidQuery,
            "city query must not be empty",
        ));
    }
    Ok(trimmed)
}

/// Send a GET and decode the JSON body, mapping every failure into [`AdapterError`].
pub(crate) async fn send_json(
    request: RequestBuilder,
    options: &FetchOptions,
    label: &str,
) -> Result<Value, AdapterError> {
    let request = match options.remaining() {
        Some(left) if left.is_zero() => {
            return Err(AdapterError::new(
                AdapterErrorKind::Timeout,
                format!("{label}: deadline already passed"),
            ));
        }
        Some(left) => request.timeout(left),
        None => request,
    };

    let res = request.send().await.map_err(|e| {
        let err = AdapterError::from(e);
        AdapterError::new(err.kind, format!("{label}: {}", err.message))
    })?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| AdapterError::transport(format!("{label}: failed to read body: {e}")))?;

    if !status.is_success() {
        return Err(AdapterError::upstream(format!(
            "{label} failed with status {status}: {}",
            truncate_body(&body)
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| AdapterError::malformed(format!("{label}: invalid JSON: {e}")))
}

/// Require a JSON object at the top level.
pub(crate) fn into_object(value: Value, label: &str) -> Result<RawPayload, AdapterError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(AdapterError::malformed(format!(
            "{label}: expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

/// Construct a live provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Arc<dyn WeatherAdapter>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `skycast configure {id}` or set {}.",
            id.env_var()
        )
    })?;

    let timeout = config.http.timeout();
    let adapter: Arc<dyn WeatherAdapter> = match id {
        ProviderId::WeatherApi => Arc::new(WeatherApiAdapter::new(api_key, timeout)?),
        ProviderId::OpenWeather => Arc::new(OpenWeatherAdapter::new(api_key, timeout)?),
    };

    Ok(adapter)
}

/// Build the full failover chain: live providers that have keys, then the
/// dataset, then the snapshot.
pub fn adapters_from_config(
    config: &Config,
    dataset: Arc<Dataset>,
) -> Vec<Arc<dyn WeatherAdapter>> {
    let mut chain: Vec<Arc<dyn WeatherAdapter>> = Vec::new();

    for id in ProviderId::all() {
        match provider_from_config(*id, config) {
            Ok(adapter) => chain.push(adapter),
            Err(e) => tracing::warn!(provider = %id, error = %e, "live provider disabled"),
        }
    }

    chain.push(Arc::new(DatasetAdapter::new(dataset)));

    let snapshot = match &config.data.snapshot_path {
        Some(path) => SnapshotAdapter::load(path),
        None => SnapshotAdapter::empty(),
    };
    chain.push(Arc::new(snapshot));

    chain
}
