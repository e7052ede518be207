//! Fixed-priority failover over weather adapters.

use std::{sync::Arc, time::Duration};

use serde_json::Value;
use tokio::time::{Instant, timeout_at};

use crate::{
    Config,
    aqi::{epa_to_display_aqi, valid_epa},
    dataset::Dataset,
    error::{AdapterError, AdapterErrorKind, ResolutionError},
    fields::Lookup,
    mapper,
    model::{RawPayload, WeatherRecord},
    provider::{AdapterSource, FetchOptions, WeatherAdapter, adapters_from_config},
};

/// Calls adapters one after another until one succeeds.
///
/// Order is the order of the adapter list; there is no racing or reordering.
/// An optional budget bounds the whole chain: every call receives the shared
/// deadline and is cut off once it passes.
#[derive(Debug, Clone)]
pub struct FailoverResolver {
    adapters: Vec<Arc<dyn WeatherAdapter>>,
    budget: Option<Duration>,
}

impl FailoverResolver {
    pub fn new(adapters: Vec<Arc<dyn WeatherAdapter>>) -> Self {
        Self { adapters, budget: None }
    }

    /// Full chain from config: keyed live providers, dataset, snapshot.
    pub fn from_config(config: &Config, dataset: Arc<Dataset>) -> Self {
        Self::new(adapters_from_config(config, dataset)).with_budget(config.http.budget())
    }

    pub fn with_budget(mut self, budget: Option<Duration>) -> Self {
        self.budget = budget;
        self
    }

    pub fn sources(&self) -> Vec<AdapterSource> {
        self.adapters.iter().map(|a| a.source()).collect()
    }

    /// Current conditions, normalized into a [`WeatherRecord`].
    pub async fn resolve_current(&self, city: &str) -> Result<WeatherRecord, ResolutionError> {
        let (source, mut payload) = self
            .first_success(city, FetchOptions::current())
            .await
            .ok_or(ResolutionError::NoValidData)?;

        if source == AdapterSource::WeatherApi {
            inject_display_aqi(&mut payload);
        }

        Ok(mapper::to_record(&payload))
    }

    /// Provider-shaped forecast payload for `days` days (clamped to 1..=15).
    pub async fn resolve_forecast(
        &self,
        city: &str,
        days: i64,
    ) -> Result<RawPayload, ResolutionError> {
        self.first_success(city, FetchOptions::forecast(days))
            .await
            .map(|(_, payload)| payload)
            .ok_or(ResolutionError::ForecastNotAvailable)
    }

    async fn first_success(
        &self,
        city: &str,
        options: FetchOptions,
    ) -> Option<(AdapterSource, RawPayload)> {
        let deadline = self.budget.map(|b| Instant::now() + b);
        let options = options.with_deadline(deadline);

        for adapter in &self.adapters {
            let source = adapter.source();
            match call(adapter.as_ref(), city, &options).await {
                Ok(payload) => {
                    tracing::debug!(%source, city, "provider answered");
                    return Some((source, payload));
                }
                Err(e) => {
                    tracing::warn!(
                        %source,
                        city,
                        kind = %e.kind,
                        error = %e.message,
                        "provider failed, trying next"
                    );
                }
            }
        }

        tracing::warn!(city, attempted = self.adapters.len(), "all providers failed");
        None
    }
}

async fn call(
    adapter: &dyn WeatherAdapter,
    city: &str,
    options: &FetchOptions,
) -> Result<RawPayload, AdapterError> {
    match options.deadline {
        Some(deadline) => timeout_at(deadline, adapter.fetch(city, options))
            .await
            .unwrap_or_else(|_| {
                Err(AdapterError::new(AdapterErrorKind::Timeout, "resolution budget exhausted"))
            }),
        None => adapter.fetch(city, options).await,
    }
}

/// Add the display AQI under `aqi` for consumers of the raw primary payload.
fn inject_display_aqi(payload: &mut RawPayload) {
    let epa = Lookup::root(payload)
        .get("current")
        .get("air_quality")
        .get("us-epa-index")
        .integer();

    if let Some(aqi) = epa_to_display_aqi(valid_epa(epa).map(i64::from)) {
        payload.insert("aqi".into(), Value::from(aqi));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Scripted {
        source: AdapterSource,
        reply: Result<Value, AdapterErrorKind>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(source: AdapterSource, payload: Value) -> Arc<Self> {
            Arc::new(Self { source, reply: Ok(payload), delay: None, calls: AtomicUsize::new(0) })
        }

        fn failing(source: AdapterSource) -> Arc<Self> {
            Arc::new(Self {
                source,
                reply: Err(AdapterErrorKind::Transport),
                delay: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn hanging(source: AdapterSource) -> Arc<Self> {
            Arc::new(Self {
                source,
                reply: Ok(json!({"temperature": 1})),
                delay: Some(Duration::from_secs(3600)),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherAdapter for Scripted {
        fn source(&self) -> AdapterSource {
            self.source
        }

        async fn fetch(
            &self,
            _city: &str,
            _options: &FetchOptions,
        ) -> Result<RawPayload, AdapterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.reply {
                Ok(Value::Object(m)) => Ok(m.clone()),
                Ok(_) => Err(AdapterError::malformed("not an object")),
                Err(kind) => Err(AdapterError::new(*kind, "scripted failure")),
            }
        }
    }

    fn chain(adapters: &[Arc<Scripted>]) -> FailoverResolver {
        FailoverResolver::new(
            adapters.iter().map(|a| a.clone() as Arc<dyn WeatherAdapter>).collect(),
        )
    }

    #[tokio::test]
    async fn first_success_wins_and_later_adapters_are_skipped() {
        let primary = Scripted::failing(AdapterSource::WeatherApi);
        let secondary = Scripted::ok(
            AdapterSource::OpenWeather,
            json!({
                "city": "Paris",
                "temperature": 18.0,
                "condition": "Clear",
                "source": "OpenWeatherMap"
            }),
        );
        let dataset =
            Scripted::ok(AdapterSource::Dataset, json!({"city": "Paris", "condition": "Fog"}));

        let resolver = chain(&[primary.clone(), secondary.clone(), dataset.clone()]);
        let rec = resolver.resolve_current("Paris").await.expect("secondary succeeds");

        let expected = secondary.reply.as_ref().ok().and_then(Value::as_object).expect("object");
        assert_eq!(rec, mapper::to_record(expected));
        assert_eq!(rec.source, "OpenWeatherMap");
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
        assert_eq!(dataset.calls(), 0);
    }

    #[tokio::test]
    async fn all_failures_yield_no_valid_data() {
        let resolver = chain(&[
            Scripted::failing(AdapterSource::WeatherApi),
            Scripted::failing(AdapterSource::Dataset),
        ]);

        assert_eq!(
            resolver.resolve_current("Nowhere").await.unwrap_err(),
            ResolutionError::NoValidData
        );
        assert_eq!(
            resolver.resolve_forecast("Nowhere", 3).await.unwrap_err(),
            ResolutionError::ForecastNotAvailable
        );
    }

    #[tokio::test]
    async fn empty_chain_yields_no_valid_data() {
        let resolver = FailoverResolver::new(Vec::new());
        assert_eq!(
            resolver.resolve_current("Oslo").await.unwrap_err(),
            ResolutionError::NoValidData
        );
    }

    #[tokio::test]
    async fn primary_success_injects_display_aqi() {
        let primary = Scripted::ok(
            AdapterSource::WeatherApi,
            json!({
                "location": {"name": "Delhi"},
                "current": {"temp_c": 31.0, "air_quality": {"us-epa-index": 4}}
            }),
        );
        let resolver = chain(&[primary]);
        let rec = resolver.resolve_current("Delhi").await.expect("primary succeeds");

        assert_eq!(rec.aqi, Some(175));
        assert_eq!(rec.epa_index, Some(4));
    }

    #[test]
    fn inject_display_aqi_writes_raw_field() {
        let mut payload = match json!({"current": {"air_quality": {"us-epa-index": 1}}}) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        inject_display_aqi(&mut payload);
        assert_eq!(payload["aqi"], 25);

        let mut without = RawPayload::new();
        inject_display_aqi(&mut without);
        assert!(!without.contains_key("aqi"));
    }

    #[tokio::test]
    async fn forecast_returns_payload_unnormalized() {
        let snapshot =
            Scripted::ok(AdapterSource::Snapshot, json!({"forecast": {"forecastday": []}}));
        let resolver = chain(&[Scripted::failing(AdapterSource::WeatherApi), snapshot]);

        let payload = resolver.resolve_forecast("Lima", 99).await.expect("snapshot forecast");
        assert!(payload.contains_key("forecast"));
    }

    #[tokio::test(start_paused = true)]
    async fn budget_cuts_off_hanging_provider() {
        let hanging = Scripted::hanging(AdapterSource::WeatherApi);
        let dataset =
            Scripted::ok(AdapterSource::Dataset, json!({"city": "Quito", "condition": "Mist"}));

        let resolver = chain(&[hanging.clone(), dataset.clone()])
            .with_budget(Some(Duration::from_secs(5)));
        let rec = resolver.resolve_current("Quito").await.expect("dataset answers after timeout");

        assert_eq!(rec.city, "Quito");
        assert_eq!(hanging.calls(), 1);
        assert_eq!(dataset.calls(), 1);
    }
}
