//! City autocomplete: local index first, remote provider second.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    Config,
    dataset::Dataset,
    error::{AdapterError, AdapterErrorKind},
    places::{PlaceIndex, PlaceIndexCell, best_match},
    provider::{FetchOptions, ProviderId, weatherapi::WeatherApiAdapter},
};

pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// A suggested city. Extra fields from remote providers are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityCandidate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl CityCandidate {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), region: None, country: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub results: Vec<CityCandidate>,
    pub best_match: Option<CityCandidate>,
}

/// Owns the place index (built lazily from the dataset) and the optional
/// remote autocomplete endpoint.
#[derive(Debug, Clone)]
pub struct CitySearch {
    places: Arc<PlaceIndexCell>,
    dataset: Arc<Dataset>,
    remote: Option<WeatherApiAdapter>,
}

impl CitySearch {
    pub fn new(dataset: Arc<Dataset>, remote: Option<WeatherApiAdapter>) -> Self {
        Self { places: Arc::new(PlaceIndexCell::new()), dataset, remote }
    }

    /// Remote fallback is enabled when the primary provider has a key.
    pub fn from_config(config: &Config, dataset: Arc<Dataset>) -> Self {
        let remote = config.provider_api_key(ProviderId::WeatherApi).and_then(|key| {
            WeatherApiAdapter::new(key, config.http.timeout())
                .inspect_err(|e| tracing::warn!(error = %e, "remote city search disabled"))
                .ok()
        });
        Self::new(dataset, remote)
    }

    /// The place index, built from the dataset on first use.
    pub fn index(&self) -> Arc<PlaceIndex> {
        self.places
            .get_or_build(|| PlaceIndex::from_rows(self.dataset.rows().iter().cloned()))
    }

    pub fn places(&self) -> &PlaceIndexCell {
        &self.places
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<SearchOutcome, AdapterError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AdapterError::new(
                AdapterErrorKind::InvalidQuery,
                "search query must not be empty",
            ));
        }

        let index = self.index();
        let mut results: Vec<CityCandidate> =
            index.search(query, limit).into_iter().map(CityCandidate::named).collect();

        if results.is_empty() {
            if let Some(remote) = &self.remote {
                tracing::debug!(query, "no local match, asking remote search");
                results = remote.search(query, &FetchOptions::current()).await?;
                results.truncate(limit);
            }
        }

        let best_match = best_match(query, &results).cloned();
        Ok(SearchOutcome { results, best_match })
    }
}
