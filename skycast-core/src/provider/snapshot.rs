use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::AdapterError,
    model::RawPayload,
    provider::{FetchOptions, validate_city},
};

use super::{AdapterSource, WeatherAdapter};

/// Last-resort fallback: a static JSON document captured from a provider.
///
/// The snapshot is returned regardless of the requested city.
#[derive(Debug, Clone, Default)]
pub struct SnapshotAdapter {
    payload: RawPayload,
}

impl SnapshotAdapter {
    pub fn new(payload: RawPayload) -> Self {
        Self { payload }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the snapshot from disk; failures leave the adapter empty.
    pub fn load(path: &Path) -> Self {
        match read_snapshot(path) {
            Ok(payload) => {
                tracing::info!(
                    path = %path.display(),
                    keys = payload.len(),
                    "loaded fallback snapshot"
                );
                Self { payload }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "fallback snapshot unavailable");
                Self::empty()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

fn read_snapshot(path: &Path) -> Result<RawPayload> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;

    match serde_json::from_str::<Value>(&contents)
        .with_context(|| format!("Failed to parse snapshot file: {}", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => Err(anyhow!("Snapshot file is not a JSON object: {}", path.display())),
    }
}

#[async_trait]
impl WeatherAdapter for SnapshotAdapter {
    fn source(&self) -> AdapterSource {
        AdapterSource::Snapshot
    }

    async fn fetch(&self, city: &str, options: &FetchOptions) -> Result<RawPayload, AdapterError> {
        validate_city(city)?;

        if self.payload.is_empty() {
            return Err(AdapterError::not_found("no fallback snapshot loaded"));
        }

        if options.days.is_some() && !self.payload.contains_key("forecast") {
            return Err(AdapterError::not_found("fallback snapshot has no forecast"));
        }

        Ok(self.payload.clone())
    }
}
