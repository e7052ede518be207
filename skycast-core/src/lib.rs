//! Core library for `skycast`.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Weather adapters (live providers, offline dataset, static snapshot)
//! - The failover resolver and the payload normalizer
//! - The place-name index and city search
//!
//! It is used by `skycast-cli` and `skycast-server`.

pub mod aqi;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fields;
pub mod mapper;
pub mod model;
pub mod places;
pub mod provider;
pub mod resolver;
pub mod search;
pub mod text;

pub use config::{Config, ProviderConfig};
pub use dataset::{CityRow, Dataset};
pub use error::{AdapterError, AdapterErrorKind, ResolutionError};
pub use model::{DailyEntry, HourlyEntry, RawPayload, WeatherRecord};
pub use places::{PlaceIndex, PlaceIndexCell};
pub use provider::{AdapterSource, FetchOptions, ProviderId, WeatherAdapter};
pub use resolver::FailoverResolver;
pub use search::{CityCandidate, CitySearch, SearchOutcome};
