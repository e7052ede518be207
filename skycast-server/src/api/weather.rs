use std::num::IntErrorKind;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use skycast_core::{
    RawPayload, SearchOutcome, WeatherRecord, provider::DEFAULT_FORECAST_DAYS,
    search::DEFAULT_SEARCH_LIMIT,
};

use super::{ApiError, AppState, query_params, required};

#[derive(Debug, Deserialize)]
pub struct CityParams {
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
    city: Option<String>,
    /// Kept as text so a non-numeric value falls back to the default.
    days: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

pub(super) async fn current(
    State(state): State<AppState>,
    query: Result<Query<CityParams>, QueryRejection>,
) -> Result<Json<WeatherRecord>, ApiError> {
    let params = query_params(query)?;
    let city = required(params.city, "city")?;

    let record = state.resolver.resolve_current(&city).await.map_err(|e| {
        tracing::warn!(city = %city, code = e.code(), "current weather unavailable");
        ApiError::from(e)
    })?;

    Ok(Json(record))
}

pub(super) async fn forecast(
    State(state): State<AppState>,
    query: Result<Query<ForecastParams>, QueryRejection>,
) -> Result<Json<RawPayload>, ApiError> {
    let params = query_params(query)?;
    let city = required(params.city, "city")?;
    let days = parse_days(params.days.as_deref());

    let payload = state.resolver.resolve_forecast(&city, days).await.map_err(|e| {
        tracing::warn!(city = %city, days, code = e.code(), "forecast unavailable");
        ApiError::from(e)
    })?;

    Ok(Json(payload))
}

pub(super) async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchOutcome>, ApiError> {
    let params = query_params(query)?;
    let q = required(params.q, "q")?;

    let outcome = state.search.search(&q, DEFAULT_SEARCH_LIMIT).await.map_err(|e| {
        tracing::error!(query = %q, error = %e, "city search failed");
        ApiError::search_failed(e.to_string())
    })?;

    Ok(Json(outcome))
}

fn parse_days(raw: Option<&str>) -> i64 {
    let default = i64::from(DEFAULT_FORECAST_DAYS);
    let Some(raw) = raw else {
        return default;
    };

    // Out-of-range numbers saturate so clamping still applies.
    match raw.trim().parse::<i64>() {
        Ok(days) => days,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => default,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_default_when_absent_or_garbage() {
        assert_eq!(parse_days(None), 7);
        assert_eq!(parse_days(Some("abc")), 7);
        assert_eq!(parse_days(Some(" 3 ")), 3);
        assert_eq!(parse_days(Some("-2")), -2);
        assert_eq!(parse_days(Some("")), 7);
    }

    #[test]
    fn overflowing_days_saturate() {
        assert_eq!(parse_days(Some("99999999999999999999")), i64::MAX);
        assert_eq!(parse_days(Some("-99999999999999999999")), i64::MIN);
    }
}
