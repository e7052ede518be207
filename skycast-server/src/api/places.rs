use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use skycast_core::CityRow;

use super::{ApiError, AppState, query_params, required};

#[derive(Debug, Deserialize)]
pub struct LookupParams {
    q: Option<String>,
}

/// First dataset row matching `q` through the place index.
pub(super) async fn lookup(
    State(state): State<AppState>,
    query: Result<Query<LookupParams>, QueryRejection>,
) -> Result<Json<CityRow>, ApiError> {
    let params = query_params(query)?;
    let q = required(params.q, "q")?;
    let index = state.search.index();

    match index.lookup(&q) {
        Some(row) => Ok(Json(row.clone())),
        None => {
            tracing::debug!(query = %q, "no dataset entry");
            Err(ApiError::not_found())
        }
    }
}
