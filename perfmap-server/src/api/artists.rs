//! Artist listing

use axum::{extract::State, Json};
use perfmap_common::ApiEnvelope;

use crate::db::performances;
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/artists
///
/// Distinct artist names across all performances, sorted.
pub async fn list_artists(State(state): State<AppState>) -> ApiResult<Json<ApiEnvelope<Vec<String>>>> {
    let artists = performances::distinct_artists(&state.db).await?;
    Ok(Json(ApiEnvelope::ok(artists)))
}
