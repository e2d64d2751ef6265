//! Performance CRUD endpoints
//!
//! Create and update accept `multipart/form-data` with the text fields
//! `artist`, `type`, `province`, `city`, `venue`, `notes`, `date` and an
//! optional `poster` image. The whole form is read and validated before the
//! poster touches disk or the table is written.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use perfmap_common::{ApiEnvelope, Performance, PerformanceInput};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::performances;
use crate::error::{ApiError, ApiResult};
use crate::uploads::PendingPoster;
use crate::AppState;

/// A stored performance as returned by the API
///
/// Carries `formatted_date`, the creation day as `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    #[serde(flatten)]
    pub performance: Performance,
    pub formatted_date: String,
}

impl From<Performance> for PerformanceRecord {
    fn from(performance: Performance) -> Self {
        let formatted_date = perfmap_common::time::format_day(&performance.created_at);
        Self {
            performance,
            formatted_date,
        }
    }
}

type ListResponse = Json<ApiEnvelope<Vec<PerformanceRecord>>>;
type RecordResponse = Json<ApiEnvelope<PerformanceRecord>>;

fn records(rows: Vec<Performance>) -> ListResponse {
    Json(ApiEnvelope::ok(rows.into_iter().map(Into::into).collect()))
}

/// Parse an id path segment; anything non-numeric cannot match a row
fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::NotFound(format!("Performance {} not found", raw)))
}

/// Form contents after reading every multipart field
struct Submission {
    input: PerformanceInput,
    poster: Option<PendingPoster>,
}

/// A body cut off by the request size limit can only be an oversized poster
fn form_error(state: &AppState, err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        state.uploads.too_large()
    } else {
        ApiError::Multipart(err)
    }
}

async fn read_submission(state: &AppState, mut multipart: Multipart) -> ApiResult<Submission> {
    let mut input = PerformanceInput::default();
    let mut poster = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error(state, e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "poster" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(|e| form_error(state, e))?;
            // Browsers send an empty part when no file was chosen
            if !file_name.is_empty() && !bytes.is_empty() {
                poster = Some(state.uploads.accept(&file_name, bytes)?);
            }
        } else {
            let value = field.text().await.map_err(|e| form_error(state, e))?;
            input.set_field(&name, value);
        }
    }

    Ok(Submission { input, poster })
}

/// GET /api/performances
///
/// All performances, newest first.
pub async fn list_performances(State(state): State<AppState>) -> ApiResult<ListResponse> {
    let rows = performances::list_all(&state.db).await?;
    Ok(records(rows))
}

/// GET /api/performances/province/:province
pub async fn performances_by_province(
    State(state): State<AppState>,
    Path(province): Path<String>,
) -> ApiResult<ListResponse> {
    let rows = performances::list_by_province(&state.db, &province).await?;
    Ok(records(rows))
}

/// GET /api/performances/artist/:artist
pub async fn performances_by_artist(
    State(state): State<AppState>,
    Path(artist): Path<String>,
) -> ApiResult<ListResponse> {
    let rows = performances::list_by_artist(&state.db, &artist).await?;
    Ok(records(rows))
}

/// POST /api/performances
///
/// Returns 400 when a required field is missing, the date is malformed or the
/// poster is not an acceptable image.
pub async fn create_performance(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<RecordResponse> {
    let submission = read_submission(&state, multipart).await?;
    let valid = submission.input.validate()?;

    let poster_path = submission.poster.as_ref().map(PendingPoster::public_path);
    if let Some(poster) = &submission.poster {
        state.uploads.save(poster).await?;
    }

    let stored = match performances::insert(
        &state.db,
        &valid,
        poster_path.as_deref(),
        perfmap_common::time::now(),
    )
    .await
    {
        Ok(stored) => stored,
        Err(e) => {
            if let Some(path) = &poster_path {
                state.uploads.remove(path).await;
            }
            return Err(e.into());
        }
    };

    info!(
        "Created performance {} ({} in {})",
        stored.id, stored.artist, stored.province
    );

    Ok(Json(
        ApiEnvelope::ok(PerformanceRecord::from(stored)).with_message("Performance created"),
    ))
}

/// PUT /api/performances/:id
///
/// Replaces every field; an omitted poster keeps the stored one.
pub async fn update_performance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<RecordResponse> {
    let id = parse_id(&id)?;
    let submission = read_submission(&state, multipart).await?;
    let valid = submission.input.validate()?;

    let existing = performances::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Performance {} not found", id)))?;

    let poster_path = submission.poster.as_ref().map(PendingPoster::public_path);
    if let Some(poster) = &submission.poster {
        state.uploads.save(poster).await?;
    }

    let updated = performances::update(&state.db, id, &valid, poster_path.as_deref()).await;
    let updated = match updated {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            // Deleted between the lookup and the update
            if let Some(path) = &poster_path {
                state.uploads.remove(path).await;
            }
            return Err(ApiError::NotFound(format!("Performance {} not found", id)));
        }
        Err(e) => {
            if let Some(path) = &poster_path {
                state.uploads.remove(path).await;
            }
            return Err(e.into());
        }
    };

    if poster_path.is_some() {
        if let Some(old) = existing.poster.as_deref() {
            state.uploads.remove(old).await;
        }
    }

    info!("Updated performance {}", id);

    Ok(Json(
        ApiEnvelope::ok(PerformanceRecord::from(updated)).with_message("Performance updated"),
    ))
}

/// DELETE /api/performances/:id
pub async fn delete_performance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiEnvelope<()>>> {
    let id = parse_id(&id)?;

    let deleted = performances::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Performance {} not found", id)))?;

    if let Some(poster) = deleted.poster.as_deref() {
        state.uploads.remove(poster).await;
    }

    info!("Deleted performance {}", id);

    Ok(Json(ApiEnvelope {
        success: true,
        message: Some("Performance deleted".to_string()),
        data: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id(" 7 ").unwrap(), 7);
        assert!(matches!(parse_id("abc"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_record_formats_creation_day() {
        let performance = Performance {
            id: 1,
            artist: "A".to_string(),
            kind: "concert".to_string(),
            province: "浙江省".to_string(),
            city: None,
            venue: None,
            notes: None,
            date: None,
            poster: None,
            created_at: chrono::DateTime::parse_from_rfc3339("2024-06-30T12:00:00Z")
                .unwrap()
                .with_timezone(&chrono::Utc),
        };
        let json = serde_json::to_value(PerformanceRecord::from(performance)).unwrap();
        assert_eq!(json["formatted_date"], "2024-06-30");
        assert_eq!(json["type"], "concert");
        assert_eq!(json["id"], 1);
    }
}
