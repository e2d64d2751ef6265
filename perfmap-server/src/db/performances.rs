//! Queries over the `performances` table
//!
//! Every function issues a single statement; no explicit transactions.

use chrono::{DateTime, Utc};
use perfmap_common::{Performance, Result, ValidPerformance};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, artist, type, province, city, venue, notes, date, poster, created_at";

/// All performances, newest first by creation time
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Performance>> {
    let sql = format!(
        "SELECT {} FROM performances ORDER BY created_at DESC, id DESC",
        COLUMNS
    );
    Ok(sqlx::query_as::<_, Performance>(&sql).fetch_all(pool).await?)
}

/// Performances whose stored province matches exactly, newest first
pub async fn list_by_province(pool: &SqlitePool, province: &str) -> Result<Vec<Performance>> {
    let sql = format!(
        "SELECT {} FROM performances WHERE province = ? ORDER BY created_at DESC, id DESC",
        COLUMNS
    );
    Ok(sqlx::query_as::<_, Performance>(&sql)
        .bind(province)
        .fetch_all(pool)
        .await?)
}

/// Performances by one artist, latest performance date first
pub async fn list_by_artist(pool: &SqlitePool, artist: &str) -> Result<Vec<Performance>> {
    let sql = format!(
        "SELECT {} FROM performances WHERE artist = ? ORDER BY date DESC, id DESC",
        COLUMNS
    );
    Ok(sqlx::query_as::<_, Performance>(&sql)
        .bind(artist)
        .fetch_all(pool)
        .await?)
}

/// Distinct artist names, sorted
pub async fn distinct_artists(pool: &SqlitePool) -> Result<Vec<String>> {
    Ok(
        sqlx::query_scalar("SELECT DISTINCT artist FROM performances ORDER BY artist")
            .fetch_all(pool)
            .await?,
    )
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Performance>> {
    let sql = format!("SELECT {} FROM performances WHERE id = ?", COLUMNS);
    Ok(sqlx::query_as::<_, Performance>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM performances")
        .fetch_one(pool)
        .await?)
}

/// Insert a validated record and return it as stored
pub async fn insert(
    pool: &SqlitePool,
    record: &ValidPerformance,
    poster: Option<&str>,
    created_at: DateTime<Utc>,
) -> Result<Performance> {
    let sql = format!(
        "INSERT INTO performances (artist, type, province, city, venue, notes, date, poster, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
        COLUMNS
    );
    Ok(sqlx::query_as::<_, Performance>(&sql)
        .bind(&record.artist)
        .bind(&record.kind)
        .bind(&record.province)
        .bind(&record.city)
        .bind(&record.venue)
        .bind(&record.notes)
        .bind(record.date)
        .bind(poster)
        .bind(created_at)
        .fetch_one(pool)
        .await?)
}

/// Replace every editable field of a record in place
///
/// A `None` poster keeps the stored one. `created_at` is never touched.
/// Returns `None` when no row has this id.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    record: &ValidPerformance,
    poster: Option<&str>,
) -> Result<Option<Performance>> {
    let sql = format!(
        "UPDATE performances SET artist = ?, type = ?, province = ?, city = ?, venue = ?, \
         notes = ?, date = ?, poster = COALESCE(?, poster) WHERE id = ? RETURNING {}",
        COLUMNS
    );
    Ok(sqlx::query_as::<_, Performance>(&sql)
        .bind(&record.artist)
        .bind(&record.kind)
        .bind(&record.province)
        .bind(&record.city)
        .bind(&record.venue)
        .bind(&record.notes)
        .bind(record.date)
        .bind(poster)
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

/// Delete a record, returning it if it existed
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<Option<Performance>> {
    let sql = format!("DELETE FROM performances WHERE id = ? RETURNING {}", COLUMNS);
    Ok(sqlx::query_as::<_, Performance>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?)
}
