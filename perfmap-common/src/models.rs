//! Performance event record and the validated input form
//!
//! `Performance` is the single persisted entity. `PerformanceInput` is the
//! loosely-typed form submitted by a client; it is validated exactly once into
//! a `ValidPerformance` before anything is written.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One performance event as stored in the `performances` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Performance {
    pub id: i64,
    pub artist: String,
    /// Performance type (concert, festival, ...), serialized as `type`
    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub kind: String,
    pub province: String,
    pub city: Option<String>,
    pub venue: Option<String>,
    pub notes: Option<String>,
    pub date: Option<NaiveDate>,
    /// Relative URL of the stored poster image
    pub poster: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Form fields as submitted, before validation
///
/// Empty and whitespace-only values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceInput {
    pub artist: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub venue: Option<String>,
    pub notes: Option<String>,
    pub date: Option<String>,
}

/// A submission that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPerformance {
    pub artist: String,
    pub kind: String,
    pub province: String,
    pub city: Option<String>,
    pub venue: Option<String>,
    pub notes: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Field names accepted in a submission form, in display order
pub const FORM_FIELDS: [&str; 7] = ["artist", "type", "province", "city", "venue", "notes", "date"];

impl PerformanceInput {
    /// Set a form field by its wire name.
    ///
    /// Returns `false` for unknown field names so callers can ignore them.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "artist" => &mut self.artist,
            "type" => &mut self.kind,
            "province" => &mut self.province,
            "city" => &mut self.city,
            "venue" => &mut self.venue,
            "notes" => &mut self.notes,
            "date" => &mut self.date,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Non-empty fields as `(wire name, value)` pairs
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        let values = [
            &self.artist,
            &self.kind,
            &self.province,
            &self.city,
            &self.venue,
            &self.notes,
            &self.date,
        ];
        FORM_FIELDS
            .iter()
            .zip(values)
            .filter_map(|(name, value)| non_empty(value).map(|v| (*name, v)))
            .collect()
    }

    /// Validate required fields and parse the date
    pub fn validate(&self) -> Result<ValidPerformance> {
        let artist = non_empty(&self.artist);
        let kind = non_empty(&self.kind);
        let province = non_empty(&self.province);

        let missing: Vec<&str> = [("artist", artist), ("type", kind), ("province", province)]
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(name, _)| *name)
            .collect();

        let (Some(artist), Some(kind), Some(province)) = (artist, kind, province) else {
            return Err(Error::InvalidInput(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        let date = match non_empty(&self.date) {
            Some(raw) => Some(crate::time::parse_date(raw).ok_or_else(|| {
                Error::InvalidInput(format!("Invalid date (expected YYYY-MM-DD): {}", raw))
            })?),
            None => None,
        };

        Ok(ValidPerformance {
            artist: artist.to_string(),
            kind: kind.to_string(),
            province: province.to_string(),
            city: non_empty(&self.city).map(str::to_string),
            venue: non_empty(&self.venue).map(str::to_string),
            notes: non_empty(&self.notes).map(str::to_string),
            date,
        })
    }
}

impl From<&Performance> for PerformanceInput {
    fn from(p: &Performance) -> Self {
        Self {
            artist: Some(p.artist.clone()),
            kind: Some(p.kind.clone()),
            province: Some(p.province.clone()),
            city: p.city.clone(),
            venue: p.venue.clone(),
            notes: p.notes.clone(),
            date: p.date.map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Response envelope shared by every API endpoint
///
/// `{success, message?, data?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Successful response carrying data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Attach a human-readable message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Failed response with a message and no data
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Unwrap the data of a successful envelope
    pub fn into_result(self) -> Result<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(Error::Internal("Response carried no data".to_string())),
            (false, _) => Err(Error::Internal(
                self.message.unwrap_or_else(|| "Request failed".to_string()),
            )),
        }
    }
}
