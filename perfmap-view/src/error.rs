//! Error types for perfmap-view

use thiserror::Error;

use crate::geometry::GeometryError;

/// Client-side error type
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure or unreadable response
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with `success: false` or an error status
    #[error("API error: {0}")]
    Api(String),

    /// Malformed JSON (API envelope or GeoJSON)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Map data cannot be projected
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected before sending (form validation, bad base URL)
    #[error(transparent)]
    Common(#[from] perfmap_common::Error),
}

/// Result type alias for perfmap-view operations
pub type Result<T> = std::result::Result<T, Error>;
