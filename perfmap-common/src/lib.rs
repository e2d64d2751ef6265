//! # perfmap Common Library
//!
//! Shared code for the perfmap server and view crates including:
//! - The performance event record and its validated input form
//! - Province name normalization (the join key between events and map geometry)
//! - Configuration loading and root folder resolution
//! - Common error types
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod models;
pub mod province;
pub mod time;

pub use error::{Error, Result};
pub use models::{ApiEnvelope, Performance, PerformanceInput, ValidPerformance};
