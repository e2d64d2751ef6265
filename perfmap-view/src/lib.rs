//! # perfmap view library
//!
//! Client side of perfmap: loads events from the REST API and the province
//! boundary dataset, then turns them into things to look at.
//!
//! - [`loader`]: API client and map download
//! - [`index`]: events bucketed by normalized province name
//! - [`geometry`] and [`render`]: projection onto the 800×600 canvas and SVG output
//! - [`layout`] and [`animation`]: the artist bubble field and its frame task
//! - [`aggregation`], [`calendar`], [`view_model`]: statistics, grids and shared view state

pub mod aggregation;
pub mod animation;
pub mod calendar;
pub mod error;
pub mod geometry;
pub mod index;
pub mod layout;
pub mod loader;
pub mod render;
pub mod view_model;

pub use error::{Error, Result};
pub use loader::ApiClient;
