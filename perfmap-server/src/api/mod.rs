//! HTTP API handlers for perfmap-server

pub mod artists;
pub mod performances;
pub mod status;

pub use artists::list_artists;
pub use performances::{
    create_performance, delete_performance, list_performances, performances_by_artist,
    performances_by_province, update_performance, PerformanceRecord,
};
pub use status::{status, StatusResponse};
