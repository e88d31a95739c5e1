//! Streaming enrichment of vehicle position reports with a probability
//! distribution over each vehicle's historically visited sites.

pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod model;
pub mod reload;
pub mod server;
pub mod store;
pub mod tracker;
pub mod types;

pub use engine::SitePredictionEngine;
pub use model::SiteModel;
pub use store::ModelStore;
