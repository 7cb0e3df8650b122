//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases: catalog maintenance, bulk association
//! replacement, and prediction.

mod associations;
mod catalog;
mod prediction;
pub mod seed;

pub use associations::AssociationService;
pub use catalog::{CatalogService, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use prediction::PredictionService;
