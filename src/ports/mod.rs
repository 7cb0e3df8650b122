//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and the storage backend.

mod storage;

pub use storage::{AssociationStore, CatalogStore, Page};
