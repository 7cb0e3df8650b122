//! Adapters layer: Concrete implementations of ports.
//!
//! - `sqlite`: SQLite for the catalog and association store

pub mod sqlite;

// Re-export storage error for lib.rs
pub use sqlite::StorageError;
