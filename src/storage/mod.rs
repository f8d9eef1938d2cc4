//! Document storage backends
//!
//! The analysis lifecycle reaches documents only through the `DocumentStore`
//! trait. `SqliteStore` is the persistent backend; `MemoryStore` keeps
//! documents in a `DashMap` for tests and throwaway runs.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{
    DocumentPatch, DocumentStore, OpenStore, StatusGuard, StorageError, StorageResult,
};
