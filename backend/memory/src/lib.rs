//! Analysis cache.
//!
//! Stores one output record per source image URL so repeated requests for
//! the same screenshot are served without another model call.

pub mod sqlite_store;
pub mod store;

pub use sqlite_store::SqliteOutputCache;
pub use store::InMemoryOutputCache;
