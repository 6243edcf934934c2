//! In-memory table service for testing.
//!
//! Stores every table in a `HashMap` wrapped in `Arc<RwLock<_>>`. Rows are
//! keyed by revision as well as identity, so superseded revisions are visible
//! to the document store until it prunes them.
//!
//! # Example
//!
//! ```rust,ignore
//! use flowdoc::storage::inmemory::InMemoryTables;
//!
//! let tables = InMemoryTables::new().with_provisioning_delay(2);
//! ```

mod service;

pub use service::InMemoryTables;
