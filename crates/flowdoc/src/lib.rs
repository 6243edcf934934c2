//! Revisioned document storage for workflow engines.
//!
//! [`DocumentStore`] implements the engine-facing
//! [`DocumentStorage`](flowdoc_core::storage::DocumentStorage) contract on top
//! of any [`TableService`](flowdoc_core::storage::TableService): DynamoDB
//! (feature `dynamodb`) or the in-memory service used in tests.

pub mod config;
pub mod provision;
pub mod storage;
pub mod store;

pub use config::Config;
pub use provision::{create_table, drop_table, ProvisionOptions};
pub use store::DocumentStore;

pub use flowdoc_core::document::Document;
pub use flowdoc_core::storage::{
    DocumentStorage, GetManyOptions, Keys, Many, Outcome, PutOptions, StoreError, TableService,
};
