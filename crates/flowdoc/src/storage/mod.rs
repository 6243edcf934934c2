//! Table service implementations.
//!
//! Concrete implementations of `flowdoc_core::storage::TableService`.
//!
//! # Feature Flags
//!
//! - `dynamodb` (default): AWS DynamoDB table service using `aws-sdk-dynamodb`
//!
//! The in-memory service is always available.

pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

pub use inmemory::InMemoryTables;

#[cfg(feature = "dynamodb")]
pub use dynamodb::{AwsConfig, DynamoDbTables};
