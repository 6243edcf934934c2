//! DynamoDB table service.
//!
//! Backs the document store with an AWS DynamoDB table keyed by
//! (`ide` hash, `typ` range), using `aws-sdk-dynamodb`.
//!
//! DynamoDB keeps a single item per key, so a put of a new revision replaces
//! the previous one in place. Deletes are conditional on the revision, which
//! keeps the prune step of a put from removing a newer write.

mod client;
mod conversions;
mod error;
mod service;

pub use client::{create_client, AwsConfig};
pub use service::DynamoDbTables;
