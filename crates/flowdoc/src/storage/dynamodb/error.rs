//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError` from `flowdoc_core::storage`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::delete_table::DeleteTableError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use flowdoc_core::storage::StoreError;

const THROUGHPUT_EXCEEDED: &str = "Throughput exceeded, please retry";
const REQUEST_LIMIT_EXCEEDED: &str = "Request limit exceeded, please retry";
const INTERNAL_SERVER_ERROR: &str = "DynamoDB internal server error";

fn table_not_found(table_name: &str) -> StoreError {
    StoreError::TableNotFound {
        table_name: table_name.to_string(),
    }
}

fn backend(message: &str) -> StoreError {
    StoreError::Backend(message.to_string())
}

/// Requests that never got a response from DynamoDB.
fn connection_failed<E, R>(err: &SdkError<E, R>) -> Option<StoreError>
where
    E: std::error::Error + 'static,
    R: Debug,
{
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => Some(
            StoreError::ConnectionFailed(DisplayErrorContext(err).to_string()),
        ),
        _ => None,
    }
}

/// Map a CreateTable SDK error to StoreError.
pub fn map_create_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<CreateTableError, R>,
    table_name: &str,
) -> StoreError {
    if let Some(err) = connection_failed(&err) {
        return err;
    }
    match err.into_service_error() {
        CreateTableError::ResourceInUseException(_) => {
            StoreError::Backend(format!("Table '{table_name}' already exists or is in use"))
        }
        CreateTableError::LimitExceededException(_) => {
            backend("Table limit exceeded, please retry")
        }
        CreateTableError::InternalServerError(_) => backend(INTERNAL_SERVER_ERROR),
        err => StoreError::Backend(format!("CreateTable failed: {:?}", err)),
    }
}

/// Map a DeleteTable SDK error to StoreError.
pub fn map_delete_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteTableError, R>,
    table_name: &str,
) -> StoreError {
    if let Some(err) = connection_failed(&err) {
        return err;
    }
    match err.into_service_error() {
        DeleteTableError::ResourceNotFoundException(_) => table_not_found(table_name),
        DeleteTableError::ResourceInUseException(_) => {
            StoreError::Backend(format!("Table '{table_name}' is in use"))
        }
        DeleteTableError::LimitExceededException(_) => {
            backend("Table limit exceeded, please retry")
        }
        DeleteTableError::InternalServerError(_) => backend(INTERNAL_SERVER_ERROR),
        err => StoreError::Backend(format!("DeleteTable failed: {:?}", err)),
    }
}

/// Map a DescribeTable SDK error to `None` (table missing) or StoreError.
pub fn map_describe_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DescribeTableError, R>,
) -> Option<StoreError> {
    if let Some(err) = connection_failed(&err) {
        return Some(err);
    }
    match err.into_service_error() {
        DescribeTableError::ResourceNotFoundException(_) => None,
        DescribeTableError::InternalServerError(_) => Some(backend(INTERNAL_SERVER_ERROR)),
        err => Some(StoreError::Backend(format!(
            "DescribeTable failed: {:?}",
            err
        ))),
    }
}

/// Map a PutItem SDK error to StoreError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    table_name: &str,
) -> StoreError {
    if let Some(err) = connection_failed(&err) {
        return err;
    }
    match err.into_service_error() {
        PutItemError::ResourceNotFoundException(_) => table_not_found(table_name),
        PutItemError::ProvisionedThroughputExceededException(_) => backend(THROUGHPUT_EXCEEDED),
        PutItemError::RequestLimitExceeded(_) => backend(REQUEST_LIMIT_EXCEEDED),
        PutItemError::ItemCollectionSizeLimitExceededException(_) => {
            backend("Item collection size limit exceeded")
        }
        PutItemError::TransactionConflictException(_) => {
            backend("Transaction conflict, please retry")
        }
        PutItemError::InternalServerError(_) => backend(INTERNAL_SERVER_ERROR),
        err => StoreError::Backend(format!("PutItem failed: {:?}", err)),
    }
}

/// Map a Query SDK error to StoreError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
    table_name: &str,
) -> StoreError {
    if let Some(err) = connection_failed(&err) {
        return err;
    }
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => table_not_found(table_name),
        QueryError::ProvisionedThroughputExceededException(_) => backend(THROUGHPUT_EXCEEDED),
        QueryError::RequestLimitExceeded(_) => backend(REQUEST_LIMIT_EXCEEDED),
        QueryError::InternalServerError(_) => backend(INTERNAL_SERVER_ERROR),
        err => StoreError::Backend(format!("Query failed: {:?}", err)),
    }
}

/// Map a Scan SDK error to StoreError.
pub fn map_scan_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<ScanError, R>,
    table_name: &str,
) -> StoreError {
    if let Some(err) = connection_failed(&err) {
        return err;
    }
    match err.into_service_error() {
        ScanError::ResourceNotFoundException(_) => table_not_found(table_name),
        ScanError::ProvisionedThroughputExceededException(_) => backend(THROUGHPUT_EXCEEDED),
        ScanError::RequestLimitExceeded(_) => backend(REQUEST_LIMIT_EXCEEDED),
        ScanError::InternalServerError(_) => backend(INTERNAL_SERVER_ERROR),
        err => StoreError::Backend(format!("Scan failed: {:?}", err)),
    }
}

/// Map a DeleteItem SDK error to `Ok(false)` (revision no longer there) or
/// StoreError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
    table_name: &str,
) -> Result<bool, StoreError> {
    if let Some(err) = connection_failed(&err) {
        return Err(err);
    }
    match err.into_service_error() {
        DeleteItemError::ConditionalCheckFailedException(_) => Ok(false),
        DeleteItemError::ResourceNotFoundException(_) => Err(table_not_found(table_name)),
        DeleteItemError::ProvisionedThroughputExceededException(_) => {
            Err(backend(THROUGHPUT_EXCEEDED))
        }
        DeleteItemError::RequestLimitExceeded(_) => Err(backend(REQUEST_LIMIT_EXCEEDED)),
        DeleteItemError::ItemCollectionSizeLimitExceededException(_) => {
            Err(backend("Item collection size limit exceeded"))
        }
        DeleteItemError::TransactionConflictException(_) => {
            Err(backend("Transaction conflict, please retry"))
        }
        DeleteItemError::InternalServerError(_) => Err(backend(INTERNAL_SERVER_ERROR)),
        err => Err(StoreError::Backend(format!("DeleteItem failed: {:?}", err))),
    }
}

/// Map a builder validation error to StoreError.
pub fn map_build_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::InvalidData(err.to_string())
}
