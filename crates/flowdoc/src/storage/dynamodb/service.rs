//! DynamoDB table service implementation.
//!
//! Implements `TableService` from `flowdoc_core::storage` using DynamoDB.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, KeySchemaElement, KeyType, ProvisionedThroughput,
    ScalarAttributeType, TableStatus as SdkTableStatus,
};
use aws_sdk_dynamodb::Client;
use flowdoc_core::storage::{
    ItemKey, Result, ScanFilter, StoredItem, TableService, TableSpec, TableStatus, HASH_KEY,
    RANGE_KEY, REV_ATTR,
};

use super::client::{create_client, AwsConfig};
use super::conversions::{
    attributes_to_item, attributes_to_key, item_to_attributes, key_attributes, scan_expressions,
    ScanExpression,
};
use super::error::{
    map_build_error, map_create_table_error, map_delete_item_error, map_delete_table_error,
    map_describe_table_error, map_put_item_error, map_query_error, map_scan_error,
};

/// DynamoDB-backed table service.
#[derive(Debug, Clone)]
pub struct DynamoDbTables {
    client: Client,
}

impl DynamoDbTables {
    /// Creates a table service from an existing DynamoDB client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a table service from AWS configuration.
    pub async fn connect(config: &AwsConfig) -> Self {
        Self::new(create_client(config).await)
    }

    async fn scan_pages(
        &self,
        table_name: &str,
        expr: &ScanExpression,
    ) -> Result<Vec<HashMap<String, AttributeValue>>> {
        self.client
            .scan()
            .table_name(table_name)
            .set_filter_expression(expr.filter.clone())
            .set_projection_expression(expr.projection.clone())
            .set_expression_attribute_names(expr.names())
            .set_expression_attribute_values(expr.values())
            .into_paginator()
            .items()
            .send()
            .collect::<std::result::Result<Vec<_>, _>>()
            .await
            .map_err(|e| map_scan_error(e, table_name))
    }
}

#[async_trait]
impl TableService for DynamoDbTables {
    async fn create_table(&self, spec: &TableSpec) -> Result<()> {
        let key_schema = vec![
            KeySchemaElement::builder()
                .attribute_name(HASH_KEY)
                .key_type(KeyType::Hash)
                .build()
                .map_err(map_build_error)?,
            KeySchemaElement::builder()
                .attribute_name(RANGE_KEY)
                .key_type(KeyType::Range)
                .build()
                .map_err(map_build_error)?,
        ];

        let attribute_definitions = vec![
            AttributeDefinition::builder()
                .attribute_name(HASH_KEY)
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(map_build_error)?,
            AttributeDefinition::builder()
                .attribute_name(RANGE_KEY)
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(map_build_error)?,
        ];

        let throughput = ProvisionedThroughput::builder()
            .read_capacity_units(spec.read_capacity_units)
            .write_capacity_units(spec.write_capacity_units)
            .build()
            .map_err(map_build_error)?;

        self.client
            .create_table()
            .table_name(&spec.name)
            .set_key_schema(Some(key_schema))
            .set_attribute_definitions(Some(attribute_definitions))
            .provisioned_throughput(throughput)
            .send()
            .await
            .map_err(|e| map_create_table_error(e, &spec.name))?;

        Ok(())
    }

    async fn delete_table(&self, table_name: &str) -> Result<()> {
        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| map_delete_table_error(e, table_name))?;
        Ok(())
    }

    async fn table_status(&self, table_name: &str) -> Result<Option<TableStatus>> {
        match self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
        {
            Ok(response) => Ok(response
                .table()
                .and_then(|table| table.table_status())
                .map(|status| match status {
                    SdkTableStatus::Active => TableStatus::Active,
                    SdkTableStatus::Creating => TableStatus::Creating,
                    SdkTableStatus::Deleting => TableStatus::Deleting,
                    // Archival and inaccessible-key states are transitional too
                    _ => TableStatus::Updating,
                })),
            Err(err) => match map_describe_table_error(err) {
                None => Ok(None),
                Some(err) => Err(err),
            },
        }
    }

    async fn put_item(&self, table_name: &str, item: &StoredItem) -> Result<()> {
        self.client
            .put_item()
            .table_name(table_name)
            .set_item(Some(item_to_attributes(item)))
            .send()
            .await
            .map_err(|e| map_put_item_error(e, table_name))?;

        Ok(())
    }

    async fn query(&self, table_name: &str, ide: &str, typ: &str) -> Result<Vec<StoredItem>> {
        let items = self
            .client
            .query()
            .table_name(table_name)
            .key_condition_expression("#ide = :ide AND #typ = :typ")
            .expression_attribute_names("#ide", HASH_KEY)
            .expression_attribute_names("#typ", RANGE_KEY)
            .expression_attribute_values(":ide", AttributeValue::S(ide.to_string()))
            .expression_attribute_values(":typ", AttributeValue::S(typ.to_string()))
            .consistent_read(true)
            .into_paginator()
            .items()
            .send()
            .collect::<std::result::Result<Vec<_>, _>>()
            .await
            .map_err(|e| map_query_error(e, table_name))?;

        items.iter().map(attributes_to_item).collect()
    }

    async fn delete_item(&self, table_name: &str, key: &ItemKey) -> Result<bool> {
        let result = self
            .client
            .delete_item()
            .table_name(table_name)
            .set_key(Some(key_attributes(&key.ide, &key.typ)))
            .condition_expression("#rev = :rev")
            .expression_attribute_names("#rev", REV_ATTR)
            .expression_attribute_values(":rev", AttributeValue::N(key.rev.to_string()))
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => map_delete_item_error(err, table_name),
        }
    }

    async fn scan(&self, table_name: &str, filter: &ScanFilter) -> Result<Vec<StoredItem>> {
        let mut items = Vec::new();
        for expr in scan_expressions(filter, false) {
            for attrs in self.scan_pages(table_name, &expr).await? {
                items.push(attributes_to_item(&attrs)?);
            }
        }
        Ok(items)
    }

    async fn scan_keys(&self, table_name: &str, filter: &ScanFilter) -> Result<Vec<ItemKey>> {
        let mut keys = Vec::new();
        for expr in scan_expressions(filter, true) {
            for attrs in self.scan_pages(table_name, &expr).await? {
                keys.push(attributes_to_key(&attrs)?);
            }
        }
        Ok(keys)
    }
}
