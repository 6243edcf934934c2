//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and
//! stored items, and for building scan expressions. These are testable in
//! isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use flowdoc_core::storage::{
    ItemKey, ScanFilter, StoreError, StoredItem, DOC_ATTR, HASH_KEY, PARTICIPANT_NAME_ATTR,
    RANGE_KEY, REV_ATTR, WFID_ATTR,
};

/// DynamoDB accepts at most 100 operands in an `IN` comparison.
pub const MAX_IN_OPERANDS: usize = 100;

type Attributes = HashMap<String, AttributeValue>;

// ============================================================================
// Item conversions
// ============================================================================

/// Convert a StoredItem to DynamoDB item.
///
/// Optional attributes are left out entirely when unset or empty.
pub fn item_to_attributes(item: &StoredItem) -> Attributes {
    let mut attrs = key_attributes(&item.ide, &item.typ);

    attrs.insert(REV_ATTR.to_string(), AttributeValue::N(item.rev.to_string()));
    attrs.insert(DOC_ATTR.to_string(), AttributeValue::S(item.doc.clone()));

    if let Some(wfid) = item.wfid.as_deref().filter(|w| !w.is_empty()) {
        attrs.insert(WFID_ATTR.to_string(), AttributeValue::S(wfid.to_string()));
    }
    if let Some(name) = item.participant_name.as_deref().filter(|n| !n.is_empty()) {
        attrs.insert(
            PARTICIPANT_NAME_ATTR.to_string(),
            AttributeValue::S(name.to_string()),
        );
    }

    attrs
}

/// Convert a DynamoDB item to StoredItem.
pub fn attributes_to_item(attrs: &Attributes) -> Result<StoredItem, StoreError> {
    Ok(StoredItem {
        ide: get_string(attrs, HASH_KEY)?,
        typ: get_string(attrs, RANGE_KEY)?,
        rev: get_u64(attrs, REV_ATTR)?,
        doc: get_string(attrs, DOC_ATTR)?,
        wfid: get_optional_string(attrs, WFID_ATTR),
        participant_name: get_optional_string(attrs, PARTICIPANT_NAME_ATTR),
    })
}

/// Convert a projected DynamoDB item to ItemKey.
pub fn attributes_to_key(attrs: &Attributes) -> Result<ItemKey, StoreError> {
    Ok(ItemKey {
        ide: get_string(attrs, HASH_KEY)?,
        typ: get_string(attrs, RANGE_KEY)?,
        rev: get_u64(attrs, REV_ATTR)?,
    })
}

/// Primary key attributes for an identity.
pub fn key_attributes(ide: &str, typ: &str) -> Attributes {
    HashMap::from([
        (HASH_KEY.to_string(), AttributeValue::S(ide.to_string())),
        (RANGE_KEY.to_string(), AttributeValue::S(typ.to_string())),
    ])
}

// ============================================================================
// Scan expressions
// ============================================================================

/// Expression parts for a single Scan request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanExpression {
    pub filter: Option<String>,
    pub projection: Option<String>,
    pub names: HashMap<String, String>,
    pub values: Attributes,
}

impl ScanExpression {
    pub fn names(&self) -> Option<HashMap<String, String>> {
        (!self.names.is_empty()).then(|| self.names.clone())
    }

    pub fn values(&self) -> Option<Attributes> {
        (!self.values.is_empty()).then(|| self.values.clone())
    }
}

/// Builds one Scan expression per chunk of wfids.
///
/// A filter without wfids yields exactly one expression. A filter with an
/// empty wfid list yields none: nothing can match it.
pub fn scan_expressions(filter: &ScanFilter, keys_only: bool) -> Vec<ScanExpression> {
    let chunks: Vec<Option<&[String]>> = match &filter.wfids {
        None => vec![None],
        Some(wfids) => wfids.chunks(MAX_IN_OPERANDS).map(Some).collect(),
    };

    chunks
        .into_iter()
        .map(|chunk| scan_expression(filter.typ.as_deref(), chunk, keys_only))
        .collect()
}

fn scan_expression(typ: Option<&str>, wfids: Option<&[String]>, keys_only: bool) -> ScanExpression {
    let mut expr = ScanExpression::default();
    let mut clauses = Vec::new();

    if let Some(typ) = typ {
        expr.names.insert("#typ".to_string(), RANGE_KEY.to_string());
        expr.values
            .insert(":typ".to_string(), AttributeValue::S(typ.to_string()));
        clauses.push("#typ = :typ".to_string());
    }

    if let Some(wfids) = wfids {
        expr.names.insert("#wfid".to_string(), WFID_ATTR.to_string());
        let placeholders: Vec<String> = wfids
            .iter()
            .enumerate()
            .map(|(i, wfid)| {
                let placeholder = format!(":wfid{i}");
                expr.values
                    .insert(placeholder.clone(), AttributeValue::S(wfid.clone()));
                placeholder
            })
            .collect();
        clauses.push(format!("#wfid IN ({})", placeholders.join(", ")));
    }

    if !clauses.is_empty() {
        expr.filter = Some(clauses.join(" AND "));
    }

    if keys_only {
        expr.names.insert("#ide".to_string(), HASH_KEY.to_string());
        expr.names.insert("#typ".to_string(), RANGE_KEY.to_string());
        expr.names.insert("#rev".to_string(), REV_ATTR.to_string());
        expr.projection = Some("#ide, #typ, #rev".to_string());
    }

    expr
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get a required string attribute.
fn get_string(attrs: &Attributes, key: &str) -> Result<String, StoreError> {
    attrs
        .get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| StoreError::InvalidData(format!("Missing or invalid field: {}", key)))
}

/// Get an optional string attribute.
fn get_optional_string(attrs: &Attributes, key: &str) -> Option<String> {
    attrs
        .get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
}

/// Get a required non-negative number attribute.
fn get_u64(attrs: &Attributes, key: &str) -> Result<u64, StoreError> {
    let n = attrs
        .get(key)
        .and_then(|v| v.as_n().ok())
        .ok_or_else(|| StoreError::InvalidData(format!("Missing or invalid field: {}", key)))?;
    n.parse::<u64>()
        .map_err(|e| StoreError::InvalidData(format!("Invalid number {}: {}", key, e)))
}
