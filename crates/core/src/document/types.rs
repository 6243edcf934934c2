use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::DocumentError;

pub const ID_FIELD: &str = "_id";
pub const TYPE_FIELD: &str = "type";
pub const REV_FIELD: &str = "_rev";
pub const PUT_AT_FIELD: &str = "put_at";
pub const WFID_FIELD: &str = "wfid";
pub const FEI_FIELD: &str = "fei";
pub const PARTICIPANT_NAME_FIELD: &str = "participant_name";

/// A schemaless engine document.
///
/// The workflow engine owns the shape of the payload. The store only reads the
/// identity (`_id`, `type`), the revision (`_rev`) and the indexed fields
/// (`wfid`, `fei.wfid`, `participant_name`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wraps a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(DocumentError::NotAnObject),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// The document identity, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        non_empty_str(self.0.get(ID_FIELD))
    }

    /// The document category, if present and non-empty.
    pub fn doc_type(&self) -> Option<&str> {
        non_empty_str(self.0.get(TYPE_FIELD))
    }

    /// Returns `(id, type)`, failing when either is missing.
    pub fn identity(&self) -> Result<(&str, &str), DocumentError> {
        let id = self.id().ok_or(DocumentError::MissingField(ID_FIELD))?;
        let doc_type = self
            .doc_type()
            .ok_or(DocumentError::MissingField(TYPE_FIELD))?;
        Ok((id, doc_type))
    }

    /// The revision carried by the document.
    ///
    /// Accepts non-negative integers and decimal strings. `null` and a missing
    /// field both mean "never stored".
    pub fn rev(&self) -> Result<Option<u64>, DocumentError> {
        match self.0.get(REV_FIELD) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| invalid_rev(n)),
            Some(Value::String(s)) => s
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| invalid_rev(s)),
            Some(other) => Err(invalid_rev(other)),
        }
    }

    /// The workflow instance id, from `wfid` or else `fei.wfid`.
    pub fn wfid(&self) -> Option<&str> {
        non_empty_str(self.0.get(WFID_FIELD)).or_else(|| {
            self.0
                .get(FEI_FIELD)
                .and_then(Value::as_object)
                .and_then(|fei| non_empty_str(fei.get(WFID_FIELD)))
        })
    }

    pub fn participant_name(&self) -> Option<&str> {
        non_empty_str(self.0.get(PARTICIPANT_NAME_FIELD))
    }

    /// Writes the revision and `put_at` timestamp into this document.
    pub fn stamp(&mut self, rev: u64, put_at: DateTime<Utc>) {
        self.0.insert(REV_FIELD.to_string(), Value::from(rev));
        self.0
            .insert(PUT_AT_FIELD.to_string(), Value::from(format_put_at(put_at)));
    }

    /// Returns a stamped copy, leaving this document untouched.
    pub fn stamped(&self, rev: u64, put_at: DateTime<Utc>) -> Self {
        let mut copy = self.clone();
        copy.stamp(rev, put_at);
        copy
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.0)
    }
}

/// Formats a timestamp the way the engine writes `put_at`.
pub fn format_put_at(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.6f UTC").to_string()
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn invalid_rev(value: impl std::fmt::Display) -> DocumentError {
    DocumentError::InvalidField {
        field: REV_FIELD,
        reason: format!("expected a non-negative integer, got {value}"),
    }
}
