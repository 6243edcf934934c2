use std::fmt;

use regex::Regex;

use crate::document::Document;

/// Hash key attribute (document identity).
pub const HASH_KEY: &str = "ide";
/// Range key attribute (document type).
pub const RANGE_KEY: &str = "typ";
pub const REV_ATTR: &str = "rev";
pub const DOC_ATTR: &str = "doc";
pub const WFID_ATTR: &str = "wfid";
pub const PARTICIPANT_NAME_ATTR: &str = "participant_name";

const TABLE_SUFFIX: &str = "documents";

/// Resolves the physical table name for a prefix.
///
/// Pattern: `<prefix>.documents`
pub fn table_name(prefix: &str) -> String {
    format!("{prefix}.{TABLE_SUFFIX}")
}

/// One physical row: a single revision of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredItem {
    pub ide: String,
    pub typ: String,
    pub rev: u64,
    /// Serialized document, including the injected `_rev` and `put_at`.
    pub doc: String,
    pub wfid: Option<String>,
    pub participant_name: Option<String>,
}

impl StoredItem {
    pub fn key(&self) -> ItemKey {
        ItemKey {
            ide: self.ide.clone(),
            typ: self.typ.clone(),
            rev: self.rev,
        }
    }
}

/// Identifies a single revision of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub ide: String,
    pub typ: String,
    pub rev: u64,
}

/// Table lifecycle states reported by the backing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Creating,
    Active,
    Updating,
    Deleting,
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TableStatus::Creating => "creating",
            TableStatus::Active => "active",
            TableStatus::Updating => "updating",
            TableStatus::Deleting => "deleting",
        };
        f.write_str(s)
    }
}

/// Table to create. The key schema is always (`ide` hash, `typ` range).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

/// Store-level narrowing for scans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanFilter {
    pub typ: Option<String>,
    /// Keep only items whose `wfid` attribute is one of these.
    pub wfids: Option<Vec<String>>,
}

impl ScanFilter {
    /// Matches every item in the table.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_type(typ: impl Into<String>) -> Self {
        Self {
            typ: Some(typ.into()),
            wfids: None,
        }
    }

    pub fn with_wfids(mut self, wfids: Vec<String>) -> Self {
        self.wfids = Some(wfids);
        self
    }

    /// Evaluates the filter against an item, for backends without native scans.
    pub fn matches(&self, item: &StoredItem) -> bool {
        let type_ok = self.typ.as_deref().is_none_or(|t| item.typ == t);
        let wfid_ok = self.wfids.as_ref().is_none_or(|wfids| {
            item.wfid
                .as_deref()
                .is_some_and(|w| wfids.iter().any(|candidate| candidate == w))
        });
        type_ok && wfid_ok
    }
}

/// Result of a revision-checked write or delete.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The operation was applied.
    Success,
    /// Nothing is stored under that identity any more.
    AlreadyGone,
    /// The caller's revision is stale. Carries the current document.
    Conflict(Document),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Options for [`put`](super::DocumentStorage::put).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// Write the new `_rev` and `put_at` back into the caller's document.
    pub update_rev: bool,
}

impl PutOptions {
    pub fn update_rev() -> Self {
        Self { update_rev: true }
    }
}

/// Options for [`get_many`](super::DocumentStorage::get_many).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetManyOptions {
    pub count: bool,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub descending: bool,
}

impl GetManyOptions {
    pub fn count() -> Self {
        Self {
            count: true,
            ..Self::default()
        }
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }
}

/// Key selection for [`get_many`](super::DocumentStorage::get_many).
#[derive(Debug, Clone)]
pub enum Keys {
    /// Exact workflow instance ids, pushed down to the store.
    Wfids(Vec<String>),
    /// Patterns matched against document ids on the client (any match wins).
    Patterns(Vec<Regex>),
}

impl Keys {
    pub fn wfids<I, S>(wfids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Keys::Wfids(wfids.into_iter().map(Into::into).collect())
    }

    pub fn patterns<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map(Keys::Patterns)
    }
}

/// Result of [`get_many`](super::DocumentStorage::get_many).
#[derive(Debug, Clone, PartialEq)]
pub enum Many {
    Count(usize),
    Documents(Vec<Document>),
}

impl Many {
    /// Number of matching documents, whichever variant this is.
    pub fn len(&self) -> usize {
        match self {
            Many::Count(n) => *n,
            Many::Documents(docs) => docs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The documents, or an empty list for a count.
    pub fn into_documents(self) -> Vec<Document> {
        match self {
            Many::Count(_) => Vec::new(),
            Many::Documents(docs) => docs,
        }
    }
}
