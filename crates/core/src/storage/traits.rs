use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::document::Document;

use super::{
    GetManyOptions, ItemKey, Keys, Many, Outcome, PutOptions, Result, ScanFilter, StoredItem,
    TableSpec, TableStatus,
};

/// The key/range table service the document store runs on.
///
/// Implementations only need hash+range lookups and filtered scans. Nothing
/// here is conditional except [`delete_item`](TableService::delete_item).
#[async_trait]
pub trait TableService: Send + Sync {
    /// Starts creating a table. Creation may complete asynchronously.
    async fn create_table(&self, spec: &TableSpec) -> Result<()>;

    /// Starts deleting a table. Fails with `TableNotFound` if there is none.
    async fn delete_table(&self, table_name: &str) -> Result<()>;

    /// Current table status, or `None` if the table does not exist.
    async fn table_status(&self, table_name: &str) -> Result<Option<TableStatus>>;

    /// Writes an item.
    async fn put_item(&self, table_name: &str, item: &StoredItem) -> Result<()>;

    /// Gets every stored revision for an identity.
    async fn query(&self, table_name: &str, ide: &str, typ: &str) -> Result<Vec<StoredItem>>;

    /// Deletes the item at exactly `key.rev`.
    ///
    /// Returns `false` when no item with that revision was there.
    async fn delete_item(&self, table_name: &str, key: &ItemKey) -> Result<bool>;

    /// Gets every item matching the filter, in no particular order.
    async fn scan(&self, table_name: &str, filter: &ScanFilter) -> Result<Vec<StoredItem>>;

    /// Like [`scan`](TableService::scan), but only reads the key attributes.
    async fn scan_keys(&self, table_name: &str, filter: &ScanFilter) -> Result<Vec<ItemKey>>;
}

/// The storage contract exposed to the workflow engine.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Stores a new revision of a document.
    ///
    /// Returns `AlreadyGone` when the document carried a `_rev` but is no
    /// longer stored, and `Conflict` with the current document when the
    /// revisions differ. A document without `_rev` is only written when no
    /// revision of it is stored; otherwise the current document comes back
    /// as a `Conflict`.
    async fn put(&self, doc: &mut Document, opts: PutOptions) -> Result<Outcome>;

    /// Stores an engine message at revision 1, without any revision check.
    async fn put_msg(&self, action: &str, options: Map<String, Value>) -> Result<()>;

    /// Gets the current revision of a document.
    async fn get(&self, doc_type: &str, id: &str) -> Result<Option<Document>>;

    /// Deletes a document at the revision it carries.
    async fn delete(&self, doc: &Document) -> Result<Outcome>;

    /// Lists, or counts, the current documents of a type.
    async fn get_many(
        &self,
        doc_type: &str,
        keys: Option<&Keys>,
        opts: GetManyOptions,
    ) -> Result<Many>;

    /// Sorted, unique ids of the documents of a type.
    async fn ids(&self, doc_type: &str) -> Result<Vec<String>>;

    /// Deletes every stored item.
    async fn purge(&self) -> Result<()>;

    /// Deletes every stored item of a type, at every revision.
    async fn purge_type(&self, doc_type: &str) -> Result<()>;

    /// Registers a document type. Not needed by every backend.
    async fn add_type(&self, doc_type: &str) -> Result<()>;

    /// Resets the store to empty.
    async fn clear(&self) -> Result<()> {
        self.purge().await
    }

    /// Releases resources. Not needed by every backend.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}
