//! Revisioned document store over a [`TableService`].

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use flowdoc_core::document::{Document, ID_FIELD, TYPE_FIELD};
use flowdoc_core::storage::query::{
    apply_order, current_item, filter_by_patterns, latest_by_identity, paginate, revisions_at,
    stale_revisions, unique_sorted_ids,
};
use flowdoc_core::storage::{
    table_name, DocumentStorage, GetManyOptions, ItemKey, Keys, Many, Outcome, PutOptions,
    Result, ScanFilter, StoreError, StoredItem, TableService,
};

/// Document type of engine messages.
pub const MSGS_TYPE: &str = "msgs";

const ACTION_FIELD: &str = "action";

/// Document store backed by a single `<prefix>.documents` table.
///
/// Every write appends a new revision and then prunes the older ones, and
/// every read resolves an identity to its greatest revision, so a prune that
/// has not happened yet (or failed) is never visible to callers.
#[derive(Debug, Clone)]
pub struct DocumentStore<S> {
    service: S,
    table_name: String,
}

impl<S: TableService> DocumentStore<S> {
    /// Creates a store without checking that the table exists.
    pub fn new(service: S, table_prefix: &str) -> Self {
        Self {
            service,
            table_name: table_name(table_prefix),
        }
    }

    /// Creates a store, failing with `TableNotFound` if the table is missing.
    pub async fn open(service: S, table_prefix: &str) -> Result<Self> {
        let store = Self::new(service, table_prefix);
        match store.service.table_status(&store.table_name).await? {
            Some(_) => Ok(store),
            None => Err(StoreError::TableNotFound {
                table_name: store.table_name,
            }),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    async fn current(&self, doc_type: &str, id: &str) -> Result<Option<StoredItem>> {
        let items = self.service.query(&self.table_name, id, doc_type).await?;
        Ok(current_item(items))
    }

    /// Deletes the given revisions, logging failures instead of returning them.
    async fn prune(&self, keys: Vec<ItemKey>) {
        for key in keys {
            match self.service.delete_item(&self.table_name, &key).await {
                Ok(_) => {
                    tracing::debug!(id = %key.ide, doc_type = %key.typ, rev = key.rev, "Pruned");
                }
                Err(err) => {
                    tracing::warn!(
                        id = %key.ide,
                        doc_type = %key.typ,
                        rev = key.rev,
                        error = %err,
                        "Failed to prune revision"
                    );
                }
            }
        }
    }

    /// Prunes every revision of an identity below `revision`.
    async fn prune_below(&self, id: &str, doc_type: &str, revision: u64) {
        match self.service.query(&self.table_name, id, doc_type).await {
            Ok(items) => self.prune(stale_revisions(&items, revision)).await,
            Err(err) => {
                tracing::warn!(%id, %doc_type, error = %err, "Failed to list revisions to prune");
            }
        }
    }

    async fn delete_keys(&self, keys: Vec<ItemKey>) -> Result<()> {
        for key in keys {
            self.service.delete_item(&self.table_name, &key).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<S: TableService> DocumentStorage for DocumentStore<S> {
    async fn put(&self, doc: &mut Document, opts: PutOptions) -> Result<Outcome> {
        let (id, doc_type) = doc.identity()?;
        let (id, doc_type) = (id.to_string(), doc_type.to_string());
        let rev = doc.rev()?;

        match (rev, self.current(&doc_type, &id).await?) {
            (None, None) => {}
            (Some(_), None) => return Ok(Outcome::AlreadyGone),
            (None, Some(current)) => return Ok(Outcome::Conflict(current.document()?)),
            (Some(rev), Some(current)) if current.rev != rev => {
                return Ok(Outcome::Conflict(current.document()?));
            }
            (Some(_), Some(_)) => {}
        }

        let new_rev = rev.unwrap_or(0) + 1;
        let stamped = doc.stamped(new_rev, Utc::now());
        let item = StoredItem::from_document(&stamped)?;

        self.service.put_item(&self.table_name, &item).await?;
        tracing::debug!(%id, %doc_type, rev = new_rev, "Stored revision");

        self.prune_below(&id, &doc_type, new_rev).await;

        if opts.update_rev {
            *doc = stamped;
        }
        Ok(Outcome::Success)
    }

    async fn put_msg(&self, action: &str, options: Map<String, Value>) -> Result<()> {
        let mut doc = Document::from(options)
            .with(ID_FIELD, Uuid::new_v4().to_string())
            .with(TYPE_FIELD, MSGS_TYPE)
            .with(ACTION_FIELD, action);
        doc.stamp(1, Utc::now());

        let item = StoredItem::from_document(&doc)?;
        self.service.put_item(&self.table_name, &item).await?;
        tracing::debug!(id = %item.ide, %action, "Stored message");
        Ok(())
    }

    async fn get(&self, doc_type: &str, id: &str) -> Result<Option<Document>> {
        self.current(doc_type, id)
            .await?
            .map(|item| item.document())
            .transpose()
    }

    async fn delete(&self, doc: &Document) -> Result<Outcome> {
        let (id, doc_type) = doc.identity()?;
        let rev = doc.rev()?.ok_or_else(|| StoreError::MissingRevision {
            id: id.to_string(),
        })?;

        let items = self.service.query(&self.table_name, id, doc_type).await?;

        let mut deleted = 0;
        for key in revisions_at(&items, rev) {
            if self.service.delete_item(&self.table_name, &key).await? {
                deleted += 1;
            }
        }

        if deleted == 0 {
            return match self.current(doc_type, id).await? {
                None => Ok(Outcome::AlreadyGone),
                Some(current) => Ok(Outcome::Conflict(current.document()?)),
            };
        }

        tracing::debug!(%id, %doc_type, rev, "Deleted document");
        self.prune(stale_revisions(&items, rev)).await;
        Ok(Outcome::Success)
    }

    async fn get_many(
        &self,
        doc_type: &str,
        keys: Option<&Keys>,
        opts: GetManyOptions,
    ) -> Result<Many> {
        let (filter, patterns) = match keys {
            Some(Keys::Wfids(wfids)) => (
                ScanFilter::by_type(doc_type).with_wfids(wfids.clone()),
                &[][..],
            ),
            Some(Keys::Patterns(patterns)) => (ScanFilter::by_type(doc_type), patterns.as_slice()),
            None => (ScanFilter::by_type(doc_type), &[][..]),
        };

        if opts.count {
            let keys = self.service.scan_keys(&self.table_name, &filter).await?;
            let mut latest = latest_by_identity(keys);
            if !patterns.is_empty() {
                latest = filter_by_patterns(latest, patterns);
            }
            return Ok(Many::Count(latest.len()));
        }

        let items = self.service.scan(&self.table_name, &filter).await?;
        let mut latest = apply_order(latest_by_identity(items), opts.descending);
        if !patterns.is_empty() {
            latest = filter_by_patterns(latest, patterns);
        }

        let docs = paginate(latest, opts.skip, opts.limit)
            .iter()
            .map(StoredItem::document)
            .collect::<Result<Vec<_>>>()?;
        Ok(Many::Documents(docs))
    }

    async fn ids(&self, doc_type: &str) -> Result<Vec<String>> {
        let keys = self
            .service
            .scan_keys(&self.table_name, &ScanFilter::by_type(doc_type))
            .await?;
        Ok(unique_sorted_ids(keys))
    }

    async fn purge(&self) -> Result<()> {
        let keys = self
            .service
            .scan_keys(&self.table_name, &ScanFilter::all())
            .await?;
        tracing::debug!(items = keys.len(), "Purging table");
        self.delete_keys(keys).await
    }

    async fn purge_type(&self, doc_type: &str) -> Result<()> {
        let keys = self
            .service
            .scan_keys(&self.table_name, &ScanFilter::by_type(doc_type))
            .await?;
        tracing::debug!(%doc_type, items = keys.len(), "Purging type");
        self.delete_keys(keys).await
    }

    async fn add_type(&self, _doc_type: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryTables;
    use flowdoc_core::document::{PUT_AT_FIELD, REV_FIELD};
    use flowdoc_core::storage::{TableSpec, TableStatus};
    use serde_json::json;

    const PREFIX: &str = "test";

    async fn store() -> DocumentStore<InMemoryTables> {
        store_on(InMemoryTables::new()).await
    }

    async fn store_on(tables: InMemoryTables) -> DocumentStore<InMemoryTables> {
        tables
            .create_table(&TableSpec {
                name: table_name(PREFIX),
                read_capacity_units: 10,
                write_capacity_units: 5,
            })
            .await
            .unwrap();
        DocumentStore::new(tables, PREFIX)
    }

    fn doc(doc_type: &str, id: &str) -> Document {
        Document::new().with("_id", id).with("type", doc_type)
    }

    fn expression(id: &str, wfid: &str) -> Document {
        doc("expressions", id).with("fei", json!({ "wfid": wfid, "expid": "0_0" }))
    }

    async fn put_new(store: &DocumentStore<InMemoryTables>, mut doc: Document) -> Document {
        let outcome = store.put(&mut doc, PutOptions::update_rev()).await.unwrap();
        assert_eq!(outcome, Outcome::Success);
        doc
    }

    fn ids_of(docs: &[Document]) -> Vec<&str> {
        docs.iter().filter_map(Document::id).collect()
    }

    async fn revisions(store: &DocumentStore<InMemoryTables>, doc_type: &str, id: &str) -> Vec<u64> {
        store
            .service()
            .query(store.table_name(), id, doc_type)
            .await
            .unwrap()
            .iter()
            .map(|item| item.rev)
            .collect()
    }

    #[tokio::test]
    async fn test_open_requires_table() {
        let err = DocumentStore::open(InMemoryTables::new(), PREFIX)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::TableNotFound {
                table_name: "test.documents".to_string()
            }
        );

        let existing = store().await;
        let reopened = DocumentStore::open(existing.service().clone(), PREFIX)
            .await
            .unwrap();
        assert_eq!(reopened.table_name(), "test.documents");
    }

    #[tokio::test]
    async fn test_put_new_document_gets_first_revision() {
        let store = store().await;
        let mut original = doc("workitems", "w1").with("participant_name", "alice");

        let outcome = store
            .put(&mut original, PutOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Success);
        let stored = store.get("workitems", "w1").await.unwrap().unwrap();
        assert_eq!(stored.rev().unwrap(), Some(1));
        assert!(stored.get(PUT_AT_FIELD).is_some());

        let mut without_stamp = stored.clone();
        without_stamp.remove(REV_FIELD);
        without_stamp.remove(PUT_AT_FIELD);
        assert_eq!(without_stamp, original);
    }

    #[tokio::test]
    async fn test_put_leaves_caller_document_alone_without_update_rev() {
        let store = store().await;
        let mut d = doc("workitems", "w1");

        store.put(&mut d, PutOptions::default()).await.unwrap();

        assert_eq!(d.rev().unwrap(), None);
        assert!(d.get(PUT_AT_FIELD).is_none());
    }

    #[tokio::test]
    async fn test_put_with_update_rev_mutates_caller_document() {
        let store = store().await;
        let mut d = doc("workitems", "w1");

        store.put(&mut d, PutOptions::update_rev()).await.unwrap();

        assert_eq!(d.rev().unwrap(), Some(1));
        assert!(d.get(PUT_AT_FIELD).is_some());
    }

    #[tokio::test]
    async fn test_put_current_revision_bumps_and_prunes() {
        let store = store().await;
        let mut d = put_new(&store, doc("workitems", "w1")).await;

        let outcome = store.put(&mut d, PutOptions::update_rev()).await.unwrap();

        assert_eq!(outcome, Outcome::Success);
        assert_eq!(d.rev().unwrap(), Some(2));
        assert_eq!(revisions(&store, "workitems", "w1").await, vec![2]);
        let stored = store.get("workitems", "w1").await.unwrap().unwrap();
        assert_eq!(stored.rev().unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_put_stale_revision_conflicts_without_mutation() {
        let store = store().await;
        let mut d = put_new(&store, doc("workitems", "w1")).await;
        let mut stale = d.clone();
        store.put(&mut d, PutOptions::update_rev()).await.unwrap();

        let outcome = store
            .put(&mut stale.clone().with("field", "x"), PutOptions::default())
            .await
            .unwrap();

        let current = store.get("workitems", "w1").await.unwrap().unwrap();
        assert_eq!(outcome, Outcome::Conflict(current.clone()));
        assert_eq!(current.rev().unwrap(), Some(2));
        assert!(current.get("field").is_none());
        assert_eq!(revisions(&store, "workitems", "w1").await, vec![2]);

        let before = stale.clone();
        let outcome = store.put(&mut stale, PutOptions::update_rev()).await.unwrap();
        assert!(matches!(outcome, Outcome::Conflict(_)));
        assert_eq!(stale, before);
    }

    #[tokio::test]
    async fn test_put_with_revision_of_deleted_document_is_already_gone() {
        let store = store().await;
        let mut d = doc("workitems", "w1").with("_rev", 4);

        let outcome = store.put(&mut d, PutOptions::default()).await.unwrap();

        assert_eq!(outcome, Outcome::AlreadyGone);
        assert_eq!(store.get("workitems", "w1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_requires_identity() {
        let store = store().await;

        let mut no_id = Document::new().with("type", "workitems");
        assert_eq!(
            store.put(&mut no_id, PutOptions::default()).await,
            Err(StoreError::MissingField("_id"))
        );

        let mut no_type = Document::new().with("_id", "w1");
        assert_eq!(
            store.put(&mut no_type, PutOptions::default()).await,
            Err(StoreError::MissingField("type"))
        );
    }

    #[tokio::test]
    async fn test_put_accepts_string_revisions() {
        let store = store().await;
        put_new(&store, doc("workitems", "w1")).await;

        let mut d = doc("workitems", "w1").with("_rev", "1");
        let outcome = store.put(&mut d, PutOptions::default()).await.unwrap();

        assert_eq!(outcome, Outcome::Success);
        assert_eq!(revisions(&store, "workitems", "w1").await, vec![2]);
    }

    #[tokio::test]
    async fn test_put_rejects_invalid_revision() {
        let store = store().await;
        let mut d = doc("workitems", "w1").with("_rev", json!([1]));

        let err = store.put(&mut d, PutOptions::default()).await.unwrap_err();

        assert!(matches!(err, StoreError::InvalidField { field: "_rev", .. }));
    }

    #[tokio::test]
    async fn test_put_prunes_orphaned_revisions() {
        let store = store().await;
        let mut d = put_new(&store, doc("workitems", "w1")).await;

        // an interrupted put left rev 1 behind
        let orphan = StoredItem::from_document(&d).unwrap();
        store.put(&mut d, PutOptions::update_rev()).await.unwrap();
        store
            .service()
            .put_item(store.table_name(), &orphan)
            .await
            .unwrap();
        assert_eq!(revisions(&store, "workitems", "w1").await, vec![1, 2]);

        let current = store.get("workitems", "w1").await.unwrap().unwrap();
        assert_eq!(current.rev().unwrap(), Some(2));

        store.put(&mut d, PutOptions::update_rev()).await.unwrap();
        assert_eq!(revisions(&store, "workitems", "w1").await, vec![3]);
    }

    #[tokio::test]
    async fn test_put_without_revision_over_existing_conflicts() {
        let store = store().await;
        let mut old = put_new(&store, doc("workitems", "w1").with("v", "old")).await;
        store.put(&mut old, PutOptions::update_rev()).await.unwrap();

        let mut fresh = doc("workitems", "w1").with("v", "new");
        let outcome = store.put(&mut fresh, PutOptions::update_rev()).await.unwrap();

        assert_eq!(outcome, Outcome::Conflict(old.clone()));
        assert_eq!(fresh, doc("workitems", "w1").with("v", "new"));
        assert_eq!(store.get("workitems", "w1").await.unwrap(), Some(old));
        assert_eq!(revisions(&store, "workitems", "w1").await, vec![2]);
    }

    #[tokio::test]
    async fn test_put_without_revision_after_delete_starts_over() {
        let store = store().await;
        let d = put_new(&store, doc("workitems", "w1").with("v", "old")).await;
        assert_eq!(store.delete(&d).await.unwrap(), Outcome::Success);

        let recreated = put_new(&store, doc("workitems", "w1").with("v", "new")).await;

        assert_eq!(recreated.rev().unwrap(), Some(1));
        let current = store.get("workitems", "w1").await.unwrap().unwrap();
        assert_eq!(current.get("v"), Some(&json!("new")));
        assert_eq!(revisions(&store, "workitems", "w1").await, vec![1]);
    }

    #[tokio::test]
    async fn test_write_paths_agree_across_item_models() {
        let services = [
            InMemoryTables::new(),
            InMemoryTables::new().with_single_revision_items(),
        ];
        for tables in services {
            let store = store_on(tables).await;
            let mut d = put_new(&store, doc("workitems", "w1").with("v", "old")).await;
            store.put(&mut d, PutOptions::update_rev()).await.unwrap();

            let mut fresh = doc("workitems", "w1").with("v", "new");
            let outcome = store.put(&mut fresh, PutOptions::default()).await.unwrap();
            assert_eq!(outcome, Outcome::Conflict(d.clone()));

            let mut stale = d.clone().with("_rev", 1);
            let outcome = store.put(&mut stale, PutOptions::default()).await.unwrap();
            assert_eq!(outcome, Outcome::Conflict(d.clone()));
            assert_eq!(store.delete(&stale).await.unwrap(), Outcome::Conflict(d.clone()));

            assert_eq!(store.get("workitems", "w1").await.unwrap(), Some(d.clone()));
            assert_eq!(revisions(&store, "workitems", "w1").await, vec![2]);

            assert_eq!(store.delete(&d).await.unwrap(), Outcome::Success);
            assert_eq!(store.delete(&d).await.unwrap(), Outcome::AlreadyGone);

            let recreated = put_new(&store, fresh).await;
            assert_eq!(recreated.rev().unwrap(), Some(1));
            assert_eq!(revisions(&store, "workitems", "w1").await, vec![1]);
        }
    }

    #[tokio::test]
    async fn test_put_survives_prune_failure() {
        let store = store().await;
        let mut d = put_new(&store, doc("workitems", "w1")).await;
        store.service().fail_next_deletes(1);

        let outcome = store.put(&mut d, PutOptions::update_rev()).await.unwrap();

        assert_eq!(outcome, Outcome::Success);
        assert_eq!(revisions(&store, "workitems", "w1").await, vec![1, 2]);
        let current = store.get("workitems", "w1").await.unwrap().unwrap();
        assert_eq!(current.rev().unwrap(), Some(2));
        assert_eq!(
            store
                .get_many("workitems", None, GetManyOptions::count())
                .await
                .unwrap(),
            Many::Count(1)
        );
    }

    #[tokio::test]
    async fn test_put_projects_indexed_attributes() {
        let store = store().await;
        put_new(
            &store,
            expression("0_0!f2!wf1", "wf1").with("participant_name", "alice"),
        )
        .await;

        let items = store
            .service()
            .query(store.table_name(), "0_0!f2!wf1", "expressions")
            .await
            .unwrap();
        assert_eq!(items[0].wfid.as_deref(), Some("wf1"));
        assert_eq!(items[0].participant_name.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_get_missing_document() {
        let store = store().await;
        assert_eq!(store.get("workitems", "nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_keeps_types_apart() {
        let store = store().await;
        put_new(&store, doc("workitems", "x").with("kind", "workitem")).await;
        put_new(&store, doc("errors", "x").with("kind", "error")).await;

        let workitem = store.get("workitems", "x").await.unwrap().unwrap();
        let error = store.get("errors", "x").await.unwrap().unwrap();
        assert_eq!(workitem.get("kind"), Some(&json!("workitem")));
        assert_eq!(error.get("kind"), Some(&json!("error")));
    }

    #[tokio::test]
    async fn test_delete_requires_revision() {
        let store = store().await;
        put_new(&store, doc("workitems", "w1")).await;

        let err = store.delete(&doc("workitems", "w1")).await.unwrap_err();

        assert_eq!(
            err,
            StoreError::MissingRevision {
                id: "w1".to_string()
            }
        );
        assert!(store.get("workitems", "w1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_document_is_already_gone() {
        let store = store().await;

        let outcome = store
            .delete(&doc("workitems", "w1").with("_rev", 1))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::AlreadyGone);
    }

    #[tokio::test]
    async fn test_delete_stale_revision_conflicts() {
        let store = store().await;
        let mut d = put_new(&store, doc("workitems", "w1")).await;
        store.put(&mut d, PutOptions::update_rev()).await.unwrap();
        store.put(&mut d, PutOptions::update_rev()).await.unwrap();

        let outcome = store
            .delete(&doc("workitems", "w1").with("_rev", 2))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Conflict(d));
        assert_eq!(revisions(&store, "workitems", "w1").await, vec![3]);
    }

    #[tokio::test]
    async fn test_delete_prunes_older_orphans() {
        let store = store().await;
        let mut d = put_new(&store, doc("workitems", "w1")).await;
        let orphan = StoredItem::from_document(&d).unwrap();
        store.put(&mut d, PutOptions::update_rev()).await.unwrap();
        store
            .service()
            .put_item(store.table_name(), &orphan)
            .await
            .unwrap();

        let outcome = store.delete(&d).await.unwrap();

        assert_eq!(outcome, Outcome::Success);
        assert_eq!(store.get("workitems", "w1").await.unwrap(), None);
        assert!(revisions(&store, "workitems", "w1").await.is_empty());
    }

    #[tokio::test]
    async fn test_concrete_scenario() {
        let store = store().await;

        let mut w1 = doc("workitem", "w1").with("participant_name", "alice");
        assert_eq!(
            store.put(&mut w1, PutOptions::update_rev()).await.unwrap(),
            Outcome::Success
        );
        assert_eq!(w1.rev().unwrap(), Some(1));

        assert_eq!(
            store.put(&mut w1, PutOptions::update_rev()).await.unwrap(),
            Outcome::Success
        );
        assert_eq!(w1.rev().unwrap(), Some(2));
        assert_eq!(revisions(&store, "workitem", "w1").await, vec![2]);

        let current = store.get("workitem", "w1").await.unwrap().unwrap();
        assert_eq!(current.rev().unwrap(), Some(2));
        assert_eq!(current.participant_name(), Some("alice"));

        let stale = doc("workitem", "w1").with("_rev", 1);
        assert_eq!(
            store.delete(&stale).await.unwrap(),
            Outcome::Conflict(current.clone())
        );

        assert_eq!(store.delete(&current).await.unwrap(), Outcome::Success);
        assert_eq!(store.get("workitem", "w1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_msg_stores_message_at_first_revision() {
        let store = store().await;
        let mut options = Map::new();
        options.insert("wfid".to_string(), json!("wf1"));
        options.insert("tree".to_string(), json!(["define", {}, []]));

        store.put_msg("launch", options).await.unwrap();

        let msgs = store
            .get_many(MSGS_TYPE, None, GetManyOptions::default())
            .await
            .unwrap()
            .into_documents();
        assert_eq!(msgs.len(), 1);
        let msg = &msgs[0];
        assert_eq!(msg.get("action"), Some(&json!("launch")));
        assert_eq!(msg.wfid(), Some("wf1"));
        assert_eq!(msg.rev().unwrap(), Some(1));
        let id = msg.id().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_get_many_orders_by_identity() {
        let store = store().await;
        for id in ["c", "a", "e", "b", "d"] {
            put_new(&store, doc("workitems", id)).await;
        }

        let ascending = store
            .get_many("workitems", None, GetManyOptions::default())
            .await
            .unwrap()
            .into_documents();
        let descending = store
            .get_many("workitems", None, GetManyOptions::default().descending())
            .await
            .unwrap()
            .into_documents();

        assert_eq!(ids_of(&ascending), vec!["a", "b", "c", "d", "e"]);
        let mut reversed = ids_of(&descending);
        reversed.reverse();
        assert_eq!(reversed, ids_of(&ascending));
    }

    #[tokio::test]
    async fn test_get_many_skip_and_limit() {
        let store = store().await;
        for id in ["e", "d", "c", "b", "a"] {
            put_new(&store, doc("workitems", id)).await;
        }

        let page = store
            .get_many(
                "workitems",
                None,
                GetManyOptions::default().with_skip(1).with_limit(2),
            )
            .await
            .unwrap()
            .into_documents();
        assert_eq!(ids_of(&page), vec!["b", "c"]);

        let descending_page = store
            .get_many(
                "workitems",
                None,
                GetManyOptions::default()
                    .with_skip(1)
                    .with_limit(2)
                    .descending(),
            )
            .await
            .unwrap()
            .into_documents();
        assert_eq!(ids_of(&descending_page), vec!["d", "c"]);
    }

    #[tokio::test]
    async fn test_get_many_returns_current_revisions_only() {
        let store = store().await;
        let mut d = put_new(&store, doc("workitems", "a")).await;
        let orphan = StoredItem::from_document(&d).unwrap();
        store.put(&mut d, PutOptions::update_rev()).await.unwrap();
        store
            .service()
            .put_item(store.table_name(), &orphan)
            .await
            .unwrap();
        put_new(&store, doc("workitems", "b")).await;

        let docs = store
            .get_many("workitems", None, GetManyOptions::default())
            .await
            .unwrap()
            .into_documents();

        assert_eq!(ids_of(&docs), vec!["a", "b"]);
        assert_eq!(docs[0].rev().unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_get_many_by_wfids() {
        let store = store().await;
        put_new(&store, expression("0_0!a!wf1", "wf1")).await;
        put_new(&store, expression("0_1!a!wf1", "wf1")).await;
        put_new(&store, expression("0_0!b!wf2", "wf2")).await;
        put_new(&store, expression("0_0!c!wf3", "wf3")).await;

        let docs = store
            .get_many(
                "expressions",
                Some(&Keys::wfids(["wf1", "wf3"])),
                GetManyOptions::default(),
            )
            .await
            .unwrap()
            .into_documents();

        assert_eq!(ids_of(&docs), vec!["0_0!a!wf1", "0_0!c!wf3", "0_1!a!wf1"]);
    }

    #[tokio::test]
    async fn test_get_many_empty_wfids_matches_nothing() {
        let store = store().await;
        put_new(&store, expression("0_0!a!wf1", "wf1")).await;

        let many = store
            .get_many(
                "expressions",
                Some(&Keys::Wfids(Vec::new())),
                GetManyOptions::default(),
            )
            .await
            .unwrap();

        assert!(many.is_empty());
    }

    #[tokio::test]
    async fn test_get_many_by_patterns() {
        let store = store().await;
        put_new(&store, expression("0_0!a!wf1", "wf1")).await;
        put_new(&store, expression("0_1!a!wf1", "wf1")).await;
        put_new(&store, expression("0_0!b!wf2", "wf2")).await;

        let keys = Keys::patterns(["!wf2$", "^0_1!"]).unwrap();
        let docs = store
            .get_many("expressions", Some(&keys), GetManyOptions::default())
            .await
            .unwrap()
            .into_documents();

        assert_eq!(ids_of(&docs), vec!["0_0!b!wf2", "0_1!a!wf1"]);
    }

    #[tokio::test]
    async fn test_get_many_patterns_apply_before_pagination() {
        let store = store().await;
        for id in ["a1", "b1", "a2", "b2", "a3"] {
            put_new(&store, doc("workitems", id)).await;
        }

        let keys = Keys::patterns(["^a"]).unwrap();
        let docs = store
            .get_many(
                "workitems",
                Some(&keys),
                GetManyOptions::default().with_skip(1).with_limit(1),
            )
            .await
            .unwrap()
            .into_documents();

        assert_eq!(ids_of(&docs), vec!["a2"]);
    }

    #[tokio::test]
    async fn test_get_many_count() {
        let store = store().await;
        put_new(&store, expression("0_0!a!wf1", "wf1")).await;
        let mut bumped = put_new(&store, expression("0_1!a!wf1", "wf1")).await;
        store
            .put(&mut bumped, PutOptions::update_rev())
            .await
            .unwrap();
        put_new(&store, expression("0_0!b!wf2", "wf2")).await;
        put_new(&store, doc("errors", "0_0!a!wf1")).await;

        async fn count(store: &DocumentStore<InMemoryTables>, keys: Option<Keys>) -> Many {
            store
                .get_many("expressions", keys.as_ref(), GetManyOptions::count())
                .await
                .unwrap()
        }

        assert_eq!(count(&store, None).await, Many::Count(3));
        assert_eq!(
            count(&store, Some(Keys::wfids(["wf1"]))).await,
            Many::Count(2)
        );
        assert_eq!(
            count(&store, Some(Keys::patterns(["^0_0!"]).unwrap())).await,
            Many::Count(2)
        );
    }

    #[tokio::test]
    async fn test_ids_are_sorted_and_unique() {
        let store = store().await;
        let mut b = put_new(&store, doc("workitems", "b")).await;
        let orphan = StoredItem::from_document(&b).unwrap();
        store.put(&mut b, PutOptions::update_rev()).await.unwrap();
        store
            .service()
            .put_item(store.table_name(), &orphan)
            .await
            .unwrap();
        put_new(&store, doc("workitems", "a")).await;
        put_new(&store, doc("errors", "c")).await;

        assert_eq!(store.ids("workitems").await.unwrap(), vec!["a", "b"]);
        assert!(store.ids("schedules").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purge_type_removes_every_revision() {
        let store = store().await;
        let mut a = put_new(&store, doc("workitems", "a")).await;
        let orphan = StoredItem::from_document(&a).unwrap();
        store.put(&mut a, PutOptions::update_rev()).await.unwrap();
        store
            .service()
            .put_item(store.table_name(), &orphan)
            .await
            .unwrap();
        put_new(&store, doc("errors", "a")).await;

        store.purge_type("workitems").await.unwrap();

        assert!(revisions(&store, "workitems", "a").await.is_empty());
        assert!(store.get("errors", "a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_purge_and_clear_empty_the_table() {
        let store = store().await;
        put_new(&store, doc("workitems", "a")).await;
        put_new(&store, doc("errors", "b")).await;

        store.purge().await.unwrap();
        assert_eq!(store.service().item_count(store.table_name()).await, 0);

        put_new(&store, doc("workitems", "c")).await;
        store.clear().await.unwrap();
        assert_eq!(store.service().item_count(store.table_name()).await, 0);
    }

    #[tokio::test]
    async fn test_add_type_and_shutdown_are_no_ops() {
        let store = store().await;
        store.add_type("workitems").await.unwrap();
        store.shutdown().await.unwrap();
        assert_eq!(
            store.service().table_status(store.table_name()).await.unwrap(),
            Some(TableStatus::Active)
        );
    }

    #[tokio::test]
    async fn test_backend_errors_propagate() {
        let store = DocumentStore::new(InMemoryTables::new(), PREFIX);

        assert!(matches!(
            store.get("workitems", "a").await,
            Err(StoreError::TableNotFound { .. })
        ));
        assert!(matches!(
            store.put(&mut doc("workitems", "a"), PutOptions::default()).await,
            Err(StoreError::TableNotFound { .. })
        ));
    }
}
