//! In-memory table service implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use flowdoc_core::storage::{
    ItemKey, Result, ScanFilter, StoreError, StoredItem, TableService, TableSpec, TableStatus,
};

#[derive(Debug)]
struct Table {
    status: TableStatus,
    /// Status polls left before the current transition settles.
    pending_polls: u32,
    spec: TableSpec,
    items: BTreeMap<ItemKey, StoredItem>,
}

/// In-memory table service for testing.
///
/// Unlike DynamoDB, items are keyed by (`ide`, `typ`, `rev`), so superseded
/// revisions stay visible until they are pruned, unless the service is built
/// with [`with_single_revision_items`](Self::with_single_revision_items).
/// Table creation and deletion
/// can be made to take a number of status polls to settle.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTables {
    tables: Arc<RwLock<HashMap<String, Table>>>,
    provisioning_polls: u32,
    single_revision: bool,
    failing_deletes: Arc<AtomicU32>,
}

impl InMemoryTables {
    /// Creates a service whose tables become ready immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes table creation and deletion report a transitional status for
    /// `polls` status checks before settling.
    pub fn with_provisioning_delay(mut self, polls: u32) -> Self {
        self.provisioning_polls = polls;
        self
    }

    /// Keeps one item per (`ide`, `typ`) like DynamoDB does, so a put
    /// replaces whatever revision was stored under that identity.
    pub fn with_single_revision_items(mut self) -> Self {
        self.single_revision = true;
        self
    }

    /// Number of items in a table, every revision included.
    pub async fn item_count(&self, table_name: &str) -> usize {
        let tables = self.tables.read().await;
        tables.get(table_name).map_or(0, |t| t.items.len())
    }

    /// The settings a table was created with.
    pub async fn table_spec(&self, table_name: &str) -> Option<TableSpec> {
        let tables = self.tables.read().await;
        tables.get(table_name).map(|t| t.spec.clone())
    }

    /// Makes the next `n` item deletes fail with a backend error.
    #[cfg(test)]
    pub(crate) fn fail_next_deletes(&self, n: u32) {
        self.failing_deletes.store(n, Ordering::SeqCst);
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_deletes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn ready_table<'a>(
    tables: &'a HashMap<String, Table>,
    table_name: &str,
) -> Result<&'a Table> {
    let table = tables.get(table_name).ok_or_else(|| StoreError::TableNotFound {
        table_name: table_name.to_string(),
    })?;
    match table.status {
        TableStatus::Active | TableStatus::Updating => Ok(table),
        status => Err(StoreError::Backend(format!(
            "Table '{table_name}' is {status}"
        ))),
    }
}

fn ready_table_mut<'a>(
    tables: &'a mut HashMap<String, Table>,
    table_name: &str,
) -> Result<&'a mut Table> {
    let table = tables
        .get_mut(table_name)
        .ok_or_else(|| StoreError::TableNotFound {
            table_name: table_name.to_string(),
        })?;
    match table.status {
        TableStatus::Active | TableStatus::Updating => Ok(table),
        status => Err(StoreError::Backend(format!(
            "Table '{table_name}' is {status}"
        ))),
    }
}

fn identity_range(ide: &str, typ: &str) -> std::ops::RangeInclusive<ItemKey> {
    let key = |rev| ItemKey {
        ide: ide.to_string(),
        typ: typ.to_string(),
        rev,
    };
    key(0)..=key(u64::MAX)
}

#[async_trait]
impl TableService for InMemoryTables {
    async fn create_table(&self, spec: &TableSpec) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.contains_key(&spec.name) {
            return Err(StoreError::Backend(format!(
                "Table '{}' already exists or is in use",
                spec.name
            )));
        }

        let status = if self.provisioning_polls == 0 {
            TableStatus::Active
        } else {
            TableStatus::Creating
        };
        tables.insert(
            spec.name.clone(),
            Table {
                status,
                pending_polls: self.provisioning_polls,
                spec: spec.clone(),
                items: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_table(&self, table_name: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        if self.provisioning_polls == 0 {
            return match tables.remove(table_name) {
                Some(_) => Ok(()),
                None => Err(StoreError::TableNotFound {
                    table_name: table_name.to_string(),
                }),
            };
        }

        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| StoreError::TableNotFound {
                table_name: table_name.to_string(),
            })?;
        table.status = TableStatus::Deleting;
        table.pending_polls = self.provisioning_polls;
        Ok(())
    }

    async fn table_status(&self, table_name: &str) -> Result<Option<TableStatus>> {
        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(table_name) else {
            return Ok(None);
        };

        if table.pending_polls > 0 {
            table.pending_polls -= 1;
            return Ok(Some(table.status));
        }

        match table.status {
            TableStatus::Deleting => {
                tables.remove(table_name);
                Ok(None)
            }
            TableStatus::Creating | TableStatus::Updating => {
                table.status = TableStatus::Active;
                Ok(Some(TableStatus::Active))
            }
            TableStatus::Active => Ok(Some(TableStatus::Active)),
        }
    }

    async fn put_item(&self, table_name: &str, item: &StoredItem) -> Result<()> {
        let mut tables = self.tables.write().await;
        let table = ready_table_mut(&mut tables, table_name)?;
        if self.single_revision {
            table
                .items
                .retain(|key, _| key.ide != item.ide || key.typ != item.typ);
        }
        table.items.insert(item.key(), item.clone());
        Ok(())
    }

    async fn query(&self, table_name: &str, ide: &str, typ: &str) -> Result<Vec<StoredItem>> {
        let tables = self.tables.read().await;
        let table = ready_table(&tables, table_name)?;
        Ok(table
            .items
            .range(identity_range(ide, typ))
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn delete_item(&self, table_name: &str, key: &ItemKey) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let table = ready_table_mut(&mut tables, table_name)?;
        if self.take_injected_failure() {
            return Err(StoreError::Backend(
                "Throughput exceeded, please retry".to_string(),
            ));
        }
        Ok(table.items.remove(key).is_some())
    }

    async fn scan(&self, table_name: &str, filter: &ScanFilter) -> Result<Vec<StoredItem>> {
        let tables = self.tables.read().await;
        let table = ready_table(&tables, table_name)?;
        Ok(table
            .items
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect())
    }

    async fn scan_keys(&self, table_name: &str, filter: &ScanFilter) -> Result<Vec<ItemKey>> {
        let tables = self.tables.read().await;
        let table = ready_table(&tables, table_name)?;
        Ok(table
            .items
            .values()
            .filter(|item| filter.matches(item))
            .map(StoredItem::key)
            .collect())
    }
}
