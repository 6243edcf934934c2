//! Table provisioning.
//!
//! The table service creates and deletes tables asynchronously. These
//! functions plan what has to happen to the document table, run it, and poll
//! the service until the table settles, so callers see a synchronous
//! operation.

use std::time::Duration;

use flowdoc_core::storage::{
    table_name, Result, StoreError, TableService, TableSpec, TableStatus,
};

pub const DEFAULT_READ_CAPACITY: i64 = 10;
pub const DEFAULT_WRITE_CAPACITY: i64 = 5;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Capacity and polling settings for [`create_table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOptions {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
    /// Delay between two status polls.
    pub poll_interval: Duration,
    /// Polls allowed per wait. `None` waits forever.
    pub max_polls: Option<u32>,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            read_capacity_units: DEFAULT_READ_CAPACITY,
            write_capacity_units: DEFAULT_WRITE_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: None,
        }
    }
}

impl ProvisionOptions {
    pub fn with_capacity(mut self, read: i64, write: i64) -> Self {
        self.read_capacity_units = read;
        self.write_capacity_units = write;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }
}

/// What [`create_table`] has to do to reach a ready table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionPlan {
    /// Table doesn't exist, create it.
    Create,
    /// Table exists and is dropped before being created again.
    Recreate,
    /// Table is being deleted. Wait for it to be gone, then create it.
    AwaitDeletion,
    /// Table exists and is kept. Only wait for it to be ready.
    UseExisting,
}

/// Pure function: decide how to provision given the current table status.
pub fn plan_provision(current: Option<TableStatus>, recreate: bool) -> ProvisionPlan {
    match current {
        None => ProvisionPlan::Create,
        Some(TableStatus::Deleting) => ProvisionPlan::AwaitDeletion,
        Some(_) if recreate => ProvisionPlan::Recreate,
        Some(_) => ProvisionPlan::UseExisting,
    }
}

/// Creates the `<prefix>.documents` table and waits until it is ready.
///
/// With `recreate`, an existing table is deleted first and the call waits for
/// it to be gone. Without it, an existing table is kept. Returns the table
/// name.
pub async fn create_table<S: TableService + ?Sized>(
    service: &S,
    table_prefix: &str,
    recreate: bool,
    options: &ProvisionOptions,
) -> Result<String> {
    let name = table_name(table_prefix);
    let current = service.table_status(&name).await?;

    match plan_provision(current, recreate) {
        ProvisionPlan::UseExisting => {
            tracing::info!(table = %name, "Table already exists");
        }
        ProvisionPlan::AwaitDeletion => {
            wait_until_gone(service, &name, options).await?;
            create(service, &name, options).await?;
        }
        ProvisionPlan::Recreate => {
            drop_table(service, &name, options).await?;
            create(service, &name, options).await?;
        }
        ProvisionPlan::Create => {
            create(service, &name, options).await?;
        }
    }

    wait_until_ready(service, &name, options).await?;
    tracing::info!(table = %name, "Table is active");
    Ok(name)
}

/// Deletes a table and waits until the service no longer reports it.
///
/// A table that is already gone counts as deleted.
pub async fn drop_table<S: TableService + ?Sized>(
    service: &S,
    name: &str,
    options: &ProvisionOptions,
) -> Result<()> {
    match service.delete_table(name).await {
        Ok(()) => tracing::info!(table = %name, "Deleting table"),
        Err(StoreError::TableNotFound { .. }) => {
            tracing::info!(table = %name, "Table does not exist");
            return Ok(());
        }
        Err(err) => return Err(err),
    }

    wait_until_gone(service, name, options).await
}

/// Polls until the service no longer reports the table.
async fn wait_until_gone<S: TableService + ?Sized>(
    service: &S,
    name: &str,
    options: &ProvisionOptions,
) -> Result<()> {
    let mut polls = 0;
    loop {
        match service.table_status(name).await {
            Ok(None) | Err(StoreError::TableNotFound { .. }) => break,
            Ok(Some(status)) => {
                check_polls(name, status, &mut polls, options)?;
                tracing::info!(table = %name, %status, "Waiting for table deletion");
                tokio::time::sleep(options.poll_interval).await;
            }
            Err(err) => return Err(err),
        }
    }

    tracing::info!(table = %name, "Table deleted");
    Ok(())
}

async fn create<S: TableService + ?Sized>(
    service: &S,
    name: &str,
    options: &ProvisionOptions,
) -> Result<()> {
    service
        .create_table(&TableSpec {
            name: name.to_string(),
            read_capacity_units: options.read_capacity_units,
            write_capacity_units: options.write_capacity_units,
        })
        .await?;
    tracing::info!(
        table = %name,
        read_capacity = options.read_capacity_units,
        write_capacity = options.write_capacity_units,
        "Creating table"
    );
    Ok(())
}

/// Polls until the table is active.
async fn wait_until_ready<S: TableService + ?Sized>(
    service: &S,
    name: &str,
    options: &ProvisionOptions,
) -> Result<()> {
    let mut polls = 0;
    loop {
        match service.table_status(name).await? {
            Some(TableStatus::Active) => return Ok(()),
            Some(status @ (TableStatus::Creating | TableStatus::Updating)) => {
                check_polls(name, status, &mut polls, options)?;
                tracing::info!(table = %name, %status, "Waiting for table");
                tokio::time::sleep(options.poll_interval).await;
            }
            Some(TableStatus::Deleting) | None => {
                return Err(StoreError::TableNotFound {
                    table_name: name.to_string(),
                });
            }
        }
    }
}

fn check_polls(
    name: &str,
    status: TableStatus,
    polls: &mut u32,
    options: &ProvisionOptions,
) -> Result<()> {
    if options.max_polls.is_some_and(|max| *polls >= max) {
        return Err(StoreError::ProvisionTimeout {
            table_name: name.to_string(),
            state: status.to_string(),
        });
    }
    *polls += 1;
    Ok(())
}
