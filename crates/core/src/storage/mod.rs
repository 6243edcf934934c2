mod error;
mod item;
pub mod query;
mod traits;
mod types;

pub use error::{Result, StoreError};
pub use traits::{DocumentStorage, TableService};
pub use types::{
    table_name, GetManyOptions, ItemKey, Keys, Many, Outcome, PutOptions, ScanFilter, StoredItem,
    TableSpec, TableStatus, DOC_ATTR, HASH_KEY, PARTICIPANT_NAME_ATTR, RANGE_KEY, REV_ATTR,
    WFID_ATTR,
};
