mod error;
mod types;

pub use error::DocumentError;
pub use types::{
    format_put_at, Document, FEI_FIELD, ID_FIELD, PARTICIPANT_NAME_FIELD, PUT_AT_FIELD, REV_FIELD,
    TYPE_FIELD, WFID_FIELD,
};
