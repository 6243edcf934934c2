//! Conversions between engine documents and stored rows.

use crate::document::{Document, REV_FIELD};

use super::{Result, StoreError, StoredItem};

impl StoredItem {
    /// Projects a stamped document onto a row.
    ///
    /// `wfid` and `participant_name` are only set when the document has a
    /// non-empty value for them.
    pub fn from_document(doc: &Document) -> Result<Self> {
        let (id, typ) = doc.identity()?;
        let rev = doc.rev()?.ok_or(StoreError::MissingField(REV_FIELD))?;

        Ok(Self {
            ide: id.to_string(),
            typ: typ.to_string(),
            rev,
            doc: serde_json::to_string(doc)?,
            wfid: doc.wfid().map(str::to_string),
            participant_name: doc.participant_name().map(str::to_string),
        })
    }

    /// Decodes the serialized document.
    pub fn document(&self) -> Result<Document> {
        Ok(serde_json::from_str(&self.doc)?)
    }
}
