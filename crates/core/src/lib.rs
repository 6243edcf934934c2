//! flowdoc_core - Types, pure helpers and contracts for the flowdoc document store.

pub mod document;
pub mod storage;
