pub mod client;
pub mod factory;
pub mod firestore;
pub mod memory;

use chrono::{DateTime, SecondsFormat, Utc};

pub use client::{Document, DocumentStore, Query, StoreError, StoredDocument};
pub use factory::build_document_store;
pub use memory::MemoryStore;

/// Canonical timestamp form for stored documents.
///
/// Fixed microsecond precision keeps lexicographic order equal to time order,
/// so `orderBy createdAt` works the same on every backend.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}
