//! Document store interface used by the repositories.
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// A flat JSON object stored under `collection/id`.
pub type Document = Map<String, Value>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer errors.
///
/// Kept independent from `AppError`: handlers decide which message to show and
/// repos never know about HTTP.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
    #[error("invalid document id: {0:?}")]
    InvalidDocumentId(String),
    #[error("store transport error: {0}")]
    Transport(String),
    #[error("store backend error ({status}): {message}")]
    Backend { status: u16, message: String },
    #[error("store authentication error: {0}")]
    Auth(String),
    #[error("store decode error: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// A document returned from a query, with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

/// Equality filters (AND-ed) plus an optional descending order on one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<FieldFilter>,
    pub order_by_desc: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Largest value first. Documents without `field` are left out.
    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by_desc = Some(field.into());
        self
    }
}

/// Collection/document keyed database.
///
/// Implementations are shared behind `Arc<dyn DocumentStore>` for the whole
/// process and must be safe for concurrent use.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    // Returns the backend name (for logging and the store check route).
    fn backend_name(&self) -> &'static str;

    // Read one document. `Ok(None)` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    // Create or fully overwrite a document.
    async fn set(&self, collection: &str, id: &str, data: Document) -> StoreResult<()>;

    // Merge `fields` into an existing document.
    // Returns `StoreError::NotFound` when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()>;

    // Create a document under a generated id and return that id.
    async fn add(&self, collection: &str, data: Document) -> StoreResult<String>;

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<StoredDocument>>;
}

/// Reject ids the backends cannot address (empty, path separators, dot segments).
pub fn validate_document_id(id: &str) -> StoreResult<()> {
    let invalid = id.trim().is_empty()
        || id.contains('/')
        || id == "."
        || id == ".."
        || id.len() > 1500
        || (id.starts_with("__") && id.ends_with("__"));

    if invalid {
        return Err(StoreError::InvalidDocumentId(id.to_string()));
    }
    Ok(())
}
