/*
 * Responsibility
 * - 1 collection = 1 repo module (users, helpRequests)
 * - Typed rows <-> store documents
 * - Errors stay StoreError; handlers decide the HTTP meaning
 */
pub mod help_request_repo;
pub mod user_repo;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::services::store::{Document, StoreError};

pub(crate) fn to_document<T: Serialize>(row: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(row).map_err(|e| StoreError::Decode(e.to_string()))? {
        Value::Object(doc) => Ok(doc),
        _ => Err(StoreError::Decode("row did not serialize to an object".into())),
    }
}

pub(crate) fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::Decode(e.to_string()))
}
