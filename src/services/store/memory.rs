use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::services::store::client::{
    Document, DocumentStore, FieldFilter, Query, StoreError, StoreResult,
    StoredDocument, validate_document_id,
};

/// In-process document store.
///
/// Used for local development (`STORE_BACKEND=memory`) and tests. Query
/// semantics follow Firestore: documents without the ordering field are
/// excluded, and writes are visible immediately.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

#[derive(Debug, Default)]
struct Collection {
    next_seq: u64,
    docs: HashMap<String, Entry>,
}

#[derive(Debug)]
struct Entry {
    // Write order, used to break ordering ties (latest write wins for DESC).
    seq: u64,
    data: Document,
}

impl Collection {
    fn put(&mut self, id: &str, data: Document) {
        self.next_seq += 1;
        self.docs.insert(
            id.to_string(),
            Entry {
                seq: self.next_seq,
                data,
            },
        );
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(data: &Document, filters: &[FieldFilter]) -> bool {
    filters.iter().all(|f| data.get(&f.field) == Some(&f.value))
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: by type first, then by value.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(l, r)| compare_values(l, r))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        validate_document_id(id)?;

        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.docs.get(id))
            .map(|e| e.data.clone()))
    }

    async fn set(&self, collection: &str, id: &str, data: Document) -> StoreResult<()> {
        validate_document_id(id)?;

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .put(id, data);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()> {
        validate_document_id(id)?;

        let mut collections = self.collections.write().await;
        let entry = collections
            .get_mut(collection)
            .and_then(|c| c.docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        entry.data.extend(fields);
        Ok(())
    }

    async fn add(&self, collection: &str, data: Document) -> StoreResult<String> {
        let id = Uuid::new_v4().simple().to_string();

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .put(&id, data);
        Ok(id)
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<StoredDocument>> {
        let collections = self.collections.read().await;
        let Some(col) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<(&String, &Entry)> = col
            .docs
            .iter()
            .filter(|(_, e)| matches(&e.data, &query.filters))
            .collect();
        hits.sort_by_key(|(_, e)| e.seq);

        if let Some(field) = query.order_by_desc.as_deref() {
            hits.retain(|(_, e)| e.data.contains_key(field));
            // Stable sort over reversed write order: ties keep the latest write first.
            hits.reverse();
            hits.sort_by(|(_, a), (_, b)| compare_values(&b.data[field], &a.data[field]));
        }

        Ok(hits
            .into_iter()
            .map(|(id, e)| StoredDocument {
                id: id.clone(),
                data: e.data.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn set_overwrites_and_update_merges() {
        let store = MemoryStore::new();
        store
            .set("users", "u1", doc(json!({"email": "a@b.com", "displayName": "A"})))
            .await
            .unwrap();
        store
            .set("users", "u1", doc(json!({"email": "c@d.com"})))
            .await
            .unwrap();

        let got = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(got, doc(json!({"email": "c@d.com"})));

        store
            .update("users", "u1", doc(json!({"displayName": "C"})))
            .await
            .unwrap();
        let got = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(got, doc(json!({"email": "c@d.com", "displayName": "C"})));
    }

    #[tokio::test]
    async fn update_of_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update("users", "ghost", doc(json!({"a": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn query_filters_and_orders_descending() {
        let store = MemoryStore::new();
        for (owner, at) in [("u1", "2026-01-01"), ("u2", "2026-01-02"), ("u1", "2026-01-03")] {
            store
                .add("helpRequests", doc(json!({"userId": owner, "createdAt": at})))
                .await
                .unwrap();
        }
        store
            .add("helpRequests", doc(json!({"userId": "u1"})))
            .await
            .unwrap();

        let q = Query::new()
            .where_eq("userId", "u1")
            .order_by_desc("createdAt");
        let hits = store.query("helpRequests", &q).await.unwrap();

        let dates: Vec<_> = hits.iter().map(|d| d.data["createdAt"].clone()).collect();
        assert_eq!(dates, vec![json!("2026-01-03"), json!("2026-01-01")]);
    }

    #[tokio::test]
    async fn descending_ties_return_latest_write_first() {
        let store = MemoryStore::new();
        let first = store
            .add("c", doc(json!({"createdAt": "same"})))
            .await
            .unwrap();
        let second = store
            .add("c", doc(json!({"createdAt": "same"})))
            .await
            .unwrap();

        let q = Query::new().order_by_desc("createdAt");
        let ids: Vec<_> = store
            .query("c", &q)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn values_order_by_type_then_value() {
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_values(&json!(1), &json!("1")), Ordering::Less);
    }
}
