/*
 * Responsibility
 * - helpRequests collection (generated document ids)
 * - owner は `userId` フィールドに保存 (既存ドキュメントと互換)
 * - Lists are newest first (createdAt DESC)
 */
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::repos::{from_document, to_document};
use crate::services::store::{
    Document, DocumentStore, Query, StoreError, StoredDocument, now_timestamp,
};

pub const COLLECTION: &str = "helpRequests";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HelpRequestStatus {
    Open,
    Accepted,
    Completed,
    Cancelled,
    /// Any other stored value, passed through unchanged.
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequestRow {
    // Document key; not stored inside the document.
    #[serde(skip)]
    pub id: String,

    #[serde(rename = "userId")]
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub location: Value,
    pub urgency: String,
    pub status: HelpRequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helper_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct NewHelpRequest<'a> {
    pub owner_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub location: Value,
    pub urgency: &'a str,
}

fn row_from(doc: StoredDocument) -> Result<HelpRequestRow, StoreError> {
    let mut row: HelpRequestRow = from_document(doc.data)?;
    row.id = doc.id;
    Ok(row)
}

/// Documents that do not decode as a help request are logged and left out.
async fn list(store: &dyn DocumentStore, query: Query) -> Result<Vec<HelpRequestRow>, StoreError> {
    let docs = store.query(COLLECTION, &query).await?;

    let mut rows = Vec::with_capacity(docs.len());
    for doc in docs {
        let id = doc.id.clone();
        match row_from(doc) {
            Ok(row) => rows.push(row),
            Err(e) => tracing::warn!(
                collection = COLLECTION,
                id = %id,
                error = %e,
                "skipping malformed document"
            ),
        }
    }
    Ok(rows)
}

pub async fn create(
    store: &dyn DocumentStore,
    req: NewHelpRequest<'_>,
) -> Result<HelpRequestRow, StoreError> {
    let now = now_timestamp();
    let mut row = HelpRequestRow {
        id: String::new(),
        owner_id: req.owner_id.to_string(),
        title: req.title.to_string(),
        description: req.description.to_string(),
        location: req.location,
        urgency: req.urgency.to_string(),
        status: HelpRequestStatus::Open,
        helper_id: None,
        created_at: now.clone(),
        updated_at: now,
        extra: Map::new(),
    };

    row.id = store.add(COLLECTION, to_document(&row)?).await?;

    Ok(row)
}

pub async fn get(store: &dyn DocumentStore, id: &str) -> Result<Option<HelpRequestRow>, StoreError> {
    match store.get(COLLECTION, id).await? {
        Some(data) => row_from(StoredDocument {
            id: id.to_string(),
            data,
        })
        .map(Some),
        None => Ok(None),
    }
}

/// Help requests created by `owner_id`, newest first.
pub async fn list_by_owner(
    store: &dyn DocumentStore,
    owner_id: &str,
) -> Result<Vec<HelpRequestRow>, StoreError> {
    let query = Query::new()
        .where_eq("userId", owner_id)
        .order_by_desc("createdAt");
    list(store, query).await
}

/// Help requests still waiting for a helper, newest first.
pub async fn list_open(store: &dyn DocumentStore) -> Result<Vec<HelpRequestRow>, StoreError> {
    let query = Query::new()
        .where_eq("status", "open")
        .order_by_desc("createdAt");
    list(store, query).await
}

/// Mark a request as accepted by `helper_id`.
///
/// Status is not re-checked at write time: the store offers no transactions,
/// so two helpers racing on the same request both succeed and the last one wins.
pub async fn accept(
    store: &dyn DocumentStore,
    id: &str,
    helper_id: &str,
) -> Result<bool, StoreError> {
    let mut fields = Document::new();
    fields.insert("status".to_string(), Value::from("accepted"));
    fields.insert("helperId".to_string(), Value::from(helper_id));
    fields.insert("updatedAt".to_string(), Value::from(now_timestamp()));

    match store.update(COLLECTION, id, fields).await {
        Ok(()) => Ok(true),
        Err(StoreError::NotFound { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::MemoryStore;
    use serde_json::json;

    fn new_request<'a>(owner_id: &'a str, title: &'a str) -> NewHelpRequest<'a> {
        NewHelpRequest {
            owner_id,
            title,
            description: "need a hand",
            location: json!({"lat": 1.0, "lng": 2.0}),
            urgency: "high",
        }
    }

    #[tokio::test]
    async fn created_requests_are_open_and_stored_under_user_id() {
        let store = MemoryStore::new();
        let row = create(&store, new_request("u1", "groceries")).await.unwrap();

        assert!(!row.id.is_empty());
        assert_eq!(row.status, HelpRequestStatus::Open);

        let raw = store.get(COLLECTION, &row.id).await.unwrap().unwrap();
        assert_eq!(raw["userId"], "u1");
        assert_eq!(raw["status"], "open");
        assert!(raw.get("id").is_none());
    }

    #[tokio::test]
    async fn owner_listing_is_newest_first_and_scoped() {
        let store = MemoryStore::new();
        let first = create(&store, new_request("u1", "first")).await.unwrap();
        create(&store, new_request("u2", "other")).await.unwrap();
        let second = create(&store, new_request("u1", "second")).await.unwrap();

        let rows = list_by_owner(&store, "u1").await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    }

    #[tokio::test]
    async fn accepted_requests_leave_the_open_list() {
        let store = MemoryStore::new();
        let row = create(&store, new_request("u1", "walk")).await.unwrap();
        assert_eq!(list_open(&store).await.unwrap().len(), 1);

        assert!(accept(&store, &row.id, "h1").await.unwrap());

        let stored = get(&store, &row.id).await.unwrap().unwrap();
        assert_eq!(stored.status, HelpRequestStatus::Accepted);
        assert_eq!(stored.helper_id.as_deref(), Some("h1"));
        assert!(list_open(&store).await.unwrap().is_empty());

        assert!(!accept(&store, "missing", "h1").await.unwrap());
    }

    #[tokio::test]
    async fn unfamiliar_or_broken_documents_do_not_break_listings() {
        let store = MemoryStore::new();
        let good = create(&store, new_request("u1", "walk")).await.unwrap();

        let mut archived = to_document(&good).unwrap();
        archived.insert("status".into(), json!("archived"));
        archived.insert("createdAt".into(), json!("2020-01-01T00:00:00.000000Z"));
        store.set(COLLECTION, "old", archived).await.unwrap();

        let mut broken = Document::new();
        broken.insert("userId".into(), json!("u1"));
        broken.insert("createdAt".into(), json!("2021-01-01T00:00:00.000000Z"));
        store.set(COLLECTION, "broken", broken).await.unwrap();

        let rows = list_by_owner(&store, "u1").await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![good.id.as_str(), "old"]);
        assert_eq!(rows[1].status, HelpRequestStatus::Other("archived".into()));

        let raw = to_document(&rows[1]).unwrap();
        assert_eq!(raw["status"], "archived");
    }
}
