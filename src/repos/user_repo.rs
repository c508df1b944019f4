/*
 * Responsibility
 * - users collection (document key = subject id)
 * - DocumentStore を受け取り register / get / update を提供
 * - Store errors are returned as-is (StoreError)
 */
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::repos::{from_document, to_document};
use crate::services::store::{Document, DocumentStore, StoreError, now_timestamp};

pub const COLLECTION: &str = "users";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Helper,
    Helpseeker,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub email: String,
    pub display_name: String,
    pub user_type: UserType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    // Fields written by other clients (e.g. fcm tokens) survive a read.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct NewUser<'a> {
    pub email: &'a str,
    pub display_name: &'a str,
    pub user_type: UserType,
}

/// Profile fields a user may change. `None` leaves the stored value alone.
#[derive(Debug, Default)]
pub struct ProfileChanges<'a> {
    pub display_name: Option<&'a str>,
    pub phone_number: Option<&'a str>,
    pub address: Option<&'a str>,
}

pub async fn get(store: &dyn DocumentStore, uid: &str) -> Result<Option<UserRow>, StoreError> {
    store
        .get(COLLECTION, uid)
        .await?
        .map(from_document::<UserRow>)
        .transpose()
}

/// Create or overwrite the profile stored under `uid`.
pub async fn register(
    store: &dyn DocumentStore,
    uid: &str,
    user: NewUser<'_>,
) -> Result<UserRow, StoreError> {
    let now = now_timestamp();
    let row = UserRow {
        email: user.email.to_string(),
        display_name: user.display_name.to_string(),
        user_type: user.user_type,
        phone_number: None,
        address: None,
        created_at: now.clone(),
        updated_at: now,
        extra: Map::new(),
    };

    store.set(COLLECTION, uid, to_document(&row)?).await?;

    Ok(row)
}

/// Returns `Ok(false)` when there is no profile under `uid`.
pub async fn update(
    store: &dyn DocumentStore,
    uid: &str,
    changes: ProfileChanges<'_>,
) -> Result<bool, StoreError> {
    let mut fields = Document::new();
    let provided = [
        ("displayName", changes.display_name),
        ("phoneNumber", changes.phone_number),
        ("address", changes.address),
    ];
    for (key, value) in provided {
        if let Some(v) = value {
            fields.insert(key.to_string(), Value::from(v));
        }
    }
    fields.insert("updatedAt".to_string(), Value::from(now_timestamp()));

    match store.update(COLLECTION, uid, fields).await {
        Ok(()) => Ok(true),
        Err(StoreError::NotFound { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::MemoryStore;

    #[tokio::test]
    async fn register_then_get_returns_the_profile() {
        let store = MemoryStore::new();
        let user = NewUser {
            email: "a@b.com",
            display_name: "A",
            user_type: UserType::Helper,
        };

        register(&store, "u1", user).await.unwrap();
        let row = get(&store, "u1").await.unwrap().unwrap();

        assert_eq!(row.email, "a@b.com");
        assert_eq!(row.display_name, "A");
        assert_eq!(row.user_type, UserType::Helper);
        assert_eq!(row.created_at, row.updated_at);
        assert!(get(&store, "u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_touches_only_provided_fields() {
        let store = MemoryStore::new();
        let user = NewUser {
            email: "a@b.com",
            display_name: "A",
            user_type: UserType::Helpseeker,
        };
        register(&store, "u1", user).await.unwrap();

        let changes = ProfileChanges {
            phone_number: Some("555-0100"),
            ..Default::default()
        };
        assert!(update(&store, "u1", changes).await.unwrap());

        let row = get(&store, "u1").await.unwrap().unwrap();
        assert_eq!(row.display_name, "A");
        assert_eq!(row.phone_number.as_deref(), Some("555-0100"));
        assert!(row.address.is_none());
    }

    #[tokio::test]
    async fn update_of_unknown_user_reports_false() {
        let store = MemoryStore::new();
        assert!(!update(&store, "ghost", ProfileChanges::default()).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_fields_are_preserved_on_read() {
        let store = MemoryStore::new();
        let doc = serde_json::json!({
            "email": "a@b.com",
            "displayName": "A",
            "userType": "helper",
            "createdAt": "t",
            "updatedAt": "t",
            "fcm_token": "tok"
        });
        store
            .set(COLLECTION, "u1", doc.as_object().cloned().unwrap())
            .await
            .unwrap();

        let row = get(&store, "u1").await.unwrap().unwrap();
        assert_eq!(row.extra["fcm_token"], "tok");
    }
}
