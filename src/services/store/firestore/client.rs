use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use url::Url;

use crate::services::store::client::{
    Document, DocumentStore, Query, StoreError, StoreResult, StoredDocument,
    validate_document_id,
};
use crate::services::store::firestore::token::ServiceAccountTokenSource;
use crate::services::store::firestore::value::{decode_fields, encode_fields, encode_value};

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";
// The emulator accepts this token as a privileged admin credential.
const EMULATOR_TOKEN: &str = "owner";

/// Service account used to obtain OAuth2 access tokens.
#[derive(Clone)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key_pem: String,
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Debug)]
enum FirestoreAuth {
    ServiceAccount(ServiceAccountTokenSource),
    Emulator,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl FirestoreDocument {
    fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    fn into_stored(self) -> StoreResult<StoredDocument> {
        Ok(StoredDocument {
            id: self.id().to_string(),
            data: decode_fields(&self.fields)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<FirestoreDocument>,
}

/// Cloud Firestore (REST v1) backed document store.
#[derive(Debug)]
pub struct FirestoreStore {
    http: reqwest::Client,
    documents_url: Url,
    auth: FirestoreAuth,
}

impl FirestoreStore {
    /// Store talking to Cloud Firestore with service-account credentials.
    pub fn new(project_id: &str, key: ServiceAccountKey) -> StoreResult<Self> {
        let http = reqwest::Client::new();
        let tokens = ServiceAccountTokenSource::new(
            key.client_email,
            &key.private_key_pem,
            key.token_uri,
            http.clone(),
        )?;

        Ok(Self {
            documents_url: documents_url(FIRESTORE_BASE_URL, project_id)?,
            http,
            auth: FirestoreAuth::ServiceAccount(tokens),
        })
    }

    /// Store talking to a local Firestore emulator (`host:port`).
    pub fn emulator(project_id: &str, emulator_host: &str) -> StoreResult<Self> {
        let base = format!("http://{}", emulator_host.trim_end_matches('/'));

        Ok(Self {
            documents_url: documents_url(&base, project_id)?,
            http: reqwest::Client::new(),
            auth: FirestoreAuth::Emulator,
        })
    }

    fn document_url(&self, collection: &str, id: Option<&str>) -> StoreResult<Url> {
        let mut url = self.documents_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::Transport("firestore url cannot be a base".into()))?;
            segments.push(collection);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn run_query_url(&self) -> StoreResult<Url> {
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport("firestore url cannot be a base".into()))?
            .pop()
            .push("documents:runQuery");
        Ok(url)
    }

    async fn request(&self, method: Method, url: Url) -> StoreResult<RequestBuilder> {
        let token = match &self.auth {
            FirestoreAuth::ServiceAccount(tokens) => tokens.access_token().await?,
            FirestoreAuth::Emulator => EMULATOR_TOKEN.to_string(),
        };
        Ok(self.http.request(method, url).bearer_auth(token))
    }
}

fn documents_url(base: &str, project_id: &str) -> StoreResult<Url> {
    if project_id.trim().is_empty() || project_id.contains('/') {
        return Err(StoreError::Transport(format!(
            "invalid firestore project id {project_id:?}"
        )));
    }

    let mut url = Url::parse(base).map_err(|e| StoreError::Transport(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| StoreError::Transport("firestore url cannot be a base".into()))?
        .pop_if_empty()
        .extend([
            "v1",
            "projects",
            project_id,
            "databases",
            "(default)",
            "documents",
        ]);
    Ok(url)
}

/// Field paths that are not plain identifiers must be backtick-quoted.
fn field_path(field: &str) -> String {
    let simple = field
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if simple {
        field.to_string()
    } else {
        format!("`{}`", field.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn structured_query(collection: &str, query: &Query) -> Value {
    let mut sq = Map::new();
    sq.insert("from".into(), json!([{ "collectionId": collection }]));

    let mut filters: Vec<Value> = query
        .filters
        .iter()
        .map(|f| {
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": field_path(&f.field) },
                    "op": "EQUAL",
                    "value": encode_value(&f.value),
                }
            })
        })
        .collect();

    match filters.len() {
        0 => {}
        1 => {
            sq.insert("where".into(), filters.remove(0));
        }
        _ => {
            sq.insert(
                "where".into(),
                json!({ "compositeFilter": { "op": "AND", "filters": filters } }),
            );
        }
    }

    if let Some(field) = &query.order_by_desc {
        sq.insert(
            "orderBy".into(),
            json!([{ "field": { "fieldPath": field_path(field) }, "direction": "DESCENDING" }]),
        );
    }

    json!({ "structuredQuery": sq })
}

/// Turn a non-2xx response into `StoreError::Backend`, keeping Google's error message.
async fn check_status(resp: Response) -> StoreResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body);

    Err(StoreError::Backend {
        status: status.as_u16(),
        message,
    })
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Transport(e.to_string())
}

fn decode_body(e: reqwest::Error) -> StoreError {
    StoreError::Decode(e.to_string())
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn backend_name(&self) -> &'static str {
        match self.auth {
            FirestoreAuth::ServiceAccount(_) => "firestore",
            FirestoreAuth::Emulator => "firestore-emulator",
        }
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        validate_document_id(id)?;
        let url = self.document_url(collection, Some(id))?;

        let resp = self
            .request(Method::GET, url)
            .await?
            .send()
            .await
            .map_err(transport)?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let doc: FirestoreDocument = check_status(resp).await?.json().await.map_err(decode_body)?;
        Ok(Some(decode_fields(&doc.fields)?))
    }

    async fn set(&self, collection: &str, id: &str, data: Document) -> StoreResult<()> {
        validate_document_id(id)?;
        let url = self.document_url(collection, Some(id))?;

        // PATCH without an update mask replaces the whole document (or creates it).
        let resp = self
            .request(Method::PATCH, url)
            .await?
            .json(&json!({ "fields": encode_fields(&data) }))
            .send()
            .await
            .map_err(transport)?;

        check_status(resp).await?;
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()> {
        validate_document_id(id)?;
        let mut url = self.document_url(collection, Some(id))?;
        {
            let mut pairs = url.query_pairs_mut();
            for key in fields.keys() {
                pairs.append_pair("updateMask.fieldPaths", &field_path(key));
            }
            pairs.append_pair("currentDocument.exists", "true");
        }

        let resp = self
            .request(Method::PATCH, url)
            .await?
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await
            .map_err(transport)?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(collection, id));
        }

        check_status(resp).await?;
        Ok(())
    }

    async fn add(&self, collection: &str, data: Document) -> StoreResult<String> {
        let url = self.document_url(collection, None)?;

        let resp = self
            .request(Method::POST, url)
            .await?
            .json(&json!({ "fields": encode_fields(&data) }))
            .send()
            .await
            .map_err(transport)?;

        let doc: FirestoreDocument = check_status(resp).await?.json().await.map_err(decode_body)?;
        Ok(doc.id().to_string())
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<StoredDocument>> {
        let url = self.run_query_url()?;

        let resp = self
            .request(Method::POST, url)
            .await?
            .json(&structured_query(collection, query))
            .send()
            .await
            .map_err(transport)?;

        let items: Vec<RunQueryItem> =
            check_status(resp).await?.json().await.map_err(decode_body)?;

        // Items without `document` only carry a read time.
        items
            .into_iter()
            .filter_map(|item| item.document)
            .map(FirestoreDocument::into_stored)
            .collect()
    }
}
