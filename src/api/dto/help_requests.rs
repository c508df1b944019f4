/*
 * Responsibility
 * - Help request の request/response DTO
 * - 一覧では document id を `id` として合成する
 */
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::dto::require;
use crate::repos::help_request_repo::{HelpRequestRow, HelpRequestStatus};

#[derive(Debug, Deserialize)]
pub struct CreateHelpRequestRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Value,
    #[serde(default)]
    pub urgency: String,
}

impl CreateHelpRequestRequest {
    pub fn validate(&self) -> Result<(), String> {
        require(&self.title, "title")?;
        require(&self.description, "description")?;
        if self.location.is_null() {
            return Err("location is required".into());
        }
        require(&self.urgency, "urgency")?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequestAckResponse {
    pub message: &'static str,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequestResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub location: Value,
    pub urgency: String,
    pub status: HelpRequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helper_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<HelpRequestRow> for HelpRequestResponse {
    fn from(row: HelpRequestRow) -> Self {
        Self {
            id: row.id,
            user_id: row.owner_id,
            title: row.title,
            description: row.description,
            location: row.location,
            urgency: row.urgency,
            status: row.status,
            helper_id: row.helper_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            extra: row.extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn location_may_be_text_or_coordinates_but_not_null() {
        let text: CreateHelpRequestRequest = serde_json::from_value(json!({
            "title": "t", "description": "d", "location": "Main St", "urgency": "low"
        }))
        .unwrap();
        assert!(text.validate().is_ok());

        let coords: CreateHelpRequestRequest = serde_json::from_value(json!({
            "title": "t", "description": "d", "location": {"lat": 1, "lng": 2}, "urgency": "low"
        }))
        .unwrap();
        assert!(coords.validate().is_ok());

        let missing: CreateHelpRequestRequest = serde_json::from_value(json!({
            "title": "t", "description": "d", "urgency": "low"
        }))
        .unwrap();
        assert_eq!(missing.validate(), Err("location is required".into()));
    }
}
