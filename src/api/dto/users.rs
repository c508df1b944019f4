/*
 * Responsibility
 * - Users の request/response DTO (wire は camelCase)
 * - validate() は必須フィールドの存在チェックのみ
 */
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::dto::require;
use crate::repos::user_repo::{UserRow, UserType};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    pub user_type: Option<UserType>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<UserType, String> {
        require(&self.uid, "uid")?;
        require(&self.email, "email")?;
        require(&self.display_name, "displayName")?;

        self.user_type.ok_or_else(|| "userType is required".to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.display_name.is_none() && self.phone_number.is_none() && self.address.is_none() {
            return Err("at least one of displayName, phoneNumber, address is required".into());
        }
        if let Some(name) = &self.display_name {
            require(name, "displayName")?;
        }
        Ok(())
    }
}

/// The stored profile document, as written.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileResponse {
    pub email: String,
    pub display_name: String,
    pub user_type: UserType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<UserRow> for UserProfileResponse {
    fn from(row: UserRow) -> Self {
        Self {
            email: row.email,
            display_name: row.display_name,
            user_type: row.user_type,
            phone_number: row.phone_number,
            address: row.address,
            created_at: row.created_at,
            updated_at: row.updated_at,
            extra: row.extra,
        }
    }
}
