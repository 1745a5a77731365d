use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user record as stored in users.json
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    /// bcrypt hash; older files still hold plaintext
    #[serde(default)]
    pub password: String,
    #[serde(rename = "email_verified", default)]
    pub email_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_code: Option<String>,
    /// Unix epoch millis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_code_expiry: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    /// Fields other writers added to the record, written back untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn clear_reset_code(&mut self) {
        self.reset_code = None;
        self.reset_code_expiry = None;
    }
}

/// Public view of a user: no password or reset fields
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(rename = "email_verified")]
    pub email_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            email_verified: user.email_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
            extra: user.extra,
        }
    }
}

/// Returned on login
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}
