use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;

use super::ProfileType;

/// Admin-editable catalog entry: one required document type for one role.
/// The verification engine falls back to hardcoded defaults when a role has
/// no active entries.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DocumentConfig {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub document_type: String,
    pub label: String,
    pub description: Option<String>,
    pub profile_type: ProfileType,
    pub active: bool,
    pub order: i32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DocumentConfigDto {
    pub document_type: String,
    pub label: String,
    pub description: Option<String>,
    pub profile_type: ProfileType,
    pub active: bool,
    pub order: Option<i32>,
}

/// User-facing view of a requirement: just what to upload, in display order.
#[derive(Debug, Serialize, JsonSchema)]
pub struct RequirementResponse {
    pub document_type: String,
    pub label: String,
    pub description: Option<String>,
}

impl From<DocumentConfig> for RequirementResponse {
    fn from(config: DocumentConfig) -> Self {
        RequirementResponse {
            document_type: config.document_type,
            label: config.label,
            description: config.description,
        }
    }
}
