use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Audit trail entry for admin actions on the document-review surface.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminLog {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub admin_id: ObjectId,
    pub action: String,
    pub created_at: DateTime,
}
