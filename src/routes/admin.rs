use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime, oid::ObjectId};
use mongodb::options::{FindOptions, UpdateOptions};
use std::collections::HashMap;
use crate::db::DbConn;
use crate::models::{
    AdminLog, Document, DocumentConfig, DocumentConfigDto, DocumentStatus, ReviewDocumentDto,
    User, UserResponse,
};
use crate::guards::AdminGuard;
use crate::services::NotificationService;
use crate::utils::{ApiResponse, ApiError};
use crate::verification;

// ============================================================================
// USERS
// ============================================================================

#[openapi(tag = "Admin")]
#[get("/admin/users")]
pub async fn get_all_users(
    db: &State<DbConn>,
    _admin: AdminGuard,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db.collection::<User>("users")
        .find(doc! {}, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut users = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let user: User = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        users.push(UserResponse::from(user));
    }

    Ok(Json(ApiResponse::success(users)))
}

// ============================================================================
// DOCUMENT REVIEW
// ============================================================================

#[openapi(tag = "Admin")]
#[get("/admin/documents/pending")]
pub async fn pending_documents(
    db: &State<DbConn>,
    _admin: AdminGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db.collection::<Document>("documents")
        .find(doc! { "status": "pending" }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut documents = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let document: Document = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        documents.push(document);
    }

    // One lookup for all submitters
    let user_ids: Vec<ObjectId> = documents.iter().map(|d| d.user_id).collect();
    let mut cursor = db.collection::<User>("users")
        .find(doc! { "_id": { "$in": user_ids } }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut submitters: HashMap<ObjectId, User> = HashMap::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let user: User = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        if let Some(id) = user.id {
            submitters.insert(id, user);
        }
    }

    let rows: Vec<serde_json::Value> = documents
        .iter()
        .map(|document| {
            let submitter = submitters.get(&document.user_id);
            serde_json::json!({
                "id": document.id.map(|id| id.to_hex()),
                "document_type": document.document_type,
                "file_url": document.file_url,
                "document_number": document.document_number,
                "created_at": document.created_at,
                "user": submitter.map(|u| serde_json::json!({
                    "id": u.id.map(|id| id.to_hex()),
                    "name": u.name,
                    "email": u.email,
                    "profile_type": u.profile_type.as_str(),
                })),
            })
        })
        .collect();

    Ok(Json(ApiResponse::success(serde_json::json!({
        "documents": rows
    }))))
}

#[openapi(tag = "Admin")]
#[put("/admin/documents/<document_id>/review", data = "<dto>")]
pub async fn review_document(
    db: &State<DbConn>,
    admin: AdminGuard,
    document_id: String,
    dto: Json<ReviewDocumentDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&document_id)
        .map_err(|_| ApiError::bad_request("Invalid document ID"))?;

    let status = match dto.status.as_str() {
        "approved" => DocumentStatus::Approved,
        "rejected" => DocumentStatus::Rejected,
        _ => return Err(ApiError::bad_request("Invalid status")),
    };

    let admin_id = admin.auth.user_id;
    let overall =
        verification::apply_review(db, admin_id, object_id, status, dto.note.clone()).await?;

    // Audit trail + owner notification are best-effort side effects.
    let document = db.collection::<Document>("documents")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .ok()
        .flatten();

    if let Some(ref document) = document {
        db.collection::<AdminLog>("admin_logs")
            .insert_one(
                &AdminLog {
                    id: None,
                    admin_id,
                    action: format!(
                        "Set document {} of user {} to {}",
                        document_id,
                        document.user_id.to_hex(),
                        status.as_str()
                    ),
                    created_at: DateTime::now(),
                },
                None,
            )
            .await
            .ok();

        let (title, body) = match status {
            DocumentStatus::Rejected => (
                "Document rejected",
                format!(
                    "Your {} was rejected: {}",
                    document.document_type,
                    dto.note.clone().unwrap_or_default()
                ),
            ),
            _ => (
                "Document approved",
                format!("Your {} was approved.", document.document_type),
            ),
        };
        NotificationService::notify(
            db,
            document.user_id,
            title,
            &body,
            Some("/dashboard/documents".to_string()),
        )
        .await;
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "document_status": status.as_str(),
        "verification_status": overall.as_str(),
    }))))
}

// ============================================================================
// DOCUMENT CONFIG
// ============================================================================

#[openapi(tag = "Admin")]
#[get("/admin/document-config")]
pub async fn get_document_config(
    db: &State<DbConn>,
    _admin: AdminGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let find_options = FindOptions::builder()
        .sort(doc! { "profile_type": 1, "order": 1 })
        .build();

    let mut cursor = db.collection::<DocumentConfig>("document_configs")
        .find(doc! {}, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut configs = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let config: DocumentConfig = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        configs.push(serde_json::json!({
            "id": config.id.map(|id| id.to_hex()),
            "document_type": config.document_type,
            "label": config.label,
            "description": config.description,
            "profile_type": config.profile_type.as_str(),
            "active": config.active,
            "order": config.order,
        }));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "configs": configs
    }))))
}

/// Bulk upsert: each entry replaces the catalog row for its
/// (document_type, profile_type) pair.
#[openapi(tag = "Admin")]
#[put("/admin/document-config", data = "<dto>")]
pub async fn update_document_config(
    db: &State<DbConn>,
    _admin: AdminGuard,
    dto: Json<Vec<DocumentConfigDto>>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    for (i, entry) in dto.iter().enumerate() {
        if entry.document_type.trim().is_empty() || entry.label.trim().is_empty() {
            return Err(ApiError::bad_request("Document type and label are required"));
        }

        let order = entry.order.unwrap_or(i as i32);
        let update_options = UpdateOptions::builder().upsert(true).build();

        db.collection::<DocumentConfig>("document_configs")
            .update_one(
                doc! {
                    "document_type": entry.document_type.trim(),
                    "profile_type": entry.profile_type.as_str(),
                },
                doc! { "$set": {
                    "label": entry.label.trim(),
                    "description": entry.description.clone(),
                    "active": entry.active,
                    "order": order,
                }},
                update_options,
            )
            .await
            .map_err(|e| ApiError::internal_error(format!("Failed to update config: {}", e)))?;
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Document configuration updated",
        "count": dto.len(),
    }))))
}
