use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::FindOptions;
use crate::db::DbConn;
use crate::models::{MarkReadDto, Notification};
use crate::guards::AuthGuard;
use crate::utils::{ApiResponse, ApiError};

#[openapi(tag = "Notifications")]
#[get("/notifications")]
pub async fn list_notifications(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .limit(20)
        .build();

    let mut cursor = db.collection::<Notification>("notifications")
        .find(doc! { "user_id": auth.user_id }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut notifications = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let notification: Notification = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        notifications.push(serde_json::json!({
            "id": notification.id.map(|id| id.to_hex()),
            "title": notification.title,
            "body": notification.body,
            "link": notification.link,
            "read": notification.read,
            "created_at": notification.created_at,
        }));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "notifications": notifications
    }))))
}

#[openapi(tag = "Notifications")]
#[patch("/notifications", data = "<dto>")]
pub async fn mark_read(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<MarkReadDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    match dto.id {
        Some(ref id) => {
            let object_id = ObjectId::parse_str(id)
                .map_err(|_| ApiError::bad_request("Invalid notification ID"))?;

            let result = db.collection::<Notification>("notifications")
                .update_one(
                    doc! { "_id": object_id, "user_id": auth.user_id },
                    doc! { "$set": { "read": true } },
                    None,
                )
                .await
                .map_err(|e| ApiError::internal_error(format!("Failed to update notification: {}", e)))?;

            if result.matched_count == 0 {
                return Err(ApiError::not_found("Notification not found"));
            }
        }
        None => {
            db.collection::<Notification>("notifications")
                .update_many(
                    doc! { "user_id": auth.user_id, "read": false },
                    doc! { "$set": { "read": true } },
                    None,
                )
                .await
                .map_err(|e| ApiError::internal_error(format!("Failed to update notifications: {}", e)))?;
        }
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Notifications updated"
    }))))
}
