use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime, oid::ObjectId};
use mongodb::options::FindOptions;
use crate::db::DbConn;
use crate::models::{ChatMessage, Contact, SendMessageDto, User};
use crate::guards::AuthGuard;
use crate::services::NotificationService;
use crate::utils::{ApiResponse, ApiError};

async fn load_contact_for(
    db: &DbConn,
    contact_id: &str,
    user_id: &ObjectId,
) -> Result<Contact, ApiError> {
    let object_id = ObjectId::parse_str(contact_id)
        .map_err(|_| ApiError::bad_request("Invalid contact ID"))?;

    let contact = db.collection::<Contact>("contacts")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Contact not found"))?;

    if !contact.involves(user_id) {
        return Err(ApiError::forbidden("You are not part of this contact"));
    }

    Ok(contact)
}

#[openapi(tag = "Chat")]
#[get("/contacts/<contact_id>/chat")]
pub async fn get_messages(
    db: &State<DbConn>,
    auth: AuthGuard,
    contact_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let contact = load_contact_for(db, &contact_id, &auth.user_id).await?;

    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": 1 })
        .build();

    let mut cursor = db.collection::<ChatMessage>("messages")
        .find(doc! { "contact_id": contact.id }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut messages = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let message: ChatMessage = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        messages.push(serde_json::json!({
            "id": message.id.map(|id| id.to_hex()),
            "sender_id": message.sender_id.to_hex(),
            "content": message.content,
            "created_at": message.created_at,
        }));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "messages": messages
    }))))
}

#[openapi(tag = "Chat")]
#[post("/contacts/<contact_id>/chat", data = "<dto>")]
pub async fn send_message(
    db: &State<DbConn>,
    auth: AuthGuard,
    contact_id: String,
    dto: Json<SendMessageDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if dto.content.trim().is_empty() {
        return Err(ApiError::bad_request("Message content cannot be empty"));
    }

    let contact = load_contact_for(db, &contact_id, &auth.user_id).await?;

    let message = ChatMessage {
        id: None,
        contact_id: contact.id
            .ok_or_else(|| ApiError::internal_error("Contact record has no id"))?,
        sender_id: auth.user_id,
        content: dto.content.trim().to_string(),
        created_at: DateTime::now(),
    };

    let result = db.collection::<ChatMessage>("messages")
        .insert_one(&message, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to send message: {}", e)))?;

    // Bump the conversation to the top of the list
    db.collection::<Contact>("contacts")
        .update_one(
            doc! { "_id": contact.id },
            doc! { "$set": { "updated_at": DateTime::now() } },
            None,
        )
        .await
        .ok();

    let sender = db.collection::<User>("users")
        .find_one(doc! { "_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;
    let sender_name = sender.map(|u| u.name).unwrap_or_else(|| "Someone".to_string());

    let recipient = contact.other_party(&auth.user_id);
    NotificationService::notify(
        db,
        recipient,
        "New message",
        &format!("{} sent you a message.", sender_name),
        Some(format!("/dashboard/chat/{}", contact_id)),
    )
    .await;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "id": result.inserted_id.as_object_id().map(|id| id.to_hex()),
        "sender_id": message.sender_id.to_hex(),
        "content": message.content,
        "created_at": message.created_at,
    }))))
}
