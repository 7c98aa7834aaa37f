use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime, oid::ObjectId};
use mongodb::options::{FindOneOptions, FindOptions};
use mongodb::error::ErrorKind;
use crate::db::DbConn;
use crate::models::{ChatMessage, Contact, CreateContactDto, PublicProfile, User};
use crate::guards::{AuthGuard, VerifiedGuard};
use crate::services::NotificationService;
use crate::utils::{ApiResponse, ApiError};

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match *error.kind {
        ErrorKind::Write(mongodb::error::WriteFailure::WriteError(ref e)) => e.code == 11000,
        _ => false,
    }
}

fn contact_json(contact: &Contact) -> serde_json::Value {
    serde_json::json!({
        "id": contact.id.map(|id| id.to_hex()),
        "requester_id": contact.requester_id.to_hex(),
        "counterpart_id": contact.counterpart_id.to_hex(),
        "proximity_score": contact.proximity_score,
        "created_at": contact.created_at,
        "updated_at": contact.updated_at,
    })
}

/// Turns a chosen match into a durable contact. Calling this twice for the
/// same pair, from either side, returns the same contact; "already exists"
/// is a success, not a conflict.
#[openapi(tag = "Contacts")]
#[post("/contacts", data = "<dto>")]
pub async fn create_contact(
    db: &State<DbConn>,
    guard: VerifiedGuard,
    dto: Json<CreateContactDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let auth = guard.auth;

    let counterpart_id = ObjectId::parse_str(&dto.counterpart_id)
        .map_err(|_| ApiError::bad_request("Invalid counterpart ID"))?;

    if counterpart_id == auth.user_id {
        return Err(ApiError::bad_request("You cannot open a contact with yourself"));
    }

    let counterpart = db.collection::<User>("users")
        .find_one(doc! { "_id": counterpart_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Counterpart not found"))?;

    let pair_key = Contact::pair_key(&auth.user_id, &counterpart_id);

    let existing = db.collection::<Contact>("contacts")
        .find_one(doc! { "pair_key": &pair_key }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    if let Some(contact) = existing {
        return Ok(Json(ApiResponse::success(contact_json(&contact))));
    }

    let contact = Contact {
        id: None,
        pair_key: pair_key.clone(),
        requester_id: auth.user_id,
        counterpart_id,
        proximity_score: dto.score.unwrap_or(0.0),
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let contact = match db.collection::<Contact>("contacts")
        .insert_one(&contact, None)
        .await
    {
        Ok(result) => {
            let mut contact = contact;
            contact.id = result.inserted_id.as_object_id();

            let requester = db.collection::<User>("users")
                .find_one(doc! { "_id": auth.user_id }, None)
                .await
                .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;
            let requester_name = requester
                .map(|u| u.name)
                .unwrap_or_else(|| "Someone".to_string());

            let link = contact.id.map(|id| format!("/dashboard/chat/{}", id.to_hex()));
            NotificationService::notify(
                db,
                counterpart.id.unwrap_or(counterpart_id),
                "New carpool request",
                &format!("{} wants to share the route with you!", requester_name),
                link,
            )
            .await;

            contact
        }
        // Lost the race against the other side of the pair; the unique
        // index on pair_key guarantees the winner is the one to reuse.
        Err(e) if is_duplicate_key(&e) => db
            .collection::<Contact>("contacts")
            .find_one(doc! { "pair_key": &pair_key }, None)
            .await
            .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
            .ok_or_else(|| ApiError::internal_error("Contact disappeared after insert race"))?,
        Err(e) => {
            return Err(ApiError::internal_error(format!("Failed to create contact: {}", e)));
        }
    };

    Ok(Json(ApiResponse::success(contact_json(&contact))))
}

/// Conversation list: every contact the caller is part of, most recently
/// active first, with the counterpart's public profile and the last message.
#[openapi(tag = "Contacts")]
#[get("/contacts")]
pub async fn list_contacts(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let find_options = FindOptions::builder()
        .sort(doc! { "updated_at": -1 })
        .build();

    let mut cursor = db.collection::<Contact>("contacts")
        .find(
            doc! { "$or": [
                { "requester_id": auth.user_id },
                { "counterpart_id": auth.user_id },
            ]},
            find_options,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut contacts = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let contact: Contact = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        contacts.push(contact);
    }

    let mut conversations = Vec::new();
    for contact in &contacts {
        let other_id = contact.other_party(&auth.user_id);

        let other_user = db.collection::<User>("users")
            .find_one(doc! { "_id": other_id }, None)
            .await
            .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

        let last_message = db.collection::<ChatMessage>("messages")
            .find_one(
                doc! { "contact_id": contact.id },
                FindOneOptions::builder()
                    .sort(doc! { "created_at": -1 })
                    .build(),
            )
            .await
            .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

        conversations.push(serde_json::json!({
            "id": contact.id.map(|id| id.to_hex()),
            "otherUser": other_user.as_ref().map(PublicProfile::from),
            "lastMessage": last_message.map(|m| serde_json::json!({
                "content": m.content,
                "sender_id": m.sender_id.to_hex(),
                "created_at": m.created_at,
            })),
            "updatedAt": contact.updated_at,
        }));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "conversations": conversations
    }))))
}

#[openapi(tag = "Contacts")]
#[get("/contacts/<contact_id>")]
pub async fn get_contact(
    db: &State<DbConn>,
    auth: AuthGuard,
    contact_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&contact_id)
        .map_err(|_| ApiError::bad_request("Invalid contact ID"))?;

    let contact = db.collection::<Contact>("contacts")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Contact not found"))?;

    if !contact.involves(&auth.user_id) {
        return Err(ApiError::forbidden("You are not part of this contact"));
    }

    let other_id = contact.other_party(&auth.user_id);
    let other_user = db.collection::<User>("users")
        .find_one(doc! { "_id": other_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut body = contact_json(&contact);
    body["otherUser"] = serde_json::json!(other_user.as_ref().map(PublicProfile::from));

    Ok(Json(ApiResponse::success(body)))
}
