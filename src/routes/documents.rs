use rocket::serde::json::Json;
use rocket::fs::TempFile;
use rocket::State;
use rocket_okapi::openapi;
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use mongodb::bson::{doc, DateTime};
use mongodb::options::FindOptions;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;
use crate::db::DbConn;
use crate::models::{Document, DocumentStatus, ProfileType, RequirementResponse, User};
use crate::guards::AuthGuard;
use crate::utils::{ApiResponse, ApiError};
use crate::verification;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn get_extension_from_filename(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

fn is_valid_document_extension(ext: &str) -> bool {
    matches!(ext, "pdf" | "jpg" | "jpeg" | "png")
}

fn get_extension_from_mime(mime_type: &str) -> Option<String> {
    match mime_type {
        "image/jpeg" | "image/jpg" => Some("jpg".to_string()),
        "image/png" => Some("png".to_string()),
        "application/pdf" => Some("pdf".to_string()),
        _ => None,
    }
}

fn parse_expiry(raw: &Option<String>) -> Result<Option<DateTime>, ApiError> {
    match raw {
        None => Ok(None),
        Some(value) => {
            let date = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| ApiError::bad_request("Invalid expiry date. Use YYYY-MM-DD"))?;
            let midnight = date
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| ApiError::bad_request("Invalid expiry date"))?;
            Ok(Some(DateTime::from_millis(
                midnight.and_utc().timestamp_millis(),
            )))
        }
    }
}

async fn insert_submission(
    db: &DbConn,
    auth: &AuthGuard,
    document_type: &str,
    file_url: String,
    document_number: Option<String>,
    expires_at: Option<DateTime>,
) -> Result<Document, ApiError> {
    if document_type.trim().is_empty() {
        return Err(ApiError::bad_request("Document type is required"));
    }

    let user = db.collection::<User>("users")
        .find_one(doc! { "_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let document = Document {
        id: None,
        user_id: auth.user_id,
        document_type: document_type.trim().to_string(),
        file_url,
        document_number,
        expires_at,
        status: DocumentStatus::Pending,
        reviewer_note: None,
        reviewed_by: None,
        reviewed_at: None,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = db.collection::<Document>("documents")
        .insert_one(&document, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to submit document: {}", e)))?;

    // A fresh submission always reopens review for rejected accounts.
    verification::reopen_if_rejected(db, &user)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to reopen review: {}", e)))?;

    let mut document = document;
    document.id = result.inserted_id.as_object_id();
    Ok(document)
}

// ============================================================================
// UPLOAD + SUBMISSION ENDPOINTS
// ============================================================================

#[openapi(skip)]
#[post("/documents/upload", data = "<file>")]
pub async fn upload_document(
    mut file: TempFile<'_>,
    _auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let extension = file
        .name()
        .and_then(get_extension_from_filename)
        .or_else(|| {
            file.content_type()
                .and_then(|ct| get_extension_from_mime(&ct.to_string()))
        })
        .ok_or_else(|| ApiError::bad_request("Cannot determine file type"))?;

    if !is_valid_document_extension(&extension) {
        return Err(ApiError::bad_request(format!(
            "Only PDF, JPEG, and PNG files are allowed. Received: '{}'",
            extension
        )));
    }

    let upload_dir = "uploads/documents";
    fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create directory: {}", e)))?;

    let filename = format!(
        "{}_{}.{}",
        Uuid::new_v4(),
        chrono::Utc::now().timestamp(),
        extension
    );
    let filepath = format!("{}/{}", upload_dir, filename);

    file.persist_to(&filepath)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to save file: {}", e)))?;

    info!("Stored document upload at {}", filepath);

    Ok(Json(ApiResponse::success(serde_json::json!({
        "url": format!("/{}", filepath),
        "filename": filename,
        "message": "Document uploaded successfully"
    }))))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SubmitDocumentDto {
    pub document_type: String,
    pub file_url: String,
    pub document_number: Option<String>,
    pub expires_at: Option<String>, // YYYY-MM-DD
}

#[openapi(tag = "Documents")]
#[post("/documents", data = "<dto>")]
pub async fn submit_document(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<SubmitDocumentDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if dto.file_url.trim().is_empty() {
        return Err(ApiError::bad_request("File URL is required"));
    }

    let expires_at = parse_expiry(&dto.expires_at)?;
    let document = insert_submission(
        db,
        &auth,
        &dto.document_type,
        dto.file_url.clone(),
        dto.document_number.clone(),
        expires_at,
    )
    .await?;

    Ok(Json(ApiResponse::success_with_message(
        "Document submitted for review".to_string(),
        serde_json::json!({
            "document_id": document.id.map(|id| id.to_hex())
        }),
    )))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct Base64DocumentDto {
    pub filename: String,
    pub mime_type: String,
    pub data: String,
    pub document_type: String,
    pub document_number: Option<String>,
    pub expires_at: Option<String>, // YYYY-MM-DD
}

#[openapi(tag = "Documents")]
#[post("/documents/base64", data = "<dto>")]
pub async fn submit_document_base64(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<Base64DocumentDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let extension = get_extension_from_mime(&dto.mime_type).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Invalid MIME type: {}. Allowed: image/jpeg, image/png, application/pdf",
            dto.mime_type
        ))
    })?;

    use data_encoding::BASE64;

    let file_data = BASE64
        .decode(dto.data.as_bytes())
        .map_err(|_| ApiError::bad_request("Invalid base64 data"))?;

    // Max 10MB
    if file_data.len() > 10 * 1024 * 1024 {
        return Err(ApiError::bad_request("File size exceeds 10MB limit"));
    }

    let upload_dir = "uploads/documents";
    fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create directory: {}", e)))?;

    let filename = format!(
        "{}_{}.{}",
        Uuid::new_v4(),
        chrono::Utc::now().timestamp(),
        extension
    );
    let filepath = format!("{}/{}", upload_dir, filename);

    fs::write(&filepath, &file_data)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to save file: {}", e)))?;

    let expires_at = parse_expiry(&dto.expires_at)?;
    let document = insert_submission(
        db,
        &auth,
        &dto.document_type,
        format!("/{}", filepath),
        dto.document_number.clone(),
        expires_at,
    )
    .await?;

    Ok(Json(ApiResponse::success_with_message(
        "Document submitted for review".to_string(),
        serde_json::json!({
            "document_id": document.id.map(|id| id.to_hex()),
            "url": document.file_url,
        }),
    )))
}

// ============================================================================
// LISTING + CATALOG ENDPOINTS
// ============================================================================

#[openapi(tag = "Documents")]
#[get("/documents/mine")]
pub async fn my_documents(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db.collection::<Document>("documents")
        .find(doc! { "user_id": auth.user_id }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut documents = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let document: Document = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        documents.push(serde_json::json!({
            "id": document.id.map(|id| id.to_hex()),
            "document_type": document.document_type,
            "file_url": document.file_url,
            "status": document.status.as_str(),
            "reviewer_note": document.reviewer_note,
            "created_at": document.created_at,
            "reviewed_at": document.reviewed_at,
        }));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "documents": documents
    }))))
}

/// The document types the caller still needs to know about, in display
/// order. Admins upload nothing.
#[openapi(tag = "Documents")]
#[get("/documents/config")]
pub async fn document_config(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<Vec<RequirementResponse>>>, ApiError> {
    let user = db.collection::<User>("users")
        .find_one(doc! { "_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if user.profile_type == ProfileType::Admin {
        return Ok(Json(ApiResponse::success(Vec::new())));
    }

    let requirements = verification::active_requirements(db, &user.profile_type)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    Ok(Json(ApiResponse::success(
        requirements.into_iter().map(RequirementResponse::from).collect(),
    )))
}
