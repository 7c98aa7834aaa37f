use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime, oid::ObjectId};
use crate::db::DbConn;
use crate::models::{
    LoginDto, ProfileType, RegisterDto, User, UserResponse, VerificationStatus,
};
use crate::services::JwtService;
use crate::utils::{validate_email, ApiResponse, ApiError};

const LOGIN_WINDOW_MS: i64 = 10 * 60 * 1000;
const LOGIN_LIMIT: i32 = 10;
const REFRESH_LIMIT: i32 = 10;
const REFRESH_WINDOW_MS: i64 = 60 * 1000;

/// --------------------
/// Rate limiter helper
/// --------------------
async fn rate_limit(
    db: &DbConn,
    key: &str,
    limit: i32,
    window_ms: i64,
) -> Result<(), ApiError> {
    let now = chrono::Utc::now().timestamp_millis();
    let window_expires = DateTime::from_millis(now + window_ms);

    let collection = db.collection::<mongodb::bson::Document>("rate_limits");

    let doc = collection
        .find_one(doc! { "key": key }, None)
        .await
        .map_err(|_| ApiError::internal_error("Rate limiter lookup failed"))?;

    match doc {
        // First request OR expired window
        None => {
            collection
                .insert_one(
                    doc! {
                        "key": key,
                        "count": 1,
                        "expires_at": window_expires
                    },
                    None,
                )
                .await
                .map_err(|_| ApiError::internal_error("Rate limiter insert failed"))?;
            Ok(())
        }

        Some(d) => {
            let count = d.get_i32("count").unwrap_or(0);
            let expires_at = d.get_datetime("expires_at").ok();

            // Window expired → reset
            if expires_at.map(|e| *e < DateTime::now()).unwrap_or(true) {
                collection
                    .update_one(
                        doc! { "key": key },
                        doc! {
                            "$set": {
                                "count": 1,
                                "expires_at": window_expires
                            }
                        },
                        None,
                    )
                    .await
                    .map_err(|_| ApiError::internal_error("Rate limiter reset failed"))?;
                return Ok(());
            }

            // Limit exceeded
            if count >= limit {
                return Err(ApiError::too_many_requests(
                    "Too many requests. Please try later.",
                ));
            }

            // Increment count
            collection
                .update_one(
                    doc! { "key": key },
                    doc! { "$inc": { "count": 1 } },
                    None,
                )
                .await
                .map_err(|_| ApiError::internal_error("Rate limiter increment failed"))?;

            Ok(())
        }
    }
}

/// --------------------
/// Register
/// --------------------
#[openapi(tag = "Auth")]
#[post("/auth/register", data = "<dto>")]
pub async fn register(
    db: &State<DbConn>,
    dto: Json<RegisterDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if dto.name.trim().is_empty() || dto.password.is_empty() {
        return Err(ApiError::bad_request("Name and password are required"));
    }
    if !validate_email(&dto.email) {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    if dto.profile_type == ProfileType::Admin {
        return Err(ApiError::bad_request(
            "Administrator accounts cannot be self-registered",
        ));
    }

    let existing = db
        .collection::<User>("users")
        .find_one(doc! { "email": &dto.email }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    if existing.is_some() {
        return Err(ApiError::conflict("A user with this email already exists"));
    }

    let password_hash = bcrypt::hash(&dto.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::internal_error(format!("Hashing error: {}", e)))?;

    let user = User {
        id: None,
        name: dto.name.trim().to_string(),
        email: dto.email.clone(),
        password_hash,
        profile_type: dto.profile_type.clone(),
        verification_status: VerificationStatus::Pending,
        profile_photo: None,
        is_active: true,
        last_login_at: DateTime::now(),
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = db
        .collection::<User>("users")
        .insert_one(&user, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to register: {}", e)))?;

    let mut user = user;
    user.id = result.inserted_id.as_object_id();

    Ok(Json(ApiResponse::success_with_message(
        "Registration successful".to_string(),
        serde_json::json!({ "user": UserResponse::from(user) }),
    )))
}

/// --------------------
/// Login
/// --------------------
#[openapi(tag = "Auth")]
#[post("/auth/login", data = "<dto>")]
pub async fn login(
    db: &State<DbConn>,
    dto: Json<LoginDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    rate_limit(
        db,
        &format!("login:{}", dto.email),
        LOGIN_LIMIT,
        LOGIN_WINDOW_MS,
    ).await?;

    let user = db
        .collection::<User>("users")
        .find_one(doc! { "email": &dto.email }, None)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let password_ok = bcrypt::verify(&dto.password, &user.password_hash)
        .map_err(|e| ApiError::internal_error(format!("Hashing error: {}", e)))?;
    if !password_ok {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    if !user.is_active {
        return Err(ApiError::forbidden("Account is deactivated"));
    }

    db.collection::<User>("users")
        .update_one(
            doc! { "_id": user.id },
            doc! { "$set": { "last_login_at": DateTime::now() } },
            None,
        ).await.ok();

    let user_id = user.id
        .ok_or_else(|| ApiError::internal_error("User record has no id"))?;

    let access_token = JwtService::generate_access_token(&user_id, &user.email)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let refresh_token = JwtService::generate_refresh_token(&user_id, &user.email)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Login successful",
        "user": UserResponse::from(user),
        "accessToken": access_token,
        "refreshToken": refresh_token
    }))))
}

/// --------------------
/// Silent Refresh Token
/// --------------------
#[derive(serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct RefreshTokenDto {
    pub refresh_token: String,
}

#[openapi(tag = "Auth")]
#[post("/auth/refresh", data = "<dto>")]
pub async fn refresh_token(
    db: &State<DbConn>,
    dto: Json<RefreshTokenDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    rate_limit(
        db,
        "refresh_token",
        REFRESH_LIMIT,
        REFRESH_WINDOW_MS,
    ).await?;

    let claims = JwtService::verify_token(&dto.refresh_token, true)
        .map_err(|_| ApiError::unauthorized("Invalid refresh token"))?;

    let user_id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::unauthorized("Invalid user id in token"))?;

    let access = JwtService::generate_access_token(&user_id, &claims.email)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "accessToken": access
    }))))
}
