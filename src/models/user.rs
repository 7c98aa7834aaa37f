use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProfileType {
    Passenger,
    Driver,
    Admin,
}

impl ProfileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileType::Passenger => "passenger",
            ProfileType::Driver => "driver",
            ProfileType::Admin => "admin",
        }
    }

    /// The role a user of this role gets matched against. Admins never match.
    pub fn counterpart(&self) -> Option<ProfileType> {
        match self {
            ProfileType::Passenger => Some(ProfileType::Driver),
            ProfileType::Driver => Some(ProfileType::Passenger),
            ProfileType::Admin => None,
        }
    }
}

/// Aggregate trust state derived from document reviews. Recomputed only by
/// the verification engine; every other code path treats it as read-only.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub profile_type: ProfileType,
    pub verification_status: VerificationStatus,
    pub profile_photo: Option<String>,
    pub is_active: bool,
    pub last_login_at: DateTime,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RegisterDto {
    pub name: String,
    pub email: String,
    pub password: String,
    pub profile_type: ProfileType,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LoginDto {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateProfileDto {
    pub name: Option<String>,
    pub profile_photo: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub profile_type: String,
    pub verification_status: String,
    pub profile_photo: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name,
            email: user.email,
            profile_type: user.profile_type.as_str().to_string(),
            verification_status: user.verification_status.as_str().to_string(),
            profile_photo: user.profile_photo,
        }
    }
}

/// What other users are allowed to see about a user (match results, chat).
#[derive(Debug, Serialize, Clone, JsonSchema)]
pub struct PublicProfile {
    pub id: String,
    pub name: String,
    pub profile_type: String,
    pub verification_status: String,
    pub profile_photo: Option<String>,
}

impl From<&User> for PublicProfile {
    fn from(user: &User) -> Self {
        PublicProfile {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name.clone(),
            profile_type: user.profile_type.as_str().to_string(),
            verification_status: user.verification_status.as_str().to_string(),
            profile_photo: user.profile_photo.clone(),
        }
    }
}
