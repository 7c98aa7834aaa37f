pub mod auth;
pub mod admin;
pub mod verified;

pub use auth::AuthGuard;
pub use admin::AdminGuard;
pub use verified::VerifiedGuard;
