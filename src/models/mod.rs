pub mod user;
pub mod route;
pub mod document;
pub mod document_config;
pub mod contact;
pub mod chat;
pub mod notification;
pub mod admin_log;

pub use user::*;
pub use route::*;
pub use document::*;
pub use document_config::*;
pub use contact::*;
pub use chat::*;
pub use notification::*;
pub use admin_log::*;
