pub mod auth;
pub mod user;
pub mod route;
pub mod matches;
pub mod contacts;
pub mod chat;
pub mod documents;
pub mod notifications;
pub mod admin;
