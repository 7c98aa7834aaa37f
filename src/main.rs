#[macro_use]
extern crate rocket;
#[macro_use]
extern crate log;

mod config;
mod db;
mod guards;
mod matching;
mod models;
mod routes;
mod services;
mod utils;
mod verification;

use dotenvy::dotenv;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::Header;
use rocket::{Build, Request, Response, Rocket};
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};

/* ----------------------------- CORS ----------------------------- */

pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if let Some(origin) = request.headers().get_one("Origin") {
            response.set_header(Header::new("Access-Control-Allow-Origin", origin));
        }

        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, PATCH, DELETE, OPTIONS",
        ));

        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));

        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

/* ----------------------------- OPTIONS ----------------------------- */

#[options("/<_..>")]
fn options_handler() {}

/* ----------------------------- ERRORS ----------------------------- */

#[catch(404)]
fn not_found() -> rocket::serde::json::Value {
    rocket::serde::json::json!({
        "success": false,
        "message": "Resource not found (check /api/v1 prefix)"
    })
}

#[catch(500)]
fn internal_error() -> rocket::serde::json::Value {
    rocket::serde::json::json!({
        "success": false,
        "message": "Internal server error"
    })
}

/* ----------------------------- SWAGGER ----------------------------- */

fn swagger_config() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/openapi.json".to_string(),
        ..Default::default()
    }
}

/* ----------------------------- LAUNCH ----------------------------- */

#[launch]
fn rocket() -> Rocket<Build> {
    dotenv().ok();
    env_logger::init();

    info!("🚗 MomCar API running");
    info!("📚 Swagger UI → http://localhost:8000/api/docs");

    rocket::build()
        .attach(db::init())
        .attach(CORS)
        .mount("/", routes![options_handler])
        .mount(
            "/api/v1",
            routes![
                // Auth
                routes::auth::register,
                routes::auth::login,
                routes::auth::refresh_token,
                // User
                routes::user::get_profile,
                routes::user::update_profile,
                // Routes
                routes::route::create_route,
                routes::route::get_my_routes,
                routes::route::delete_route,
                // Matching
                routes::matches::find_matches,
                // Contacts + Chat
                routes::contacts::create_contact,
                routes::contacts::list_contacts,
                routes::contacts::get_contact,
                routes::chat::get_messages,
                routes::chat::send_message,
                // Documents
                routes::documents::upload_document,
                routes::documents::submit_document,
                routes::documents::submit_document_base64,
                routes::documents::my_documents,
                routes::documents::document_config,
                // Notifications
                routes::notifications::list_notifications,
                routes::notifications::mark_read,
                // Admin
                routes::admin::get_all_users,
                routes::admin::pending_documents,
                routes::admin::review_document,
                routes::admin::get_document_config,
                routes::admin::update_document_config,
            ],
        )
        .mount("/uploads", FileServer::from("uploads"))
        .mount("/api/docs", make_swagger_ui(&swagger_config()))
        .register("/", catchers![not_found, internal_error])
}
