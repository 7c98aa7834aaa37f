use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime, oid::ObjectId};
use mongodb::options::FindOptions;
use crate::db::DbConn;
use crate::models::{CreateRouteDto, Route, RouteResponse};
use crate::guards::AuthGuard;
use crate::services::MapboxService;
use crate::utils::{validate_coordinates, validate_time_of_day, ApiResponse, ApiError};

#[openapi(tag = "Routes")]
#[post("/routes", data = "<dto>")]
pub async fn create_route(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateRouteDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !validate_coordinates(dto.origin_lat, dto.origin_lng)
        || !validate_coordinates(dto.dest_lat, dto.dest_lng)
    {
        return Err(ApiError::bad_request("Invalid coordinates"));
    }
    if !validate_time_of_day(&dto.departure_time) || !validate_time_of_day(&dto.return_time) {
        return Err(ApiError::bad_request("Times must be in HH:MM format"));
    }

    // Display polyline only; the route is perfectly usable without it.
    let polyline = if crate::config::Config::is_mapbox_enabled() {
        match MapboxService::fetch_polyline(
            dto.origin_lat,
            dto.origin_lng,
            dto.dest_lat,
            dto.dest_lng,
        )
        .await
        {
            Ok(geometry) => Some(geometry),
            Err(e) => {
                warn!("Mapbox polyline unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    let route = Route {
        id: None,
        user_id: auth.user_id,
        name: dto.name.clone(),
        origin_lat: dto.origin_lat,
        origin_lng: dto.origin_lng,
        dest_lat: dto.dest_lat,
        dest_lng: dto.dest_lng,
        departure_time: dto.departure_time.clone(),
        return_time: dto.return_time.clone(),
        polyline,
        created_at: DateTime::now(),
    };

    let result = db.collection::<Route>("routes")
        .insert_one(&route, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create route: {}", e)))?;

    let mut route = route;
    route.id = result.inserted_id.as_object_id();

    Ok(Json(ApiResponse::success_with_message(
        "Route created successfully".to_string(),
        serde_json::json!({ "route": RouteResponse::from(route) }),
    )))
}

#[openapi(tag = "Routes")]
#[get("/routes")]
pub async fn get_my_routes(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db.collection::<Route>("routes")
        .find(doc! { "user_id": auth.user_id }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut routes = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let route: Route = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        routes.push(RouteResponse::from(route));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "routes": routes
    }))))
}

#[openapi(tag = "Routes")]
#[delete("/routes/<route_id>")]
pub async fn delete_route(
    db: &State<DbConn>,
    auth: AuthGuard,
    route_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&route_id)
        .map_err(|_| ApiError::bad_request("Invalid route ID"))?;

    let route = db.collection::<Route>("routes")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Route not found"))?;

    if route.user_id != auth.user_id {
        return Err(ApiError::forbidden("You can only delete your own routes"));
    }

    db.collection::<Route>("routes")
        .delete_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete route: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Route deleted successfully"
    }))))
}
