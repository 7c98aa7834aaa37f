use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;

/// A user's declared commute: origin/destination coordinates plus the
/// departure and return times of day. The polyline is display-only data
/// from the directions API and is never inspected by the matcher.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Route {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub name: Option<String>,
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub dest_lat: f64,
    pub dest_lng: f64,
    pub departure_time: String,
    pub return_time: String,
    pub polyline: Option<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateRouteDto {
    pub name: Option<String>,
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub dest_lat: f64,
    pub dest_lng: f64,
    pub departure_time: String,
    pub return_time: String,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub id: String,
    pub name: Option<String>,
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub dest_lat: f64,
    pub dest_lng: f64,
    pub departure_time: String,
    pub return_time: String,
    pub polyline: Option<String>,
    pub created_at: DateTime,
}

impl From<Route> for RouteResponse {
    fn from(route: Route) -> Self {
        RouteResponse {
            id: route.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: route.name,
            origin_lat: route.origin_lat,
            origin_lng: route.origin_lng,
            dest_lat: route.dest_lat,
            dest_lng: route.dest_lng,
            departure_time: route.departure_time,
            return_time: route.return_time,
            polyline: route.polyline,
            created_at: route.created_at,
        }
    }
}
