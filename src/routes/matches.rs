use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, oid::ObjectId};
use std::collections::HashMap;
use crate::db::DbConn;
use crate::matching::{rank_candidates, CandidateRoute, RouteGeometry};
use crate::models::{PublicProfile, Route, User};
use crate::guards::VerifiedGuard;
use crate::utils::{ApiResponse, ApiError};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Runs the matcher for one of the caller's routes against the verified
/// pool of the complementary role.
#[openapi(tag = "Matches")]
#[get("/matches/route/<route_id>")]
pub async fn find_matches(
    db: &State<DbConn>,
    guard: VerifiedGuard,
    route_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let auth = guard.auth;

    let object_id = ObjectId::parse_str(&route_id)
        .map_err(|_| ApiError::bad_request("Invalid route ID"))?;

    let route = db.collection::<Route>("routes")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Route not found"))?;

    if route.user_id != auth.user_id {
        return Err(ApiError::forbidden("You can only match against your own routes"));
    }

    let reference = RouteGeometry::try_from_route(&route)
        .map_err(|e| ApiError::bad_request(e))?;

    let me = db.collection::<User>("users")
        .find_one(doc! { "_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let counterpart_role = me.profile_type.counterpart()
        .ok_or_else(|| ApiError::forbidden("Administrators do not participate in matching"))?;

    // Verified counterparts only; the requester can never be one of them,
    // but the exclusion stays explicit.
    let mut cursor = db.collection::<User>("users")
        .find(
            doc! {
                "_id": { "$ne": auth.user_id },
                "profile_type": counterpart_role.as_str(),
                "verification_status": "verified",
            },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut owners: HashMap<ObjectId, PublicProfile> = HashMap::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let user: User = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        if let Some(id) = user.id {
            owners.insert(id, PublicProfile::from(&user));
        }
    }

    let owner_ids: Vec<ObjectId> = owners.keys().copied().collect();

    let mut cursor = db.collection::<Route>("routes")
        .find(doc! { "user_id": { "$in": owner_ids } }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut pool = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let candidate: Route = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;

        let Some(candidate_id) = candidate.id else { continue };
        let Some(owner) = owners.get(&candidate.user_id) else { continue };

        // Stored routes with broken geometry can't be scored; skip them
        // instead of poisoning the ranking with NaN.
        match RouteGeometry::try_from_route(&candidate) {
            Ok(geometry) => pool.push(CandidateRoute {
                route_id: candidate_id,
                geometry,
                owner: owner.clone(),
            }),
            Err(e) => {
                warn!("Skipping route {} from matching: {}", candidate_id.to_hex(), e);
            }
        }
    }

    let ranked = rank_candidates(&reference, &pool);

    let matches: Vec<serde_json::Value> = ranked
        .iter()
        .map(|m| {
            serde_json::json!({
                "counterpart": m.counterpart,
                "routeId": m.route_id.to_hex(),
                "score": m.score,
                "originDistanceKm": round2(m.origin_distance_km),
                "destDistanceKm": round2(m.dest_distance_km),
                "departureDeltaMinutes": m.departure_delta_minutes,
                "returnDeltaMinutes": m.return_delta_minutes,
            })
        })
        .collect();

    Ok(Json(ApiResponse::success(serde_json::json!({
        "matches": matches
    }))))
}
