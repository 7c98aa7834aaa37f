//! Geographic/temporal compatibility between a reference route and a pool
//! of candidate routes.

use mongodb::bson::oid::ObjectId;

use crate::models::{PublicProfile, Route};
use crate::utils::validate_coordinates;

use super::geo::{haversine_distance_km, time_of_day_delta_minutes, TimeOfDay};

pub const MAX_DISTANCE_KM: f64 = 5.0;
pub const MAX_TIME_DELTA_MINUTES: i64 = 30;

/// Validated matching view of a route. Building one rejects non-finite or
/// off-globe coordinates and malformed times, so the scoring below never
/// sees NaN.
#[derive(Debug, Clone)]
pub struct RouteGeometry {
    pub owner_id: ObjectId,
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub dest_lat: f64,
    pub dest_lng: f64,
    pub departure: TimeOfDay,
    pub return_time: TimeOfDay,
}

impl RouteGeometry {
    pub fn try_from_route(route: &Route) -> Result<RouteGeometry, String> {
        if !validate_coordinates(route.origin_lat, route.origin_lng)
            || !validate_coordinates(route.dest_lat, route.dest_lng)
        {
            return Err("Route has invalid coordinates".to_string());
        }

        let departure = TimeOfDay::parse(&route.departure_time)
            .ok_or_else(|| "Route has an invalid departure time".to_string())?;
        let return_time = TimeOfDay::parse(&route.return_time)
            .ok_or_else(|| "Route has an invalid return time".to_string())?;

        Ok(RouteGeometry {
            owner_id: route.user_id,
            origin_lat: route.origin_lat,
            origin_lng: route.origin_lng,
            dest_lat: route.dest_lat,
            dest_lng: route.dest_lng,
            departure,
            return_time,
        })
    }
}

/// One entry of the candidate pool: a validated route plus the public
/// identity of its owner.
#[derive(Debug, Clone)]
pub struct CandidateRoute {
    pub route_id: ObjectId,
    pub geometry: RouteGeometry,
    pub owner: PublicProfile,
}

/// One scored match. Lower score = better. The score mixes kilometers and
/// fractional hours on purpose: it is a ranking heuristic, not a physical
/// quantity, and changing the formula changes match ordering.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub counterpart: PublicProfile,
    pub route_id: ObjectId,
    pub score: f64,
    pub origin_distance_km: f64,
    pub dest_distance_km: f64,
    pub departure_delta_minutes: i64,
    pub return_delta_minutes: i64,
}

/// Filters the pool down to compatible candidates and ranks them ascending
/// by score. Callers pass a pool already restricted to verified users of the
/// complementary role with the requester excluded; candidates owned by the
/// reference owner are skipped here as well so that invariant holds even if
/// a caller slips.
pub fn rank_candidates(reference: &RouteGeometry, pool: &[CandidateRoute]) -> Vec<MatchCandidate> {
    let mut matches = Vec::new();

    for candidate in pool {
        if candidate.geometry.owner_id == reference.owner_id {
            continue;
        }

        let origin_km = haversine_distance_km(
            reference.origin_lat,
            reference.origin_lng,
            candidate.geometry.origin_lat,
            candidate.geometry.origin_lng,
        );
        let dest_km = haversine_distance_km(
            reference.dest_lat,
            reference.dest_lng,
            candidate.geometry.dest_lat,
            candidate.geometry.dest_lng,
        );
        if origin_km > MAX_DISTANCE_KM || dest_km > MAX_DISTANCE_KM {
            continue;
        }

        let departure_delta =
            time_of_day_delta_minutes(reference.departure, candidate.geometry.departure);
        let return_delta =
            time_of_day_delta_minutes(reference.return_time, candidate.geometry.return_time);
        if departure_delta > MAX_TIME_DELTA_MINUTES || return_delta > MAX_TIME_DELTA_MINUTES {
            continue;
        }

        let score = origin_km
            + dest_km
            + (departure_delta as f64 / 60.0)
            + (return_delta as f64 / 60.0);

        matches.push(MatchCandidate {
            counterpart: candidate.owner.clone(),
            route_id: candidate.route_id,
            score,
            origin_distance_km: origin_km,
            dest_distance_km: dest_km,
            departure_delta_minutes: departure_delta,
            return_delta_minutes: return_delta,
        });
    }

    // Stable sort: equal scores keep their pool order.
    matches.sort_by(|a, b| a.score.total_cmp(&b.score));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProfileType, User, VerificationStatus};
    use mongodb::bson::DateTime;

    fn test_route(owner: ObjectId, origin: (f64, f64), dest: (f64, f64), dep: &str, ret: &str) -> Route {
        Route {
            id: Some(ObjectId::new()),
            user_id: owner,
            name: None,
            origin_lat: origin.0,
            origin_lng: origin.1,
            dest_lat: dest.0,
            dest_lng: dest.1,
            departure_time: dep.to_string(),
            return_time: ret.to_string(),
            polyline: None,
            created_at: DateTime::now(),
        }
    }

    fn test_profile(name: &str) -> PublicProfile {
        let user = User {
            id: Some(ObjectId::new()),
            name: name.to_string(),
            email: format!("{}@email.com", name),
            password_hash: String::new(),
            profile_type: ProfileType::Driver,
            verification_status: VerificationStatus::Verified,
            profile_photo: None,
            is_active: true,
            last_login_at: DateTime::now(),
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        };
        PublicProfile::from(&user)
    }

    fn candidate(route: &Route, name: &str) -> CandidateRoute {
        CandidateRoute {
            route_id: route.id.unwrap(),
            geometry: RouteGeometry::try_from_route(route).unwrap(),
            owner: test_profile(name),
        }
    }

    // One degree of longitude on the equator is ~111.19 km, so shifting
    // longitude by deg_for_km(d) moves the origin d km east.
    fn deg_for_km(km: f64) -> f64 {
        km / 111.19
    }

    #[test]
    fn test_geometry_rejects_bad_input() {
        let owner = ObjectId::new();
        let r = test_route(owner, (91.0, 0.0), (1.0, 1.0), "08:00", "17:00");
        assert!(RouteGeometry::try_from_route(&r).is_err());

        let r = test_route(owner, (f64::NAN, 0.0), (1.0, 1.0), "08:00", "17:00");
        assert!(RouteGeometry::try_from_route(&r).is_err());

        let r = test_route(owner, (0.0, 0.0), (1.0, 1.0), "8am", "17:00");
        assert!(RouteGeometry::try_from_route(&r).is_err());
    }

    #[test]
    fn test_distance_threshold_is_five_km() {
        let me = ObjectId::new();
        let reference =
            RouteGeometry::try_from_route(&test_route(me, (0.0, 0.0), (1.0, 1.0), "08:00", "17:00"))
                .unwrap();

        let near = test_route(
            ObjectId::new(),
            (0.0, deg_for_km(4.99)),
            (1.0, 1.0),
            "08:00",
            "17:00",
        );
        let far = test_route(
            ObjectId::new(),
            (0.0, deg_for_km(5.01)),
            (1.0, 1.0),
            "08:00",
            "17:00",
        );

        let pool = vec![candidate(&near, "near"), candidate(&far, "far")];
        let result = rank_candidates(&reference, &pool);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].counterpart.name, "near");
    }

    #[test]
    fn test_time_threshold_is_thirty_minutes() {
        let me = ObjectId::new();
        let reference =
            RouteGeometry::try_from_route(&test_route(me, (0.0, 0.0), (1.0, 1.0), "08:00", "17:00"))
                .unwrap();

        let on_time = test_route(ObjectId::new(), (0.0, 0.0), (1.0, 1.0), "08:30", "17:00");
        let late = test_route(ObjectId::new(), (0.0, 0.0), (1.0, 1.0), "08:31", "17:00");
        let late_return = test_route(ObjectId::new(), (0.0, 0.0), (1.0, 1.0), "08:00", "17:31");

        let pool = vec![
            candidate(&on_time, "on_time"),
            candidate(&late, "late"),
            candidate(&late_return, "late_return"),
        ];
        let result = rank_candidates(&reference, &pool);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].counterpart.name, "on_time");
    }

    #[test]
    fn test_ranking_is_ascending_by_score() {
        let me = ObjectId::new();
        let reference =
            RouteGeometry::try_from_route(&test_route(me, (0.0, 0.0), (1.0, 1.0), "08:00", "17:00"))
                .unwrap();

        // Distances ~3.2, ~1.1 and ~2.0 km from the reference origin.
        let worst = test_route(ObjectId::new(), (0.0, deg_for_km(3.2)), (1.0, 1.0), "08:00", "17:00");
        let best = test_route(ObjectId::new(), (0.0, deg_for_km(1.1)), (1.0, 1.0), "08:00", "17:00");
        let middle = test_route(ObjectId::new(), (0.0, deg_for_km(2.0)), (1.0, 1.0), "08:00", "17:00");

        let pool = vec![
            candidate(&worst, "worst"),
            candidate(&best, "best"),
            candidate(&middle, "middle"),
        ];
        let result = rank_candidates(&reference, &pool);

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].counterpart.name, "best");
        assert_eq!(result[1].counterpart.name, "middle");
        assert_eq!(result[2].counterpart.name, "worst");
        assert!(result[0].score <= result[1].score && result[1].score <= result[2].score);
    }

    #[test]
    fn test_score_mixes_distance_and_time() {
        let me = ObjectId::new();
        let reference =
            RouteGeometry::try_from_route(&test_route(me, (0.0, 0.0), (1.0, 1.0), "08:00", "17:00"))
                .unwrap();

        let identical = test_route(ObjectId::new(), (0.0, 0.0), (1.0, 1.0), "08:30", "17:15");
        let pool = vec![candidate(&identical, "shifted")];
        let result = rank_candidates(&reference, &pool);

        assert_eq!(result.len(), 1);
        // 0 km + 0 km + 30/60 h + 15/60 h
        assert!((result[0].score - 0.75).abs() < 1e-9);
        assert_eq!(result[0].departure_delta_minutes, 30);
        assert_eq!(result[0].return_delta_minutes, 15);
    }

    #[test]
    fn test_own_route_is_never_returned() {
        let me = ObjectId::new();
        let my_route = test_route(me, (0.0, 0.0), (1.0, 1.0), "08:00", "17:00");
        let reference = RouteGeometry::try_from_route(&my_route).unwrap();

        // A perfectly compatible candidate that happens to be mine.
        let mine_again = test_route(me, (0.0, 0.0), (1.0, 1.0), "08:00", "17:00");
        let other = test_route(ObjectId::new(), (0.0, 0.0), (1.0, 1.0), "08:05", "17:00");

        let pool = vec![candidate(&mine_again, "me"), candidate(&other, "other")];
        let result = rank_candidates(&reference, &pool);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].counterpart.name, "other");
    }

    #[test]
    fn test_empty_pool_yields_empty_result() {
        let me = ObjectId::new();
        let reference =
            RouteGeometry::try_from_route(&test_route(me, (0.0, 0.0), (1.0, 1.0), "08:00", "17:00"))
                .unwrap();
        assert!(rank_candidates(&reference, &[]).is_empty());
    }
}
