pub mod geo;
pub mod matcher;

pub use geo::{haversine_distance_km, time_of_day_delta_minutes, TimeOfDay};
pub use matcher::{rank_candidates, CandidateRoute, MatchCandidate, RouteGeometry};
