use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;

const MAPBOX_BASE: &str = "https://api.mapbox.com/directions/v5/mapbox/driving";

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    geometry: String,
}

/// Fetches a display polyline from the Mapbox Directions API. The matcher
/// never looks at this data; callers treat failures as "no polyline".
pub struct MapboxService;

impl MapboxService {
    fn client() -> Client {
        Client::new()
    }

    fn access_token() -> Result<String, String> {
        Config::mapbox_access_token()
            .ok_or_else(|| "MAPBOX_ACCESS_TOKEN not configured".to_string())
    }

    pub async fn fetch_polyline(
        origin_lat: f64,
        origin_lng: f64,
        dest_lat: f64,
        dest_lng: f64,
    ) -> Result<String, String> {
        if !Config::is_mapbox_enabled() {
            return Err("Mapbox is not enabled".to_string());
        }

        let url = format!(
            "{}/{},{};{},{}?overview=full&access_token={}",
            MAPBOX_BASE,
            origin_lng,
            origin_lat,
            dest_lng,
            dest_lat,
            Self::access_token()?
        );

        let res = Self::client()
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Mapbox request failed: {}", e))?;

        if !res.status().is_success() {
            return Err(res.text().await.unwrap_or_else(|_| "Mapbox error".to_string()));
        }

        let directions: DirectionsResponse = res
            .json()
            .await
            .map_err(|e| format!("Mapbox response parse failed: {}", e))?;

        directions
            .routes
            .into_iter()
            .next()
            .map(|route| route.geometry)
            .ok_or_else(|| "Mapbox returned no routes".to_string())
    }
}
