//! Address geocoding.
//!
//! The dispatcher only needs "address in, coordinates out", so geocoding
//! sits behind the [`Geocoder`] trait. [`GoogleGeocoder`] is the production
//! implementation; tests substitute their own.

use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use karte_types::GeocodeResult;
use serde_json::Value;
use tracing::warn;

/// Google Geocoding API endpoint.
pub const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Per-request timeout for geocoding calls.
const GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);

/// Translates a free-text address into coordinates.
///
/// Every failure is a miss: implementations log and return `None`.
pub trait Geocoder: Send + Sync {
    /// Look up `address`.
    fn geocode<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Option<GeocodeResult>>;
}

/// Geocoder backed by the Google Geocoding API.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleGeocoder {
    /// Create a geocoder for the given API key.
    pub fn new(api_key: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(GEOCODE_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            endpoint: GOOGLE_GEOCODE_URL.to_owned(),
        })
    }

    /// Point the geocoder at a different endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        endpoint.clone_into(&mut self.endpoint);
        self
    }

    async fn lookup(&self, address: &str) -> Option<GeocodeResult> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await;

        let json: Value = match response {
            Ok(response) => match response.json().await {
                Ok(json) => json,
                Err(e) => {
                    warn!(address, error = %e, "geocoding response was not JSON");
                    return None;
                }
            },
            Err(e) => {
                warn!(address, error = %e, "geocoding request failed");
                return None;
            }
        };

        match extract_geocode_result(&json, address) {
            Ok(result) => Some(result),
            Err(reason) => {
                warn!(address, reason = %reason, "geocoding failed");
                None
            }
        }
    }
}

impl Geocoder for GoogleGeocoder {
    fn geocode<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Option<GeocodeResult>> {
        self.lookup(address).boxed()
    }
}

/// Read the first result out of a Geocoding API response.
///
/// `formatted_address` falls back to the queried address. The error is the
/// reason for the miss, for logging.
pub fn extract_geocode_result(json: &Value, address: &str) -> Result<GeocodeResult, String> {
    let status = json.get("status").and_then(Value::as_str).unwrap_or("MISSING");
    if status != "OK" {
        return Err(format!("status {status}"));
    }
    let first = json
        .get("results")
        .and_then(|r| r.get(0))
        .ok_or_else(|| "no results".to_owned())?;
    let location = first
        .get("geometry")
        .and_then(|g| g.get("location"))
        .ok_or_else(|| "result has no geometry.location".to_owned())?;
    let lat = location.get("lat").and_then(Value::as_f64);
    let lng = location.get("lng").and_then(Value::as_f64);
    let (Some(lat), Some(lng)) = (lat, lng) else {
        return Err("location is missing lat/lng".to_owned());
    };
    let formatted_address = first
        .get("formatted_address")
        .and_then(Value::as_str)
        .unwrap_or(address)
        .to_owned();
    Ok(GeocodeResult {
        lat,
        lng,
        formatted_address,
    })
}
