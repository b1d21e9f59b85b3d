//! Where the user is. The terminal has no permission prompt, so "denied"
//! means no position was configured or the lookup failed.
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use wayfinder_common::LatLng;
use wayfinder_http::{HttpClient, HttpError, RequestOpts};

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("no location configured (set location.lat/location.lng or pass --lat/--lng)")]
    Denied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
    #[error("location lookup failed: {0}")]
    Http(#[from] HttpError),
}

#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<LatLng, LocateError>;
}

/// A position fixed at startup. `None` behaves like a denied permission.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator(pub Option<LatLng>);

#[async_trait]
impl Geolocator for FixedLocator {
    async fn locate(&self) -> Result<LatLng, LocateError> {
        self.0.ok_or(LocateError::Denied)
    }
}

/// Approximate position from an IP geolocation endpoint.
#[derive(Clone)]
pub struct IpLocator {
    http: HttpClient,
}

impl IpLocator {
    pub fn new(endpoint: &str) -> Result<Self, HttpError> {
        Ok(Self {
            http: HttpClient::new(endpoint)?,
        })
    }
}

#[async_trait]
impl Geolocator for IpLocator {
    async fn locate(&self) -> Result<LatLng, LocateError> {
        let body: Value = self.http.get_json("", RequestOpts::default()).await?;
        let at = position_of(&body).ok_or_else(|| {
            LocateError::Unavailable(format!("no coordinates in response from {}", self.http.base()))
        })?;
        tracing::debug!(lat = at.lat, lng = at.lng, "locate.ip.fix");
        Ok(at)
    }
}

/// `latitude`/`longitude` (ipapi style) or `lat`/`lon` (ip-api style).
fn position_of(body: &Value) -> Option<LatLng> {
    let pair = |lat_key: &str, lng_key: &str| {
        Some(LatLng::new(degrees(body.get(lat_key)?)?, degrees(body.get(lng_key)?)?))
    };
    pair("latitude", "longitude")
        .or_else(|| pair("lat", "lon"))
        .filter(LatLng::is_finite)
}

fn degrees(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn fixed_locator_without_point_is_denied() {
        let err = FixedLocator(None).locate().await.unwrap_err();
        assert!(matches!(err, LocateError::Denied));
        let at = FixedLocator(Some(LatLng::new(1.0, 2.0))).locate().await.unwrap();
        assert_eq!(at, LatLng::new(1.0, 2.0));
    }

    #[test]
    fn reads_both_response_styles() {
        assert_eq!(
            position_of(&json!({ "latitude": 12.97, "longitude": 77.59 })),
            Some(LatLng::new(12.97, 77.59))
        );
        assert_eq!(
            position_of(&json!({ "status": "success", "lat": "48.85", "lon": 2.35 })),
            Some(LatLng::new(48.85, 2.35))
        );
        assert_eq!(position_of(&json!({ "error": true, "reason": "RateLimited" })), None);
    }
}
