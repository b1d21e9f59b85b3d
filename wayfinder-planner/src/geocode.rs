//! Place-name lookup for itineraries that arrive without coordinates.
//!
//! Lookups run strictly one after another with a fixed pause after each
//! labeled step, which keeps us inside the public Nominatim usage policy.
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use wayfinder_common::LatLng;
use wayfinder_config::GeocoderConfig;
use wayfinder_http::{HttpClient, HttpError, RequestOpts};

use crate::types::{ItineraryStep, NormalizedLocation, itinerary_of};

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder request failed: {0}")]
    Http(#[from] HttpError),
    #[error("geocoder returned unusable coordinates: lat={lat:?} lon={lon:?}")]
    BadCoordinates { lat: String, lon: String },
}

/// Resolve a free-text place name to a point.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` means the service answered but found nothing.
    async fn geocode(&self, label: &str, bias: Option<LatLng>) -> Result<Option<LatLng>, GeocodeError>;
}

/// Client for a Nominatim-compatible `/search` endpoint.
#[derive(Clone)]
pub struct NominatimGeocoder {
    http: HttpClient,
    country_hint: String,
    bias_degrees: f64,
}

impl NominatimGeocoder {
    /// Fails with [`HttpError::Build`] when the configured `User-Agent` is
    /// not a valid header value; Nominatim refuses anonymous clients.
    pub fn from_config(cfg: &GeocoderConfig) -> Result<Self, HttpError> {
        // `Url::join` replaces the last path segment unless the base ends with '/'.
        let base = if cfg.base_url.ends_with('/') {
            cfg.base_url.clone()
        } else {
            format!("{}/", cfg.base_url)
        };
        Ok(Self {
            http: HttpClient::new(&base)?.with_default_header(USER_AGENT, &cfg.user_agent)?,
            country_hint: cfg.country_hint.trim().to_string(),
            bias_degrees: cfg.bias_degrees,
        })
    }

    fn query<'a>(&self, label: &'a str, bias: Option<LatLng>) -> Vec<(&'static str, Cow<'a, str>)> {
        let mut q: Vec<(&'static str, Cow<'a, str>)> = vec![
            ("q", Cow::Borrowed(label)),
            ("format", Cow::Borrowed("json")),
            ("addressdetails", Cow::Borrowed("0")),
            ("limit", Cow::Borrowed("1")),
        ];
        if !self.country_hint.is_empty() {
            q.push(("countrycodes", Cow::Owned(self.country_hint.clone())));
        }
        if let Some(at) = bias {
            let d = self.bias_degrees;
            let viewbox = format!("{},{},{},{}", at.lng - d, at.lat + d, at.lng + d, at.lat - d);
            q.push(("viewbox", Cow::Owned(viewbox)));
            q.push(("bounded", Cow::Borrowed("1")));
        }
        q
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, label: &str, bias: Option<LatLng>) -> Result<Option<LatLng>, GeocodeError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let opts = RequestOpts {
            headers: Some(headers),
            query: Some(self.query(label, bias)),
            ..Default::default()
        };

        let hits: Vec<Value> = self.http.get_json("search", opts).await?;
        let Some(first) = hits.first() else {
            return Ok(None);
        };
        let lat = coordinate(first.get("lat"));
        let lon = coordinate(first.get("lon"));
        match (lat, lon) {
            (Some(lat), Some(lng)) => Ok(Some(LatLng::new(lat, lng))),
            _ => Err(GeocodeError::BadCoordinates {
                lat: first.get("lat").map(Value::to_string).unwrap_or_default(),
                lon: first.get("lon").map(Value::to_string).unwrap_or_default(),
            }),
        }
    }
}

/// Nominatim sends coordinates as strings; tolerate plain numbers too.
fn coordinate(v: Option<&Value>) -> Option<f64> {
    let parsed = match v? {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

#[derive(Debug, Clone, PartialEq)]
struct GeocodeJob {
    label: String,
    description: String,
}

/// Sequential geocoding over the itinerary steps of a payload.
#[derive(Clone)]
pub struct GeocodeFallback {
    geocoder: Arc<dyn Geocoder>,
    delay: Duration,
}

impl GeocodeFallback {
    pub fn new(geocoder: Arc<dyn Geocoder>, delay: Duration) -> Self {
        Self { geocoder, delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Geocode every labeled step of `payload`'s itinerary, in order.
    ///
    /// Steps without a label are skipped outright (no lookup, no pause).
    /// Every other step is followed by the configured pause whether it
    /// matched or not. Failures are logged and skipped.
    pub async fn resolve(&self, payload: &Value, bias: Option<LatLng>) -> Vec<NormalizedLocation> {
        let jobs = jobs_for(payload);
        tracing::debug!(jobs = jobs.len(), delay_ms = self.delay.as_millis() as u64, "geocode.fallback.start");

        let mut found = Vec::new();
        for job in jobs {
            match self.geocoder.geocode(&job.label, bias).await {
                Ok(Some(at)) => {
                    tracing::debug!(label = %job.label, lat = at.lat, lng = at.lng, "geocode.lookup.hit");
                    found.push(NormalizedLocation {
                        lat: at.lat,
                        lng: at.lng,
                        title: job.label,
                        description: job.description,
                    });
                }
                Ok(None) => {
                    tracing::debug!(label = %job.label, "geocode.lookup.miss");
                }
                Err(err) => {
                    tracing::warn!(label = %job.label, error = %err, "geocode.lookup.error");
                }
            }
            tokio::time::sleep(self.delay).await;
        }

        tracing::debug!(found = found.len(), "geocode.fallback.done");
        found
    }
}

fn jobs_for(payload: &Value) -> Vec<GeocodeJob> {
    let Some(steps) = itinerary_of(payload) else {
        return Vec::new();
    };
    steps
        .iter()
        .map(ItineraryStep::from_value)
        .filter_map(|step| {
            let label = step.label()?.to_string();
            Some(GeocodeJob {
                label,
                description: step.reason.unwrap_or_default(),
            })
        })
        .collect()
}
