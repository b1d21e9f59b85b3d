//! Common types and utilities shared across Wayfinder crates.
//!
//! This crate holds the coordinate type every other crate speaks, the shared
//! error type, and the observability bootstrap. It stays small so the HTTP,
//! config, planner and UI crates can all depend on it.
//!
//! # Overview
//!
//! - [`LatLng`]: a WGS84 coordinate pair
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`WayfinderError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use wayfinder_common::LatLng;
//!
//! let here = LatLng::new(12.97, 77.59);
//! assert_eq!(here.to_string(), "12.97000, 77.59000");
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod observability;

/// A latitude/longitude pair in decimal degrees.
///
/// Serializes as `{ "lat": .., "lng": .. }`, which is the wire shape the
/// planning backend expects for `user_location`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

/// Error types used across the Wayfinder workspace.
#[derive(thiserror::Error, Debug)]
pub enum WayfinderError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local persisted state could not be read or written.
    #[error("State error: {0}")]
    State(#[from] std::io::Error),
}

/// Convenient alias for results that use [`WayfinderError`].
pub type Result<T> = std::result::Result<T, WayfinderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latlng_serializes_with_backend_field_names() {
        let v = serde_json::to_value(LatLng::new(1.5, -2.25)).unwrap();
        assert_eq!(v, serde_json::json!({ "lat": 1.5, "lng": -2.25 }));
    }

    #[test]
    fn non_finite_coordinates_are_flagged() {
        assert!(LatLng::new(0.0, 0.0).is_finite());
        assert!(!LatLng::new(f64::NAN, 0.0).is_finite());
        assert!(!LatLng::new(0.0, f64::INFINITY).is_finite());
    }
}
