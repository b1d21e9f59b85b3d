//! Request/response shapes and lenient field access for untrusted JSON.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wayfinder_common::LatLng;

/// What gets POSTed to the planning backend. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub user_prompt: String,
    pub user_location: LatLng,
}

impl TripRequest {
    pub fn new(user_prompt: impl Into<String>, user_location: LatLng) -> Self {
        Self {
            user_prompt: user_prompt.into(),
            user_location,
        }
    }
}

/// A coordinate-bearing point of interest ready for the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedLocation {
    pub lat: f64,
    pub lng: f64,
    pub title: String,
    pub description: String,
}

impl NormalizedLocation {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// One leg of an itinerary, read leniently out of whatever the backend sent.
///
/// Only JSON numbers count as coordinates; strings that look like numbers
/// do not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItineraryStep {
    pub step: Option<String>,
    pub place: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub reason: Option<String>,
    pub estimated_cost: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Present only when `coordinates` is a two-element array of numbers.
    pub coordinates: Option<(f64, f64)>,
}

impl ItineraryStep {
    pub fn from_value(v: &Value) -> Self {
        let Some(obj) = v.as_object() else {
            return Self::default();
        };
        let coordinates = obj
            .get("coordinates")
            .and_then(Value::as_array)
            .filter(|pair| pair.len() == 2)
            .and_then(|pair| Some((number(&pair[0])?, number(&pair[1])?)));

        Self {
            step: display_value(obj.get("step")),
            place: display_value(obj.get("place")),
            title: display_value(obj.get("title")),
            name: display_value(obj.get("name")),
            reason: display_value(obj.get("reason")),
            estimated_cost: display_value(obj.get("estimated_cost")),
            lat: obj.get("lat").and_then(number),
            lng: obj.get("lng").and_then(number),
            coordinates,
        }
    }

    /// Direct `lat`/`lng` fields win; the `[lat, lng]` pair is the fallback.
    pub fn position(&self) -> Option<LatLng> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
            _ => self
                .coordinates
                .map(|(lat, lng)| LatLng::new(lat, lng)),
        }
    }

    /// The name to geocode: `place`, else `title`, else `name`.
    pub fn label(&self) -> Option<&str> {
        [&self.place, &self.title, &self.name]
            .into_iter()
            .filter_map(|s| s.as_deref())
            .find(|s| !s.is_empty())
    }
}

/// The `itinerary` array of a payload, if it is an array.
pub fn itinerary_of(payload: &Value) -> Option<&Vec<Value>> {
    payload.get("itinerary").and_then(Value::as_array)
}

pub(crate) fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Render a field for display; `null`/missing is `None`, strings are taken
/// verbatim, anything else uses its JSON text.
pub(crate) fn display_value(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// First candidate that is a non-empty string.
pub(crate) fn first_text<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trip_request_wire_shape() {
        let req = TripRequest::new("coffee then museum", LatLng::new(12.9, 77.6));
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "user_prompt": "coffee then museum",
                "user_location": { "lat": 12.9, "lng": 77.6 }
            })
        );
    }

    #[test]
    fn step_reads_mixed_field_types() {
        let step = ItineraryStep::from_value(&json!({
            "step": 2,
            "place": "Lalbagh",
            "estimated_cost": "₹50",
            "lat": "12.9",
            "lng": 77.5,
            "coordinates": [12.95, 77.58]
        }));
        assert_eq!(step.step.as_deref(), Some("2"));
        assert_eq!(step.lat, None, "string latitude is not numeric");
        assert_eq!(step.position(), Some(LatLng::new(12.95, 77.58)));
    }

    #[test]
    fn coordinates_must_be_exactly_two_numbers() {
        let three = ItineraryStep::from_value(&json!({ "coordinates": [1.0, 2.0, 3.0] }));
        assert_eq!(three.coordinates, None);
        let mixed = ItineraryStep::from_value(&json!({ "coordinates": [1.0, "2"] }));
        assert_eq!(mixed.coordinates, None);
    }

    #[test]
    fn label_skips_empty_candidates() {
        let step = ItineraryStep::from_value(&json!({ "place": "", "title": "", "name": "Fort" }));
        assert_eq!(step.label(), Some("Fort"));
        assert_eq!(ItineraryStep::from_value(&json!({})).label(), None);
        assert_eq!(ItineraryStep::from_value(&json!(null)).label(), None);
    }
}
