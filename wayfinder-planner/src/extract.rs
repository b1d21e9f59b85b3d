//! Normalize map points out of the shapes the planner is known to send.
use serde_json::Value;

use crate::types::{ItineraryStep, NormalizedLocation, first_text, itinerary_of, number};

const DEFAULT_TITLE: &str = "Location";

/// Pull coordinate-bearing locations out of a payload.
///
/// A `locations` array wins outright, even when none of its entries carry
/// numeric coordinates. Otherwise each `itinerary` step contributes a point
/// when it has numeric `lat`/`lng` or a `[lat, lng]` pair. Anything else
/// yields nothing.
///
/// ```
/// use serde_json::json;
/// use wayfinder_planner::extract_locations;
///
/// let found = extract_locations(&json!({
///     "itinerary": [{ "place": "Fort", "coordinates": [12.9, 77.6] }]
/// }));
/// assert_eq!(found.len(), 1);
/// assert_eq!((found[0].lat, found[0].lng), (12.9, 77.6));
/// ```
pub fn extract_locations(payload: &Value) -> Vec<NormalizedLocation> {
    if let Some(entries) = payload.get("locations").and_then(Value::as_array) {
        return entries.iter().filter_map(from_location_entry).collect();
    }

    let Some(steps) = itinerary_of(payload) else {
        return Vec::new();
    };

    steps
        .iter()
        .filter_map(|raw| {
            let step = ItineraryStep::from_value(raw);
            let at = step.position()?;
            Some(NormalizedLocation {
                lat: at.lat,
                lng: at.lng,
                title: step
                    .place
                    .clone()
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                description: step.reason.clone().unwrap_or_default(),
            })
        })
        .collect()
}

fn from_location_entry(entry: &Value) -> Option<NormalizedLocation> {
    let lat = entry.get("lat").and_then(number)?;
    let lng = entry.get("lng").and_then(number)?;
    Some(NormalizedLocation {
        lat,
        lng,
        title: first_text(entry, &["title", "name", "place"])
            .unwrap_or(DEFAULT_TITLE)
            .to_string(),
        description: first_text(entry, &["description", "reason"])
            .unwrap_or_default()
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn locations_array_keeps_numeric_entries_in_order() {
        let payload = json!({
            "locations": [
                { "lat": 1.0, "lng": 2.0, "name": "A", "reason": "first" },
                { "lat": "3", "lng": 4.0, "title": "skipped" },
                { "lat": 5.0, "lng": 6.0 }
            ],
            "itinerary": [{ "place": "ignored", "lat": 9.0, "lng": 9.0 }]
        });
        let got = extract_locations(&payload);
        assert_eq!(
            got,
            vec![
                NormalizedLocation { lat: 1.0, lng: 2.0, title: "A".into(), description: "first".into() },
                NormalizedLocation { lat: 5.0, lng: 6.0, title: "Location".into(), description: "".into() },
            ]
        );
    }

    #[test]
    fn empty_locations_array_short_circuits() {
        let payload = json!({
            "locations": [],
            "itinerary": [{ "place": "X", "lat": 1.0, "lng": 1.0 }]
        });
        assert!(extract_locations(&payload).is_empty());
    }

    #[test]
    fn title_prefers_title_then_name_then_place() {
        let got = extract_locations(&json!({
            "locations": [{ "lat": 0.0, "lng": 0.0, "place": "P", "name": "N", "description": "d" }]
        }));
        assert_eq!(got[0].title, "N");
        assert_eq!(got[0].description, "d");
    }

    #[test]
    fn direct_fields_beat_coordinates() {
        let got = extract_locations(&json!({
            "itinerary": [{ "place": "Fort", "lat": 1.5, "lng": 2.5, "coordinates": [9.0, 9.0] }]
        }));
        assert_eq!((got[0].lat, got[0].lng), (1.5, 2.5));
    }

    #[test]
    fn coordinates_pair_is_lat_then_lng() {
        let got = extract_locations(&json!({
            "itinerary": [{ "reason": "views", "coordinates": [12.9, 77.6] }]
        }));
        assert_eq!(
            got,
            vec![NormalizedLocation {
                lat: 12.9,
                lng: 77.6,
                title: "Location".into(),
                description: "views".into()
            }]
        );
    }

    #[test]
    fn steps_without_coordinates_are_dropped() {
        let got = extract_locations(&json!({
            "itinerary": [{ "place": "Ghost Town" }, { "place": "Half", "lat": 1.0 }]
        }));
        assert!(got.is_empty());
    }

    #[test]
    fn unknown_shapes_yield_nothing() {
        assert!(extract_locations(&json!({})).is_empty());
        assert!(extract_locations(&json!([1, 2, 3])).is_empty());
        assert!(extract_locations(&json!({ "itinerary": "soon" })).is_empty());
    }
}
