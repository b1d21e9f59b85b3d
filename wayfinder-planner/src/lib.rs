//! Trip planning core: talks to the planning webhook, normalizes whatever
//! comes back into map points, falls back to geocoding place names, and
//! drives a chat session through its states.
pub mod backend;
pub mod decode;
pub mod escape;
pub mod extract;
pub mod format;
pub mod geocode;
pub mod locate;
pub mod map;
pub mod session;
pub mod types;
pub mod worker;

pub use backend::{PlannerBackend, WebhookClient};
pub use decode::{BackendResponse, Decoded, decode_body};
pub use extract::extract_locations;
pub use geocode::{GeocodeError, GeocodeFallback, Geocoder, NominatimGeocoder};
pub use locate::{FixedLocator, Geolocator, IpLocator, LocateError};
pub use map::{MapOp, MapPresenter, MapSurface};
pub use session::{
    ChatMessage, Controls, Sender, Session, SessionError, SessionEvent, SessionSink, SessionState,
};
pub use types::{ItineraryStep, NormalizedLocation, TripRequest};
pub use worker::{SessionCmd, SessionHandle, spawn_session};
