//! The chat session: one request at a time, from prompt to rendered reply
//! and map markers.
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use wayfinder_common::LatLng;

use crate::backend::PlannerBackend;
use crate::decode::BackendResponse;
use crate::escape::escape_html;
use crate::extract::extract_locations;
use crate::format::{format_itinerary, format_raw, format_raw_text};
use crate::geocode::GeocodeFallback;
use crate::locate::{Geolocator, LocateError};
use crate::map::{MapOp, MapPresenter, MapSurface};
use crate::types::{NormalizedLocation, TripRequest, itinerary_of};

pub const EMPTY_PROMPT_ALERT: &str = "Please enter something!";
pub const REEVALUATE_ECHO: &str = "Re-evaluating your trip...";
pub const PARSE_FAILURE_NOTICE: &str = "Error: Failed to parse backend JSON. Showing raw text.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingLocation,
    AwaitingBackend,
    Rendering,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingLocation => "locating",
            SessionState::AwaitingBackend => "planning",
            SessionState::Rendering => "rendering",
        })
    }
}

/// Which user actions are currently accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub submit: bool,
    pub reevaluate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// A transcript entry. `html` is already escaped where it needs to be.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Message(ChatMessage),
    /// Show or remove the typing placeholder.
    Typing(bool),
    /// Blocking notice for the user; nothing was sent.
    Alert(String),
    State(SessionState),
    Controls(Controls),
    Map(MapOp),
}

/// Receives everything the session wants the user to see.
pub trait SessionSink: Send {
    fn emit(&mut self, event: SessionEvent);
}

impl SessionSink for Vec<SessionEvent> {
    fn emit(&mut self, event: SessionEvent) {
        self.push(event);
    }
}

impl SessionSink for UnboundedSender<SessionEvent> {
    fn emit(&mut self, event: SessionEvent) {
        if self.send(event).is_err() {
            tracing::debug!("session.sink.closed");
        }
    }
}

impl MapSurface for UnboundedSender<SessionEvent> {
    fn apply(&mut self, op: MapOp) {
        if self.send(SessionEvent::Map(op)).is_err() {
            tracing::debug!("session.map_sink.closed");
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("location unavailable: {0}")]
    Location(#[from] LocateError),
    #[error("a request is already in progress")]
    Busy,
    #[error("nothing to re-evaluate yet")]
    NothingToReevaluate,
    #[error("re-evaluation is disabled after a failed request")]
    ReevaluateDisabled,
}

pub struct Session<S, M> {
    backend: Arc<dyn PlannerBackend>,
    fallback: GeocodeFallback,
    locator: Arc<dyn Geolocator>,
    map: MapPresenter<M>,
    sink: S,
    state: SessionState,
    last_payload: Option<TripRequest>,
    reevaluate_enabled: bool,
}

impl<S: SessionSink, M: MapSurface> Session<S, M> {
    pub fn new(
        backend: Arc<dyn PlannerBackend>,
        fallback: GeocodeFallback,
        locator: Arc<dyn Geolocator>,
        map: MapPresenter<M>,
        sink: S,
    ) -> Self {
        Self {
            backend,
            fallback,
            locator,
            map,
            sink,
            state: SessionState::Idle,
            last_payload: None,
            reevaluate_enabled: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn controls(&self) -> Controls {
        let idle = self.state == SessionState::Idle;
        Controls {
            submit: idle,
            reevaluate: idle && self.reevaluate_enabled && self.last_payload.is_some(),
        }
    }

    pub fn last_payload(&self) -> Option<&TripRequest> {
        self.last_payload.as_ref()
    }

    pub fn map(&self) -> &MapPresenter<M> {
        &self.map
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Plan a trip for a new prompt at the user's current position.
    ///
    /// Returns the locations placed on the map (possibly none).
    pub async fn submit(&mut self, prompt: &str) -> Result<Vec<NormalizedLocation>, SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::Busy);
        }
        let prompt = prompt.trim();
        if prompt.is_empty() {
            self.sink.emit(SessionEvent::Alert(EMPTY_PROMPT_ALERT.to_string()));
            return Err(SessionError::EmptyPrompt);
        }

        self.set_state(SessionState::AwaitingLocation);
        let at = match self.locator.locate().await {
            Ok(at) => at,
            Err(err) => {
                tracing::warn!(error = %err, "session.locate.failed");
                self.sink.emit(SessionEvent::Alert(format!(
                    "Location permission is required to personalize the map: {err}"
                )));
                self.set_state(SessionState::Idle);
                return Err(err.into());
            }
        };

        let request = TripRequest::new(prompt, at);
        self.last_payload = Some(request.clone());
        self.map.ensure_map(at);
        self.say(Sender::User, escape_html(prompt));

        Ok(self.run(request).await)
    }

    /// Send the last request again, unchanged. The position is not re-read.
    pub async fn reevaluate(&mut self) -> Result<Vec<NormalizedLocation>, SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::Busy);
        }
        let Some(request) = self.last_payload.clone() else {
            return Err(SessionError::NothingToReevaluate);
        };
        if !self.reevaluate_enabled {
            return Err(SessionError::ReevaluateDisabled);
        }

        self.say(Sender::User, REEVALUATE_ECHO.to_string());
        Ok(self.run(request).await)
    }

    async fn run(&mut self, request: TripRequest) -> Vec<NormalizedLocation> {
        self.set_state(SessionState::AwaitingBackend);
        self.sink.emit(SessionEvent::Typing(true));

        let response = self.backend.plan(&request).await;

        self.sink.emit(SessionEvent::Typing(false));
        self.set_state(SessionState::Rendering);

        let locations = match response {
            BackendResponse::Error(message) => {
                self.say(Sender::Bot, format!("Error: {}", escape_html(&message)));
                self.reevaluate_enabled = false;
                Vec::new()
            }
            BackendResponse::RawText { raw, parse_error } => {
                tracing::debug!(%parse_error, raw_len = raw.len(), "session.render.raw_text");
                self.say(Sender::Bot, PARSE_FAILURE_NOTICE.to_string());
                self.say(Sender::Bot, format_raw_text(&raw));
                self.reevaluate_enabled = true;
                Vec::new()
            }
            BackendResponse::Direct(payload) | BackendResponse::Wrapped(payload) => {
                let html = format_itinerary(&payload).unwrap_or_else(|| format_raw(&payload));
                self.say(Sender::Bot, html);
                let locations =
                    locate_points(&self.fallback, &payload, request.user_location).await;
                if !locations.is_empty() {
                    self.map.update_markers(&locations);
                }
                self.reevaluate_enabled = true;
                locations
            }
        };

        self.set_state(SessionState::Idle);
        locations
    }

    fn say(&mut self, sender: Sender, html: String) {
        self.sink.emit(SessionEvent::Message(ChatMessage { sender, html }));
    }

    fn set_state(&mut self, next: SessionState) {
        tracing::debug!(from = %self.state, to = %next, "session.state");
        self.state = next;
        self.sink.emit(SessionEvent::State(next));
        self.sink.emit(SessionEvent::Controls(self.controls()));
    }
}

/// Coordinates from the payload itself, else geocoded itinerary places.
async fn locate_points(
    fallback: &GeocodeFallback,
    payload: &Value,
    bias: LatLng,
) -> Vec<NormalizedLocation> {
    let found = extract_locations(payload);
    if !found.is_empty() || itinerary_of(payload).is_none() {
        tracing::debug!(count = found.len(), "session.locations.extracted");
        return found;
    }
    fallback.resolve(payload, Some(bias)).await
}
