//! Map view state and the operations that drive a rendering surface.
use wayfinder_common::LatLng;
use wayfinder_config::MapConfig;

use crate::escape::escape_html;
use crate::types::NormalizedLocation;

const USER_MARKER_TITLE: &str = "You are here";

/// One instruction for whatever draws the map.
#[derive(Debug, Clone, PartialEq)]
pub enum MapOp {
    /// Create the view. Sent exactly once.
    Init {
        center: LatLng,
        zoom: u8,
        max_zoom: u8,
        tile_url: String,
        attribution: String,
    },
    SetView { center: LatLng, zoom: u8 },
    PlaceUserMarker { position: LatLng, title: String },
    MoveUserMarker { position: LatLng },
    /// Remove every point-of-interest marker; the user marker stays.
    ClearMarkers,
    AddMarker {
        position: LatLng,
        title: String,
        popup_html: String,
    },
    FitBounds { points: Vec<LatLng>, padding: u16 },
}

/// A rendering backend. Operations arrive in order and are applied as-is.
pub trait MapSurface: Send {
    fn apply(&mut self, op: MapOp);
}

impl MapSurface for Vec<MapOp> {
    fn apply(&mut self, op: MapOp) {
        self.push(op);
    }
}

/// Owns the map state and translates intent into [`MapOp`]s.
pub struct MapPresenter<S> {
    surface: S,
    config: MapConfig,
    user: Option<LatLng>,
    markers: Vec<NormalizedLocation>,
}

impl<S: MapSurface> MapPresenter<S> {
    pub fn new(surface: S, config: MapConfig) -> Self {
        Self {
            surface,
            config,
            user: None,
            markers: Vec::new(),
        }
    }

    /// Create the view on the first call; recenter and move the user marker after that.
    pub fn ensure_map(&mut self, at: LatLng) {
        match self.user {
            None => {
                self.surface.apply(MapOp::Init {
                    center: at,
                    zoom: self.config.zoom,
                    max_zoom: self.config.max_zoom,
                    tile_url: self.config.tile_url.clone(),
                    attribution: self.config.attribution.clone(),
                });
                self.surface.apply(MapOp::PlaceUserMarker {
                    position: at,
                    title: USER_MARKER_TITLE.to_string(),
                });
                tracing::debug!(lat = at.lat, lng = at.lng, "map.init");
            }
            Some(_) => {
                self.surface.apply(MapOp::SetView {
                    center: at,
                    zoom: self.config.zoom,
                });
                self.surface.apply(MapOp::MoveUserMarker { position: at });
                tracing::debug!(lat = at.lat, lng = at.lng, "map.recenter");
            }
        }
        self.user = Some(at);
    }

    /// Replace the point-of-interest markers and fit the view around them
    /// and the user. Does nothing until the map exists.
    pub fn update_markers(&mut self, locations: &[NormalizedLocation]) {
        let Some(user) = self.user else {
            tracing::debug!(count = locations.len(), "map.update.before_init");
            return;
        };

        self.surface.apply(MapOp::ClearMarkers);
        self.markers.clear();

        let mut points = Vec::with_capacity(locations.len() + 1);
        for loc in locations {
            let position = loc.position();
            if !position.is_finite() {
                continue;
            }
            self.surface.apply(MapOp::AddMarker {
                position,
                title: loc.title.clone(),
                popup_html: format!(
                    "<strong>{}</strong><br>{}",
                    escape_html(&loc.title),
                    escape_html(&loc.description)
                ),
            });
            self.markers.push(loc.clone());
            points.push(position);
        }

        if points.is_empty() {
            tracing::debug!("map.update.cleared");
            return;
        }
        points.push(user);
        tracing::debug!(markers = self.markers.len(), "map.update");
        self.surface.apply(MapOp::FitBounds {
            points,
            padding: self.config.padding,
        });
    }

    pub fn is_initialized(&self) -> bool {
        self.user.is_some()
    }

    pub fn user_position(&self) -> Option<LatLng> {
        self.user
    }

    pub fn markers(&self) -> &[NormalizedLocation] {
        &self.markers
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}
