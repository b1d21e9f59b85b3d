//! Terminal stand-in for the tile map: keeps the last state the presenter
//! described and works out what part of the world to draw.
use wayfinder_common::LatLng;
use wayfinder_planner::escape::html_to_text;
use wayfinder_planner::{MapOp, MapSurface};

/// Degrees of longitude visible at zoom 0.
const WORLD_SPAN: f64 = 360.0;
/// Nominal tile size the padding is expressed against.
const TILE_PX: f64 = 256.0;
const MIN_SPAN: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasMarker {
    pub position: LatLng,
    pub title: String,
    pub popup: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

#[derive(Debug, Default)]
pub struct MapCanvas {
    initialized: bool,
    center: Option<LatLng>,
    zoom: u8,
    max_zoom: u8,
    attribution: String,
    user: Option<LatLng>,
    markers: Vec<CanvasMarker>,
    fit: Option<(Vec<LatLng>, u16)>,
}

impl MapSurface for MapCanvas {
    fn apply(&mut self, op: MapOp) {
        match op {
            MapOp::Init {
                center,
                zoom,
                max_zoom,
                attribution,
                ..
            } => {
                self.initialized = true;
                self.center = Some(center);
                self.zoom = zoom;
                self.max_zoom = max_zoom;
                self.attribution = attribution;
            }
            MapOp::SetView { center, zoom } => {
                self.center = Some(center);
                self.zoom = zoom;
                self.fit = None;
            }
            MapOp::PlaceUserMarker { position, .. } | MapOp::MoveUserMarker { position } => {
                self.user = Some(position);
            }
            MapOp::ClearMarkers => self.markers.clear(),
            MapOp::AddMarker {
                position,
                title,
                popup_html,
            } => self.markers.push(CanvasMarker {
                position,
                title,
                popup: html_to_text(&popup_html).replace('\n', " - "),
            }),
            MapOp::FitBounds { points, padding } => self.fit = Some((points, padding)),
        }
    }
}

impl MapCanvas {
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn user(&self) -> Option<LatLng> {
        self.user
    }

    pub fn markers(&self) -> &[CanvasMarker] {
        &self.markers
    }

    pub fn attribution(&self) -> &str {
        &self.attribution
    }

    /// The visible lng/lat window: the fitted bounds when there are any,
    /// otherwise a window around the center sized by the zoom level.
    pub fn viewport(&self) -> Viewport {
        if let Some((points, padding)) = self.fit.as_ref().filter(|(p, _)| !p.is_empty()) {
            return fitted(points, *padding, self.max_zoom);
        }
        match self.center {
            Some(c) => {
                let span = span_for_zoom(self.zoom);
                window(c.lng, c.lat, span, span / 2.0)
            }
            None => Viewport {
                x: [-180.0, 180.0],
                y: [-90.0, 90.0],
            },
        }
    }
}

fn span_for_zoom(zoom: u8) -> f64 {
    (WORLD_SPAN / 2f64.powi(i32::from(zoom))).max(MIN_SPAN)
}

fn fitted(points: &[LatLng], padding: u16, max_zoom: u8) -> Viewport {
    let (mut x0, mut x1, mut y0, mut y1) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for p in points {
        x0 = x0.min(p.lng);
        x1 = x1.max(p.lng);
        y0 = y0.min(p.lat);
        y1 = y1.max(p.lat);
    }
    let floor = span_for_zoom(max_zoom);
    let w = (x1 - x0).max(floor);
    let h = (y1 - y0).max(floor / 2.0);
    let pad = f64::from(padding) / TILE_PX;
    window(
        (x0 + x1) / 2.0,
        (y0 + y1) / 2.0,
        w * (1.0 + 2.0 * pad),
        h * (1.0 + 2.0 * pad),
    )
}

fn window(cx: f64, cy: f64, w: f64, h: f64) -> Viewport {
    Viewport {
        x: [(cx - w / 2.0).max(-180.0), (cx + w / 2.0).min(180.0)],
        y: [(cy - h / 2.0).max(-90.0), (cy + h / 2.0).min(90.0)],
    }
}
