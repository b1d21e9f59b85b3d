use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wayfinder_common::observability::{LogConfig, LogFormat};
use wayfinder_common::{LatLng, WayfinderError};
use wayfinder_config::{LocationProvider, LoggingConfig, ThemeStore, WayfinderConfig};
use wayfinder_planner::{
    FixedLocator, GeocodeFallback, Geolocator, IpLocator, MapPresenter, MapSurface,
    NominatimGeocoder, PlannerBackend, Session, SessionSink, WebhookClient, spawn_session,
};
use wayfinder_tui::{TuiApp, TuiMsg, spawn_tui_feeders};

const TUI_MAILBOX: usize = 256;

/// Command-line values that beat whatever the config sources said.
#[derive(Debug, Default)]
pub struct Overrides {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub endpoint: Option<String>,
}

impl Overrides {
    pub fn apply(self, cfg: &mut WayfinderConfig) -> wayfinder_common::Result<()> {
        if let (Some(lat), Some(lng)) = (self.lat, self.lng) {
            let at = LatLng::new(lat, lng);
            if !at.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
                return Err(WayfinderError::Config(format!(
                    "--lat/--lng out of range: {at}"
                )));
            }
            cfg.location.provider = LocationProvider::Fixed;
            cfg.location.lat = Some(lat);
            cfg.location.lng = Some(lng);
        }
        if let Some(endpoint) = self.endpoint {
            cfg.backend.endpoint = endpoint;
        }
        Ok(())
    }
}

pub fn log_config(cfg: &LoggingConfig, allow_stderr: bool) -> LogConfig {
    LogConfig {
        app_name: "wayfinder",
        log_dir: cfg.dir.as_ref().map(PathBuf::from),
        emit_stderr: allow_stderr && cfg.stderr,
        format: LogFormat::parse(&cfg.format),
        default_filter: cfg.filter.clone(),
    }
}

/// The network-facing collaborators a session needs.
pub struct Services {
    pub backend: Arc<dyn PlannerBackend>,
    pub fallback: GeocodeFallback,
    pub locator: Arc<dyn Geolocator>,
}

impl Services {
    pub fn from_config(cfg: &WayfinderConfig) -> Result<Self> {
        let backend = WebhookClient::from_config(&cfg.backend)
            .with_context(|| format!("backend endpoint {:?}", cfg.backend.endpoint))?;
        let geocoder = NominatimGeocoder::from_config(&cfg.geocoder)
            .with_context(|| format!("geocoder base_url {:?}", cfg.geocoder.base_url))?;
        let locator: Arc<dyn Geolocator> = match cfg.location.provider {
            LocationProvider::Fixed => Arc::new(FixedLocator(cfg.location.fixed_point())),
            LocationProvider::Ip => Arc::new(
                IpLocator::new(&cfg.location.ip_endpoint)
                    .with_context(|| format!("ip_endpoint {:?}", cfg.location.ip_endpoint))?,
            ),
        };
        tracing::info!(
            endpoint = %cfg.backend.endpoint,
            geocoder = %cfg.geocoder.base_url,
            provider = ?cfg.location.provider,
            "app.services.ready"
        );

        Ok(Self {
            backend: Arc::new(backend),
            fallback: GeocodeFallback::new(Arc::new(geocoder), cfg.geocoder.delay()),
            locator,
        })
    }

    pub fn session<S: SessionSink, M: MapSurface>(
        self,
        cfg: &WayfinderConfig,
        surface: M,
        sink: S,
    ) -> Session<S, M> {
        Session::new(
            self.backend,
            self.fallback,
            self.locator,
            MapPresenter::new(surface, cfg.map.clone()),
            sink,
        )
    }
}

/// Run the interactive chat until the user quits or Ctrl-C arrives.
pub async fn run_tui(cfg: WayfinderConfig) -> Result<()> {
    let services = Services::from_config(&cfg)?;

    // Transcript and map ops share one ordered stream into the UI.
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let session = services.session(&cfg, events_tx.clone(), events_tx);
    let (handle, worker) = spawn_session(session);

    let cancel = CancellationToken::new();
    let (tui_tx, tui_rx) = mpsc::channel::<TuiMsg>(TUI_MAILBOX);
    let themes = ThemeStore::from_config(cfg.ui.theme_file.as_deref());
    let app = TuiApp::new(handle, themes, cancel.clone(), cfg.backend.endpoint.clone())?;
    spawn_tui_feeders(tui_tx.clone(), events_rx, cancel.clone());

    {
        let tx = tui_tx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("app.ctrl_c");
                    let _ = tx.send(TuiMsg::Shutdown).await;
                }
                _ = cancel.cancelled() => {}
            }
        });
    }

    let result = app.run(tui_rx, tui_tx).await;
    // An in-flight request has nobody left to show it to.
    worker.abort();
    tracing::info!("app.stopped");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_pin_a_fixed_location_and_endpoint() {
        let mut cfg = WayfinderConfig::default();
        cfg.location.provider = LocationProvider::Ip;
        Overrides {
            lat: Some(-33.86),
            lng: Some(151.21),
            endpoint: Some("http://127.0.0.1:9/hook".into()),
        }
        .apply(&mut cfg)
        .expect("valid flags");

        assert_eq!(cfg.location.provider, LocationProvider::Fixed);
        assert_eq!(cfg.location.lat, Some(-33.86));
        assert_eq!(cfg.backend.endpoint, "http://127.0.0.1:9/hook");
    }

    #[test]
    fn no_flags_leave_config_alone() {
        let mut cfg = WayfinderConfig::default();
        let before = cfg.backend.endpoint.clone();
        Overrides::default().apply(&mut cfg).expect("no flags");
        assert_eq!(cfg.backend.endpoint, before);
        assert_eq!(cfg.location.fixed_point(), None);
    }

    #[test]
    fn impossible_coordinates_are_rejected() {
        let mut cfg = WayfinderConfig::default();
        let err = Overrides {
            lat: Some(91.0),
            lng: Some(0.0),
            endpoint: None,
        }
        .apply(&mut cfg)
        .unwrap_err();
        assert!(matches!(err, WayfinderError::Config(_)));
        assert_eq!(cfg.location.lat, None);
    }

    #[test]
    fn tui_logging_never_mirrors_to_stderr() {
        let logging = LoggingConfig {
            stderr: true,
            format: "JSON".into(),
            ..LoggingConfig::default()
        };
        assert!(!log_config(&logging, false).emit_stderr);
        let cli = log_config(&logging, true);
        assert!(cli.emit_stderr);
        assert_eq!(cli.format, LogFormat::Json);
    }

    #[tokio::test]
    async fn services_build_from_defaults() {
        let services = Services::from_config(&WayfinderConfig::default()).expect("services");
        assert_eq!(
            services.backend.endpoint(),
            "http://localhost:5678/webhook-test/plan-trip"
        );
        assert_eq!(services.fallback.delay(), std::time::Duration::from_millis(300));
    }
}
