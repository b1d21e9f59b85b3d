//! Loader for workspace configuration with YAML + environment overlays.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults (every field has one, so an empty config is valid)
//! 2. YAML files / inline snippets added with [`WayfinderConfigLoader::with_file`]
//!    and friends
//! 3. `WAYFINDER__SECTION__KEY` environment variables
//!    (e.g. `WAYFINDER__BACKEND__ENDPOINT`)
//!
//! After merging, `${VAR}` placeholders inside string values are expanded
//! from the process environment before the typed structs are materialised.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use wayfinder_common::LatLng;

pub mod theme;

pub use theme::{Theme, ThemeStore};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WayfinderConfig {
    pub backend: BackendConfig,
    pub geocoder: GeocoderConfig,
    pub location: LocationConfig,
    pub map: MapConfig,
    pub logging: LoggingConfig,
    pub ui: UiConfig,
}

/// The trip-planning webhook.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub endpoint: String,
    /// Unset means no timeout: a hung backend stalls that request.
    pub timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5678/webhook-test/plan-trip".into(),
            timeout_secs: None,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Nominatim-compatible search service used when the backend sends no coordinates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    /// ISO country code(s) passed as `countrycodes`; empty searches globally.
    pub country_hint: String,
    pub delay_ms: u64,
    pub bias_degrees: f64,
    pub user_agent: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".into(),
            country_hint: String::new(),
            delay_ms: 300,
            bias_degrees: 0.25,
            user_agent: concat!("wayfinder/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl GeocoderConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationProvider {
    #[default]
    Fixed,
    Ip,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub provider: LocationProvider,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub ip_endpoint: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            provider: LocationProvider::Fixed,
            lat: None,
            lng: None,
            ip_endpoint: "https://ipapi.co/json/".into(),
        }
    }
}

impl LocationConfig {
    /// The configured fixed point, when both halves are present.
    pub fn fixed_point(&self) -> Option<LatLng> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub tile_url: String,
    pub attribution: String,
    pub zoom: u8,
    pub max_zoom: u8,
    pub padding: u16,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".into(),
            attribution: "© OpenStreetMap contributors".into(),
            zoom: 13,
            max_zoom: 19,
            padding: 24,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<String>,
    pub format: String,
    pub stderr: bool,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: "text".into(),
            stderr: false,
            filter: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Where the theme preference lives; defaults under the user data dir.
    pub theme_file: Option<String>,
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct WayfinderConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env: Environment,
}

impl Default for WayfinderConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl WayfinderConfigLoader {
    /// Start with defaults plus `WAYFINDER__` env overrides.
    ///
    /// ```
    /// use wayfinder_config::WayfinderConfigLoader;
    ///
    /// let config = WayfinderConfigLoader::new()
    ///     .with_yaml_str("geocoder:\n  delay_ms: 500")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.geocoder.delay_ms, 500);
    /// assert_eq!(config.map.zoom, 13);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env: Environment::with_prefix("WAYFINDER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`Self::with_file`], but a missing file is not an error.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use wayfinder_config::{LocationProvider, WayfinderConfigLoader};
    ///
    /// let cfg = WayfinderConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// location:
    ///   provider: "fixed"
    ///   lat: 12.97
    ///   lng: 77.59
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.location.provider, LocationProvider::Fixed);
    /// assert!(cfg.location.fixed_point().is_some());
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use wayfinder_config::WayfinderConfigLoader;
    ///
    /// unsafe { std::env::set_var("PLANNER_HOST", "planner.internal"); }
    ///
    /// let config = WayfinderConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// backend:
    ///   endpoint: "http://${PLANNER_HOST}/webhook/plan-trip"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.backend.endpoint, "http://planner.internal/webhook/plan-trip");
    ///
    /// unsafe { std::env::remove_var("PLANNER_HOST"); }
    /// ```
    pub fn load(self) -> Result<WayfinderConfig, ConfigError> {
        let cfg = self.builder.add_source(self.env).build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: WayfinderConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        tracing::debug!(
            endpoint = %typed.backend.endpoint,
            geocoder = %typed.geocoder.base_url,
            provider = ?typed.location.provider,
            "config.loaded"
        );
        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use temp_env;

    #[test]
    fn expands_a_webhook_url() {
        temp_env::with_var("N8N_HOST", Some("n8n.local:5678"), || {
            let mut v = json!("http://${N8N_HOST}/webhook/plan-trip");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("http://n8n.local:5678/webhook/plan-trip"));
        });
    }

    #[test]
    fn expands_nested_sections_and_skips_non_strings() {
        temp_env::with_vars([("GEO", Some("nominatim.example")), ("CC", Some("in"))], || {
            let mut v = json!({
                "geocoder": { "base_url": "https://$GEO/", "country_hint": "${CC}", "delay_ms": 300 },
                "location": { "lat": 12.9, "lng": null },
                "hosts": ["${GEO}", false]
            });
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!({
                    "geocoder": { "base_url": "https://nominatim.example/", "country_hint": "in", "delay_ms": 300 },
                    "location": { "lat": 12.9, "lng": null },
                    "hosts": ["nominatim.example", false]
                })
            );
        });
    }

    #[test]
    fn self_referencing_vars_terminate() {
        temp_env::with_vars([("PING", Some("${PONG}")), ("PONG", Some("${PING}"))], || {
            let mut v = json!("agent-${PING}");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("agent-"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST_WAYFINDER}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST_WAYFINDER}"));
    }

    #[test]
    fn defaults_match_the_documented_behaviour() {
        let cfg = WayfinderConfig::default();
        assert_eq!(cfg.geocoder.delay(), Duration::from_millis(300));
        assert_eq!(cfg.geocoder.bias_degrees, 0.25);
        assert_eq!(cfg.backend.timeout(), None);
        assert_eq!(cfg.map.padding, 24);
        assert!(cfg.location.fixed_point().is_none());
    }

    #[test]
    fn half_a_fixed_point_is_no_point() {
        let loc = LocationConfig {
            lat: Some(1.0),
            ..Default::default()
        };
        assert!(loc.fixed_point().is_none());
    }
}
