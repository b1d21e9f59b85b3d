use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;
use wayfinder_config::{LocationProvider, WayfinderConfigLoader};

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn file_values_and_env_expansion() {
    let tmp = TempDir::new().unwrap();
    let file_yaml = r#"
backend:
  endpoint: "${PLANNER_URL}"
  timeout_secs: 45
geocoder:
  country_hint: "in"
  delay_ms: 350
location:
  provider: ip
map:
  zoom: 12
  "#;
    let p = write_yaml(&tmp, "wayfinder.yaml", file_yaml);

    temp_env::with_var("PLANNER_URL", Some("http://n8n.local/webhook/plan"), || {
        let config = WayfinderConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load config");

        assert_eq!(config.backend.endpoint, "http://n8n.local/webhook/plan");
        assert_eq!(config.backend.timeout_secs, Some(45));
        assert_eq!(config.geocoder.country_hint, "in");
        assert_eq!(config.geocoder.delay_ms, 350);
        assert_eq!(config.location.provider, LocationProvider::Ip);
        assert_eq!(config.map.zoom, 12);
        // untouched sections keep their defaults
        assert_eq!(config.map.padding, 24);
        assert_eq!(config.geocoder.bias_degrees, 0.25);
    });
}

#[test]
#[serial]
fn environment_overrides_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(
        &tmp,
        "wayfinder.yaml",
        "backend:\n  endpoint: \"http://from-file/plan\"\n",
    );

    temp_env::with_vars(
        [
            ("WAYFINDER__BACKEND__ENDPOINT", Some("http://from-env/plan")),
            ("WAYFINDER__LOCATION__LAT", Some("12.9716")),
            ("WAYFINDER__LOCATION__LNG", Some("77.5946")),
        ],
        || {
            let config = WayfinderConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load config");

            assert_eq!(config.backend.endpoint, "http://from-env/plan");
            let point = config.location.fixed_point().expect("fixed point");
            assert!((point.lat - 12.9716).abs() < 1e-9);
            assert!((point.lng - 77.5946).abs() < 1e-9);
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_is_fine() {
    let tmp = TempDir::new().unwrap();
    let config = WayfinderConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults");
    assert_eq!(config.geocoder.delay_ms, 300);
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = WayfinderConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}
