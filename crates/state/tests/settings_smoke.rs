use mentora_state::{load_settings, RecommendSettings};
use mentora_test_utils::{env_guard, set_env_var};
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

#[test]
#[serial]
fn missing_config_file_yields_defaults() {
    let _g = env_guard();
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("absent.toml");
    let _cfg = set_env_var("MENTORA_CONFIG", Some(path.to_str().unwrap()));
    let _w = set_env_var("MENTORA_WEIGHT_CONTENT", None);
    let _c = set_env_var("MENTORA_WEIGHT_COLLABORATIVE", None);

    let settings = load_settings().unwrap();
    assert_eq!(settings, RecommendSettings::default());
}

#[test]
#[serial]
fn env_overrides_take_precedence_over_file() {
    let _g = env_guard();
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(
        &path,
        "[recommend]\nmax_neighbors = 50\n\n[recommend.blend]\ncollaborative = 0.2\ncontent = 0.8\n",
    )
    .unwrap();
    let _cfg = set_env_var("MENTORA_CONFIG", Some(path.to_str().unwrap()));
    let _w = set_env_var("MENTORA_WEIGHT_CONTENT", Some("0.6"));
    let _c = set_env_var("MENTORA_WEIGHT_COLLABORATIVE", None);

    let settings = load_settings().unwrap();
    assert_eq!(settings.max_neighbors, 50);
    assert_eq!(settings.blend.collaborative, 0.2);
    assert_eq!(settings.blend.content, 0.6);
}

#[test]
#[serial]
fn unparsable_env_value_is_ignored() {
    let _g = env_guard();
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("absent.toml");
    let _cfg = set_env_var("MENTORA_CONFIG", Some(path.to_str().unwrap()));
    let _p = set_env_var("MENTORA_MAX_PAGE_SIZE", Some("lots"));

    let settings = load_settings().unwrap();
    assert_eq!(settings.max_page_size, 100);
}

#[test]
#[serial]
fn broken_config_file_is_an_error() {
    let _g = env_guard();
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(&path, "[recommend\nmax_neighbors = ").unwrap();
    let _cfg = set_env_var("MENTORA_CONFIG", Some(path.to_str().unwrap()));

    let err = load_settings().unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

#[test]
#[serial]
fn invalid_weights_from_env_are_rejected() {
    let _g = env_guard();
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("absent.toml");
    let _cfg = set_env_var("MENTORA_CONFIG", Some(path.to_str().unwrap()));
    let _w = set_env_var("MENTORA_WEIGHT_CONTENT", Some("-1"));

    assert!(load_settings().is_err());
}
