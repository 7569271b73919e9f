use crate::settings::{Config, RecommendSettings};
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

/// Returns the user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    #[cfg(unix)]
    if let Ok(home) = std::env::var("HOME") {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("home directory not found"))
}

/// Returns the path to the config file (`MENTORA_CONFIG` or `~/.mentora/config.toml`).
pub fn config_file() -> Option<PathBuf> {
    if let Ok(custom) = std::env::var("MENTORA_CONFIG") {
        return Some(PathBuf::from(custom));
    }
    home_dir()
        .ok()
        .map(|h| h.join(".mentora").join("config.toml"))
}

/// Checks if `MENTORA_DIAGNOSE` environment variable is set to true.
pub fn env_diag() -> bool {
    std::env::var("MENTORA_DIAGNOSE")
        .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Loads the configuration file if it exists.
///
/// Returns `Ok(None)` if the file doesn't exist and `Err` if it exists but
/// fails to parse.
pub fn load_config() -> Result<Option<Config>> {
    let Some(path) = config_file() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&text)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(Some(config))
}

/// Parses a numeric environment variable, ignoring (and logging) bad values.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(target: "mentora::config", key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}

/// Applies `MENTORA_*` environment overrides on top of `settings`.
pub fn apply_env_overrides(settings: &mut RecommendSettings) {
    if let Some(v) = env_parse::<f64>("MENTORA_WEIGHT_COLLABORATIVE") {
        settings.blend.collaborative = v;
    }
    if let Some(v) = env_parse::<f64>("MENTORA_WEIGHT_CONTENT") {
        settings.blend.content = v;
    }
    if let Some(v) = env_parse::<usize>("MENTORA_MAX_NEIGHBORS") {
        settings.max_neighbors = v;
    }
    if let Some(v) = env_parse::<usize>("MENTORA_MAX_PAGE_SIZE") {
        settings.max_page_size = v;
    }
    if let Some(v) = env_parse::<u64>("MENTORA_READ_TIMEOUT_MS") {
        settings.read_timeout_ms = v;
    }
    if let Some(v) = env_parse::<u64>("MENTORA_CACHE_TTL_MS") {
        settings.cache_ttl_ms = v;
    }
    if let Some(v) = env_parse::<u64>("MENTORA_REFRESH_INTERVAL_MS") {
        settings.refresh_interval_ms = v;
    }
}

/// Resolves the effective settings: environment > config file > defaults.
pub fn load_settings() -> Result<RecommendSettings> {
    let mut settings = load_config()?
        .map(|c| c.recommend)
        .unwrap_or_default();
    apply_env_overrides(&mut settings);
    settings.validate()?;
    if env_diag() {
        tracing::info!(target: "mentora::config", ?settings, "resolved recommendation settings");
    }
    Ok(settings)
}
