//! Shared test utilities for mentora crates.
//!
//! This crate provides common test fixtures and utilities used across
//! multiple crates in the mentora workspace.

use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{LazyLock, Mutex, MutexGuard};

/// Serialize tests that mutate process-global state (env vars, cwd, etc).
///
/// Acquire this guard at the start of any test that modifies environment
/// variables to prevent race conditions between parallel tests.
pub fn env_guard() -> MutexGuard<'static, ()> {
    static TEST_SERIAL: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    TEST_SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// RAII guard for environment variables - restores original value on drop.
pub struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.previous {
            std::env::set_var(self.key, v);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

/// Set an environment variable and return a guard that restores the original on drop.
///
/// # Example
/// ```
/// let _guard = mentora_test_utils::set_env_var("MY_VAR", Some("value"));
/// // MY_VAR is set to "value"
/// // When _guard drops, MY_VAR is restored to its original value
/// ```
pub fn set_env_var(key: &'static str, value: Option<&str>) -> EnvVarGuard {
    let previous = std::env::var(key).ok();
    if let Some(val) = value {
        std::env::set_var(key, val);
    } else {
        std::env::remove_var(key);
    }
    EnvVarGuard { key, previous }
}

/// Temp-dir fixture for snapshot and config files.
///
/// The tempdir is automatically cleaned up when this struct is dropped.
pub struct TestFixture {
    pub tempdir: tempfile::TempDir,
}

impl TestFixture {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            tempdir: tempfile::tempdir()?,
        })
    }

    /// Write a marketplace snapshot as pretty JSON and return its path.
    pub fn write_snapshot(&self, name: &str, snapshot: &Value) -> std::io::Result<PathBuf> {
        let path = self.tempdir.path().join(name);
        let text = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&path, text)?;
        Ok(path)
    }

    /// Write a `config.toml` into the fixture directory and return its path.
    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.tempdir.path().join("config.toml");
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Create an RAII guard that points `MENTORA_CONFIG` at `path`.
    pub fn config_guard(&self, path: &std::path::Path) -> EnvVarGuard {
        set_env_var("MENTORA_CONFIG", Some(path.to_str().unwrap()))
    }
}

/// A small marketplace: two mentees with overlapping history, one cold mentee,
/// three mentors and five materials.
///
/// - `mentee-ana` viewed `mat-react-hooks` three times and liked `mat-docker-intro`.
/// - `mentee-ben` shares Ana's history and also reviewed `mat-k8s-basics` (5 stars).
/// - `mentee-cho` has no history and no declared skills.
/// - `mentee-dev` is also mentor `mentor-dev` and authored `mat-rust-own`.
pub fn sample_snapshot() -> Value {
    json!({
        "events": [
            {"subject_id": "mentee-ana", "item_id": "mat-react-hooks", "kind": "view", "weight": 1.0, "occurred_at": "2026-03-01T10:00:00Z"},
            {"subject_id": "mentee-ana", "item_id": "mat-react-hooks", "kind": "view", "weight": 1.0, "occurred_at": "2026-03-02T10:00:00Z"},
            {"subject_id": "mentee-ana", "item_id": "mat-react-hooks", "kind": "view", "weight": 1.0, "occurred_at": "2026-03-03T10:00:00Z"},
            {"subject_id": "mentee-ana", "item_id": "mat-docker-intro", "kind": "like", "weight": 3.0, "occurred_at": "2026-03-04T10:00:00Z"},
            {"subject_id": "mentee-ben", "item_id": "mat-react-hooks", "kind": "view", "weight": 1.0, "occurred_at": "2026-03-05T10:00:00Z"},
            {"subject_id": "mentee-ben", "item_id": "mat-docker-intro", "kind": "like", "weight": 3.0, "occurred_at": "2026-03-06T10:00:00Z"},
            {"subject_id": "mentee-ben", "item_id": "mat-k8s-basics", "kind": "review", "weight": 5.0, "occurred_at": "2026-03-07T10:00:00Z"},
            {"subject_id": "mentee-ben", "item_id": "mentor-kim", "kind": "review", "weight": 4.0, "occurred_at": "2026-03-08T10:00:00Z"}
        ],
        "mentees": [
            {"mentee_id": "mentee-ana", "skills": ["javascript"], "industries": ["software"]},
            {"mentee_id": "mentee-ben", "skills": ["docker"], "industries": []},
            {"mentee_id": "mentee-cho"},
            {"mentee_id": "mentee-dev", "skills": ["rust"], "mentor_profile_id": "mentor-dev"}
        ],
        "mentors": [
            {"mentor_id": "mentor-kim", "skills": ["kubernetes", "docker"], "programming_languages": ["go"], "industries": ["software"], "experience_years": 9},
            {"mentor_id": "mentor-lee", "skills": ["react", "css"], "programming_languages": ["typescript"], "industries": ["ecommerce"], "experience_years": 4},
            {"mentor_id": "mentor-dev", "skills": ["rust"], "programming_languages": ["rust"], "industries": ["software"], "experience_years": 6}
        ],
        "items": [
            {"id": "mat-react-hooks", "kind": "material", "owner_id": "mentor-lee", "title": "React Hooks in Depth", "description": "State and effects for frontend apps", "tags": ["react", "frontend"], "item_type": "article", "created_at": "2026-01-10T00:00:00Z"},
            {"id": "mat-docker-intro", "kind": "material", "owner_id": "mentor-kim", "title": "Docker from Zero", "description": "Containers for beginners", "tags": ["docker"], "item_type": "video", "created_at": "2026-01-12T00:00:00Z"},
            {"id": "mat-k8s-basics", "kind": "material", "owner_id": "mentor-kim", "title": "Kubernetes Basics", "description": "Pods, deployments and services", "tags": ["docker", "kubernetes"], "item_type": "article", "created_at": "2026-02-01T00:00:00Z"},
            {"id": "mat-sourdough", "kind": "material", "owner_id": "mentor-lee", "title": "Sourdough Weekends", "description": "A cooking detour", "tags": ["cooking"], "item_type": "video", "created_at": "2026-02-03T00:00:00Z"},
            {"id": "mat-rust-own", "kind": "material", "owner_id": "mentor-dev", "title": "Ownership in Rust", "description": "Borrowing explained", "tags": ["rust"], "item_type": "article", "created_at": "2026-02-05T00:00:00Z"},
            {"id": "mentor-kim", "kind": "mentor", "owner_id": "mentor-kim", "title": "Kim Park", "description": "Platform engineer", "tags": ["devops"], "created_at": "2025-11-01T00:00:00Z"},
            {"id": "mentor-lee", "kind": "mentor", "owner_id": "mentor-lee", "title": "Lee Chen", "description": "Frontend lead", "tags": ["frontend"], "created_at": "2025-11-02T00:00:00Z"},
            {"id": "mentor-dev", "kind": "mentor", "owner_id": "mentor-dev", "title": "Dev Rao", "description": "Systems programmer", "tags": ["systems"], "created_at": "2025-11-03T00:00:00Z"}
        ],
        "bookings": [
            {"mentee_id": "mentee-ana", "mentor_id": "mentor-lee", "count": 1}
        ]
    })
}
