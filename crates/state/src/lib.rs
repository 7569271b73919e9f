//! Manages configuration for the recommendation engine.
//!
//! This crate provides utilities for:
//! - Reading the `~/.mentora/config.toml` settings file.
//! - Applying `MENTORA_*` environment variable overrides.
//! - Validating blend weights and paging limits before the engine uses them.

pub mod env;
pub mod settings;

pub use env::{apply_env_overrides, config_file, env_diag, home_dir, load_config, load_settings};
pub use settings::{BlendWeights, Config, InteractionWeights, ProfileWeights, RecommendSettings};
