//! Tunable settings for the recommendation engine.
//!
//! Loaded from the `[recommend]` section of `~/.mentora/config.toml`:
//!
//! ```toml
//! [recommend]
//! max_neighbors = 200
//! repeat_interaction_limit = 0
//! max_page_size = 100
//! cache_ttl_ms = 300000
//!
//! [recommend.blend]
//! collaborative = 0.5
//! content = 0.5
//!
//! [recommend.interaction]
//! view = 1.0
//! like = 3.0
//! view_cap = 5.0
//! ```
//!
//! Every field has a default, so a partial file (or no file at all) is valid.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration file structure.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Recommendation engine settings.
    #[serde(default)]
    pub recommend: RecommendSettings,
}

/// Linear blend weights for the two component scores.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BlendWeights {
    pub collaborative: f64,
    pub content: f64,
}

impl BlendWeights {
    /// Weights used when the mentee has collaborative signal.
    pub const fn warm() -> Self {
        Self {
            collaborative: 0.5,
            content: 0.5,
        }
    }

    /// Weights used when collaborative signal is absent.
    pub const fn cold_start() -> Self {
        Self {
            collaborative: 0.0,
            content: 1.0,
        }
    }

    fn validate(&self, section: &str) -> Result<()> {
        for (name, value) in [
            ("collaborative", self.collaborative),
            ("content", self.content),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("{section}.{name} must be a non-negative number (got {value})");
            }
        }
        if self.collaborative == 0.0 && self.content == 0.0 {
            bail!("{section} weights cannot both be zero");
        }
        Ok(())
    }
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self::warm()
    }
}

/// Per-event weights and accumulation caps for interaction aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InteractionWeights {
    /// Weight of a single view.
    pub view: f64,
    /// Weight of a single like.
    pub like: f64,
    /// Ceiling for accumulated views on one item.
    pub view_cap: f64,
    /// Ceiling for accumulated likes on one item.
    pub like_cap: f64,
    /// Ceiling for accumulated review ratings on one item.
    pub review_cap: f64,
}

impl Default for InteractionWeights {
    fn default() -> Self {
        Self {
            view: 1.0,
            like: 3.0,
            view_cap: 5.0,
            like_cap: 3.0,
            review_cap: 5.0,
        }
    }
}

/// Weights used when building a mentee's content profile.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfileWeights {
    /// Weight of each declared skill, language and industry.
    pub declared_weight: f64,
}

impl Default for ProfileWeights {
    fn default() -> Self {
        Self {
            declared_weight: 2.0,
        }
    }
}

/// Settings consumed by the recommendation engine.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RecommendSettings {
    pub blend: BlendWeights,
    pub cold_start: BlendWeights,
    pub interaction: InteractionWeights,
    pub profile: ProfileWeights,
    /// Neighbor mentees kept for request-scoped item similarity, most recent first.
    pub max_neighbors: usize,
    /// Reviews/bookings a mentee may already have on a candidate before it is excluded.
    pub repeat_interaction_limit: u32,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub max_search_len: usize,
    pub read_timeout_ms: u64,
    pub cache_ttl_ms: u64,
    pub refresh_interval_ms: u64,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self {
            blend: BlendWeights::warm(),
            cold_start: BlendWeights::cold_start(),
            interaction: InteractionWeights::default(),
            profile: ProfileWeights::default(),
            max_neighbors: 200,
            repeat_interaction_limit: 0,
            default_page_size: 10,
            max_page_size: 100,
            max_search_len: 200,
            read_timeout_ms: 2_000,
            cache_ttl_ms: 300_000,
            refresh_interval_ms: 60_000,
        }
    }
}

impl RecommendSettings {
    /// Reject settings the engine cannot score with.
    pub fn validate(&self) -> Result<()> {
        self.blend.validate("blend")?;
        self.cold_start.validate("cold_start")?;

        let i = &self.interaction;
        for (name, value) in [
            ("view", i.view),
            ("like", i.like),
            ("view_cap", i.view_cap),
            ("like_cap", i.like_cap),
            ("review_cap", i.review_cap),
            ("declared_weight", self.profile.declared_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("{name} must be a non-negative number (got {value})");
            }
        }

        if self.max_page_size == 0 {
            bail!("max_page_size must be at least 1");
        }
        if self.default_page_size == 0 {
            bail!("default_page_size must be at least 1");
        }
        if self.refresh_interval_ms == 0 {
            bail!("refresh_interval_ms must be at least 1");
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}
